use crate::model::{Category, IssueStatus};

/// Optional narrowing applied to admin listings. Ownership scoping for
/// citizens is not a filter; the repository exposes it as a separate
/// operation so callers cannot widen it from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueFilter {
    Status(IssueStatus),
    Category(Category),
    /// Case-insensitive substring match over title, location and state.
    Search(String),
}
