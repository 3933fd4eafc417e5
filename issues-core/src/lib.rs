use error_stack::Report;

use crate::list_filter::IssueFilter;
use crate::model::{Issue, IssueDraft, IssueId, IssueStatus, NewIssue, Priority};
use crate::result::{ImageStoreError, OptRepoResult, RepoResult};

pub mod identity;
pub mod list_filter;
pub mod model;
pub mod result;

/// Bundle of the collaborators a triage operation needs. Accessors hand out
/// cheap clones so each operation works on its own handle.
pub trait IssueEngine: Clone + Send + Sync + 'static {
    type Repo: IssueRepository + Send + Sync + 'static;
    type Classifier: PriorityClassifier + Send + Sync + 'static;
    type Images: ImageStore + Send + Sync + 'static;

    fn repo(&self) -> Self::Repo;
    fn classifier(&self) -> Self::Classifier;
    fn images(&self) -> Self::Images;
}

pub trait IssueRepository {
    fn get(&self, id: IssueId) -> impl Future<Output = OptRepoResult<Issue>> + Send;

    /// Newest-first listing with optional narrowing filters.
    fn list(&self, filters: Vec<IssueFilter>) -> impl Future<Output = RepoResult<Vec<Issue>>> + Send;

    /// Newest-first listing of a single reporter's issues.
    fn list_by_reporter(
        &self,
        reporter_id: String,
    ) -> impl Future<Output = RepoResult<Vec<Issue>>> + Send;

    fn create(&self, new_issue: NewIssue) -> impl Future<Output = RepoResult<Issue>> + Send;

    /// Persists the new status and refreshes the updated timestamp.
    /// Transition legality is the caller's responsibility.
    fn update_status(
        &self,
        id: IssueId,
        status: IssueStatus,
    ) -> impl Future<Output = OptRepoResult<Issue>> + Send;

    fn delete(&self, id: IssueId) -> impl Future<Output = OptRepoResult<()>> + Send;
}

/// Advisory urgency label for a submitted report. Implementations never
/// fail; a backend that can fail is composed behind a fallback before it
/// reaches this trait.
pub trait PriorityClassifier {
    fn classify(&self, draft: &IssueDraft) -> impl Future<Output = Priority> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Locator resolvable by concatenation with the service's public base
    /// URL, e.g. `/uploads/<file>`.
    pub image_ref: String,
}

/// Opaque blob store for report photos.
pub trait ImageStore {
    fn store(
        &self,
        image: ImagePayload,
    ) -> impl Future<Output = Result<StoredImage, Report<ImageStoreError>>> + Send;
}
