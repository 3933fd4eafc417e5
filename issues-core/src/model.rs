use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Clone, Hash)]
#[repr(transparent)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IssueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Copy, Clone, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Roads,
    Streetlights,
    Garbage,
    Water,
    Drainage,
    Parks,
    Traffic,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Roads => "roads",
            Category::Streetlights => "streetlights",
            Category::Garbage => "garbage",
            Category::Water => "water",
            Category::Drainage => "drainage",
            Category::Parks => "parks",
            Category::Traffic => "traffic",
            Category::Other => "other",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown issue category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roads" => Ok(Category::Roads),
            "streetlights" => Ok(Category::Streetlights),
            "garbage" => Ok(Category::Garbage),
            "water" => Ok(Category::Water),
            "drainage" => Ok(Category::Drainage),
            "parks" => Ok(Category::Parks),
            "traffic" => Ok(Category::Traffic),
            "other" => Ok(Category::Other),
            unknown => Err(UnknownCategory(unknown.to_owned())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Copy, Clone, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    Pending,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::Pending => "pending",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::Resolved => "resolved",
        }
    }

    /// Whether an administrator may move an issue from this status to `next`.
    /// Resolution must pass through in-progress, and resolved issues may
    /// only be reopened back to in-progress.
    pub fn can_transition_to(self, next: IssueStatus) -> bool {
        matches!(
            (self, next),
            (IssueStatus::Pending, IssueStatus::InProgress)
                | (IssueStatus::InProgress, IssueStatus::Resolved)
                | (IssueStatus::Resolved, IssueStatus::InProgress)
        )
    }
}

impl Display for IssueStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Copy, Clone, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Exact-match parse of a classification label. Callers are expected to
    /// normalize backend output before trying this.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The validated report fields as the citizen submitted them. This is what
/// the classifier sees; the image locator and derived priority are attached
/// afterwards to form a [`NewIssue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub state: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub draft: IssueDraft,
    pub image_ref: String,
    pub priority: Priority,
    pub reporter_id: String,
}

impl NewIssue {
    pub fn new(
        draft: IssueDraft,
        image_ref: String,
        priority: Priority,
        reporter_id: String,
    ) -> Self {
        Self {
            draft,
            image_ref,
            priority,
            reporter_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub state: String,
    pub location: String,
    pub image_ref: String,
    pub status: IssueStatus,
    pub priority: Priority,
    pub reporter_id: String,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl Issue {
    pub fn create(id: IssueId, new_issue: NewIssue) -> Self {
        Self::new(id, new_issue, Utc::now(), None)
    }

    pub fn new(
        id: IssueId,
        new_issue: NewIssue,
        created: DateTime<Utc>,
        updated: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            title: new_issue.draft.title,
            description: new_issue.draft.description,
            category: new_issue.draft.category,
            state: new_issue.draft.state,
            location: new_issue.draft.location,
            image_ref: new_issue.image_ref,
            status: IssueStatus::Pending,
            priority: new_issue.priority,
            reporter_id: new_issue.reporter_id,
            created,
            updated,
        }
    }
}
