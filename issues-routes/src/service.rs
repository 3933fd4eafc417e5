use error_stack::ResultExt;
use tracing::instrument;

use issues_core::identity::Identity;
use issues_core::list_filter::IssueFilter;
use issues_core::model::{Category, Issue, IssueDraft, IssueId, IssueStatus, NewIssue};
use issues_core::{ImagePayload, ImageStore, IssueEngine, IssueRepository, PriorityClassifier};

use crate::ServiceResult;
use crate::error::TriageError;
use crate::metrics;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// One submitted report, straight off the multipart form. Everything is
/// optional here; `intake` decides what is missing.
#[derive(Debug, Default, Clone)]
pub struct IntakeSubmission {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub state: Option<String>,
    pub location: Option<String>,
    pub image: Option<ImagePayload>,
}

/// The first offending field of a rejected submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedField {
    pub field: &'static str,
    pub reason: &'static str,
}

#[derive(Debug)]
pub enum IntakeOutcome {
    Created(Issue),
    Invalid(RejectedField),
}

#[derive(Debug)]
pub enum TransitionOutcome {
    Updated(Issue),
    Invalid { from: IssueStatus, to: IssueStatus },
    NotFound,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct TriageService<T> {
    engine: T,
}

impl<T> TriageService<T>
where
    T: IssueEngine,
{
    pub fn new(engine: T) -> Self {
        TriageService { engine }
    }

    /// Validation, image storage, classification, persistence — in that
    /// order. A failed image store aborts before anything is written; a
    /// failed classification never aborts at all.
    #[instrument(skip_all, name = "service#intake", fields(reporter = %reporter_id))]
    pub async fn intake(
        &self,
        reporter_id: String,
        submission: IntakeSubmission,
    ) -> ServiceResult<IntakeOutcome> {
        let (draft, image) = match validate(submission) {
            Ok(parts) => parts,
            Err(rejected) => return Ok(IntakeOutcome::Invalid(rejected)),
        };

        let stored = self
            .engine
            .images()
            .store(image)
            .await
            .change_context(TriageError)?;

        let priority = self.engine.classifier().classify(&draft).await;

        let issue = self
            .engine
            .repo()
            .create(NewIssue::new(draft, stored.image_ref, priority, reporter_id))
            .await
            .change_context(TriageError)?;

        metrics::increment_issues_reported();

        Ok(IntakeOutcome::Created(issue))
    }

    #[instrument(skip(self), name = "service#transition")]
    pub async fn transition(
        &self,
        id: IssueId,
        requested: IssueStatus,
    ) -> ServiceResult<TransitionOutcome> {
        let repo = self.engine.repo();

        let Some(issue) = repo.get(id.clone()).await.change_context(TriageError)? else {
            return Ok(TransitionOutcome::NotFound);
        };

        if !issue.status.can_transition_to(requested) {
            return Ok(TransitionOutcome::Invalid {
                from: issue.status,
                to: requested,
            });
        }

        match repo
            .update_status(id, requested)
            .await
            .change_context(TriageError)?
        {
            Some(updated) => {
                metrics::increment_issues_transitioned();
                Ok(TransitionOutcome::Updated(updated))
            }
            // deleted between the read and the write
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    #[instrument(skip(self), name = "service#remove")]
    pub async fn remove(&self, id: IssueId) -> ServiceResult<RemoveOutcome> {
        match self
            .engine
            .repo()
            .delete(id)
            .await
            .change_context(TriageError)?
        {
            Some(_) => {
                metrics::increment_issues_deleted();
                Ok(RemoveOutcome::Removed)
            }
            None => Ok(RemoveOutcome::NotFound),
        }
    }

    /// Citizens only ever see their own reports; the filters cannot widen
    /// that scope.
    #[instrument(skip_all, name = "service#list", fields(caller = %identity.id, role = %identity.role))]
    pub async fn list_for_caller(
        &self,
        identity: &Identity,
        filters: Vec<IssueFilter>,
    ) -> ServiceResult<Vec<Issue>> {
        if identity.is_admin() {
            self.engine
                .repo()
                .list(filters)
                .await
                .change_context(TriageError)
        } else {
            self.engine
                .repo()
                .list_by_reporter(identity.id.to_string())
                .await
                .change_context(TriageError)
        }
    }

    #[instrument(skip_all, name = "service#list_public")]
    pub async fn list_public(&self) -> ServiceResult<Vec<Issue>> {
        self.engine
            .repo()
            .list(Vec::new())
            .await
            .change_context(TriageError)
    }
}

fn validate(submission: IntakeSubmission) -> Result<(IssueDraft, ImagePayload), RejectedField> {
    let title = require_text("title", submission.title)?;
    let description = require_text("description", submission.description)?;

    let category = require_text("category", submission.category)?
        .parse::<Category>()
        .map_err(|_| RejectedField {
            field: "category",
            reason: "is not a known category",
        })?;

    let state = require_text("state", submission.state)?;
    let location = require_text("location", submission.location)?;

    let image = submission.image.filter(|i| !i.bytes.is_empty()).ok_or(
        RejectedField {
            field: "image",
            reason: "is required",
        },
    )?;

    if !ACCEPTED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
        return Err(RejectedField {
            field: "image",
            reason: "must be a jpeg, png or gif image",
        });
    }

    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(RejectedField {
            field: "image",
            reason: "exceeds the 5 MiB limit",
        });
    }

    Ok((
        IssueDraft {
            title,
            description,
            category,
            state,
            location,
        },
        image,
    ))
}

fn require_text(field: &'static str, value: Option<String>) -> Result<String, RejectedField> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RejectedField {
            field,
            reason: "is required",
        }),
    }
}
