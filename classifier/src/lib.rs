use error_stack::Report;
use issues_core::model::{IssueDraft, Priority};

mod fallback;
mod remote;

pub use fallback::{Fallback, Fixed};
pub use remote::{RemoteClassifier, RemoteClassifierConfig};

pub type BackendResult = Result<Priority, Report<ClassifyError>>;

/// The fallible half of classification: a remote text-classification
/// round-trip. Compose with [`Fallback`] before handing it to the triage
/// engine; only the infallible `PriorityClassifier` side is allowed to
/// touch intake.
pub trait ClassifierBackend {
    fn classify(&self, draft: &IssueDraft) -> impl Future<Output = BackendResult> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("classification backend request failed")]
    Backend,
    #[error("classification backend returned an unusable label")]
    UnusableLabel,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to build classification backend client")]
pub struct ClassifierBuildError;
