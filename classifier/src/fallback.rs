use issues_core::PriorityClassifier;
use issues_core::model::{IssueDraft, Priority};
use tracing::{debug, warn};

use crate::ClassifierBackend;

/// Absorbs every backend failure into a constant label. Classification is
/// advisory; a wrong or missing label degrades the triage hint, it never
/// blocks intake.
#[derive(Debug, Clone)]
pub struct Fallback<B> {
    backend: Option<B>,
    label: Priority,
}

impl<B> Fallback<B> {
    pub fn new(backend: Option<B>, label: Priority) -> Self {
        Self { backend, label }
    }

    pub fn medium(backend: Option<B>) -> Self {
        Self::new(backend, Priority::Medium)
    }
}

impl<B> PriorityClassifier for Fallback<B>
where
    B: ClassifierBackend + Send + Sync,
{
    async fn classify(&self, draft: &IssueDraft) -> Priority {
        let Some(backend) = &self.backend else {
            debug!("no classification backend configured, labelling {}", self.label);
            return self.label;
        };

        match backend.classify(draft).await {
            Ok(priority) => priority,
            Err(e) => {
                warn!("classification failed, falling back to {}: {e:?}", self.label);
                self.label
            }
        }
    }
}

/// Deterministic classifier. The degenerate half of the capability pair;
/// also what test engines use to pin a label.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub Priority);

impl PriorityClassifier for Fixed {
    async fn classify(&self, _draft: &IssueDraft) -> Priority {
        self.0
    }
}
