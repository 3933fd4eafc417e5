use axum::extract::FromRef;
use issues_core::IssueEngine;

use crate::auth::AuthConfig;
use crate::service::TriageService;

#[derive(Clone)]
pub struct IssueAppState<T: IssueEngine> {
    pub service: TriageService<T>,
    pub auth: AuthConfig,
    pub metrics_enabled: bool,
}

impl<T: IssueEngine> IssueAppState<T> {
    pub fn new_with_metrics(engine: T, auth: AuthConfig) -> Self {
        Self {
            service: TriageService::new(engine),
            auth,
            metrics_enabled: true,
        }
    }

    pub fn new_without_metrics(engine: T, auth: AuthConfig) -> Self {
        Self {
            service: TriageService::new(engine),
            auth,
            metrics_enabled: false,
        }
    }
}

impl<T: IssueEngine> FromRef<IssueAppState<T>> for TriageService<T> {
    fn from_ref(input: &IssueAppState<T>) -> Self {
        input.service.clone()
    }
}

impl<T: IssueEngine> FromRef<IssueAppState<T>> for AuthConfig {
    fn from_ref(input: &IssueAppState<T>) -> Self {
        input.auth.clone()
    }
}
