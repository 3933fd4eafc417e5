use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Cow;
use utoipa::ToSchema;

use issues_core::model::{Category, Issue, IssueId, IssueStatus, Priority};

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueResponse {
    #[serde(skip)]
    status_code: StatusCode,
    #[serde(flatten)]
    issue: Issue,
}

impl IssueResponse {
    pub fn ok(issue: Issue) -> Self {
        Self {
            status_code: StatusCode::OK,
            issue,
        }
    }

    pub fn created(issue: Issue) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            issue,
        }
    }
}

impl IntoResponse for IssueResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// The unauthenticated feed view: everything except the reporter's
/// identifier.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicIssue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub state: String,
    pub location: String,
    pub image_ref: String,
    pub status: IssueStatus,
    pub priority: Priority,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl From<Issue> for PublicIssue {
    fn from(value: Issue) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            category: value.category,
            state: value.state,
            location: value.location,
            image_ref: value.image_ref,
            status: value.status,
            priority: value.priority,
            created: value.created,
            updated: value.updated,
        }
    }
}

pub type ErrorMessageType = Cow<'static, str>;

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueError {
    #[serde(skip)]
    status_code: StatusCode,
    #[schema(value_type = String)]
    message: ErrorMessageType,
}

impl IssueError {
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "the requested issue does not exist")
    }

    pub fn bad_request(message: impl Into<ErrorMessageType>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn new(status_code: StatusCode, message: impl Into<ErrorMessageType>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}
