use std::path::PathBuf;

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use const_format::formatcp;
use tower_http::services::ServeDir;
use tracing::{info, instrument};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use issues_core::identity::{Identity, Role};
use issues_core::model::{Issue, IssueId};
use issues_core::{ImagePayload, IssueEngine};

use crate::auth::{self, ProtectedRouter};
use crate::error::{EndpointError, TriageError};
use crate::images::UPLOADS_PUBLIC_BASE;
use crate::metrics;
use crate::routes::requests::{IssueListQuery, UpdateStatusRequest};
use crate::routes::responses::{IssueError, IssueResponse, PublicIssue};
use crate::service::{
    IntakeOutcome, IntakeSubmission, RemoveOutcome, TransitionOutcome, TriageService,
};
use crate::state::IssueAppState;

pub mod requests;
pub mod responses;

const ISSUE_ROOT_PATH: &str = "/issues";

const ISSUE_CREATE_PATH: &str = "/";
const ISSUE_LIST_PATH: &str = "/";
const ISSUE_LIST_MY_PATH: &str = "/my";
const ISSUE_PUBLIC_FEED_PATH: &str = "/all";
const ISSUE_UPDATE_STATUS_PATH: &str = "/{issue_id}";
const ISSUE_DELETE_PATH: &str = "/{issue_id}";

const ISSUE_OPENAPI_PATH: &str = formatcp!("{ISSUE_ROOT_PATH}/api-docs/openapi.json");

// sits above the 5 MiB image bound: an oversized image must reach
// validation and come back a 400, not a 413
const MAX_UPLOAD_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    nest(
        (path = ISSUE_ROOT_PATH, api = IssueDocs),
    )
)]
struct ApiDoc;

#[derive(OpenApi)]
#[openapi(paths(
    create_issue,
    list_issues,
    list_my_issues,
    public_feed,
    update_issue_status,
    delete_issue,
))]
struct IssueDocs;

pub fn build<T: IssueEngine>(app_state: IssueAppState<T>, uploads_dir: PathBuf) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes(app_state))
        .split_for_parts();

    router
        .nest_service(UPLOADS_PUBLIC_BASE, ServeDir::new(uploads_dir))
        .route(ISSUE_OPENAPI_PATH, get(|| async move { Json(api) }))
}

fn routes<S, T: IssueEngine>(app_state: IssueAppState<T>) -> OpenApiRouter<S> {
    let main_router = OpenApiRouter::new()
        .protected_route(
            ISSUE_CREATE_PATH,
            post(create_issue::<T>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
            Role::Citizen,
        )
        .protected_route(ISSUE_LIST_MY_PATH, get(list_my_issues::<T>), Role::Citizen)
        .protected_route(ISSUE_LIST_PATH, get(list_issues::<T>), Role::Admin)
        .protected_route(
            ISSUE_UPDATE_STATUS_PATH,
            put(update_issue_status::<T>),
            Role::Admin,
        )
        .protected_route(ISSUE_DELETE_PATH, delete(delete_issue::<T>), Role::Admin)
        .route(ISSUE_PUBLIC_FEED_PATH, get(public_feed::<T>))
        .route_layer(middleware::from_fn_with_state(
            app_state.auth.clone(),
            auth::authenticate,
        ));

    let router = if app_state.metrics_enabled {
        info!("metrics enabled, setting up metrics handler");
        let metrics_recorder = metrics::setup_recorder();
        main_router
            .route("/metrics", get(|| async move { metrics_recorder.render() }))
            .route_layer(middleware::from_fn(metrics::track_http))
    } else {
        info!("metrics not enabled, setting up service unavailable metrics handler");
        main_router.route(
            "/metrics",
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Metrics endpoint is disabled. Metrics must be enabled and the service restarted",
                )
            }),
        )
    };

    OpenApiRouter::new()
        .nest(ISSUE_ROOT_PATH, router)
        .with_state(app_state)
}

/// Report a new civic issue. Multipart form: text parts title, description,
/// category, state and location, plus one binary `image` part.
#[utoipa::path(
    post,
    path = ISSUE_CREATE_PATH,
    responses(
        (status = CREATED, description = "The issue was recorded", body = Issue),
        (status = BAD_REQUEST, description = "A required field was missing or invalid", body = IssueError),
        (status = UNAUTHORIZED, description = "No valid credential was presented"),
        (status = FORBIDDEN, description = "Reporting is citizen-scoped"),
    ),
)]
#[instrument(skip_all, err(Debug), fields(reporter = %identity.id))]
async fn create_issue<T>(
    State(service): State<TriageService<T>>,
    Extension(identity): Extension<Identity>,
    multipart: Multipart,
) -> Result<Response, EndpointError<TriageError>>
where
    T: IssueEngine,
{
    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(message) => return Ok(IssueError::bad_request(message).into_response()),
    };

    match service.intake(identity.id.to_string(), submission).await? {
        IntakeOutcome::Created(issue) => Ok(IssueResponse::created(issue).into_response()),
        IntakeOutcome::Invalid(rejected) => Ok(IssueError::bad_request(format!(
            "{} {}",
            rejected.field, rejected.reason
        ))
        .into_response()),
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<IntakeSubmission, String> {
    let mut submission = IntakeSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("malformed upload: {e}"))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        if name == "image" {
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("malformed upload: {e}"))?;
            submission.image = Some(ImagePayload {
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| format!("malformed upload: {e}"))?;

        match name.as_str() {
            "title" => submission.title = Some(text),
            "description" => submission.description = Some(text),
            "category" => submission.category = Some(text),
            "state" => submission.state = Some(text),
            "location" => submission.location = Some(text),
            // unknown parts are ignored
            _ => {}
        }
    }

    Ok(submission)
}

/// The caller's own reports, newest first.
#[utoipa::path(
    get,
    path = ISSUE_LIST_MY_PATH,
    responses(
        (status = OK, description = "The caller's issues", body = Vec<Issue>),
        (status = UNAUTHORIZED, description = "No valid credential was presented"),
        (status = FORBIDDEN, description = "The listing is citizen-scoped"),
    ),
)]
#[instrument(skip_all, err(Debug), fields(caller = %identity.id))]
async fn list_my_issues<T>(
    State(service): State<TriageService<T>>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, EndpointError<TriageError>>
where
    T: IssueEngine,
{
    let issues = service.list_for_caller(&identity, Vec::new()).await?;

    Ok(Json(issues).into_response())
}

/// Every report in the system, newest first, optionally narrowed by
/// status, category or a text search over title, location and state.
#[utoipa::path(
    get,
    path = ISSUE_LIST_PATH,
    responses(
        (status = OK, description = "All matching issues", body = Vec<Issue>),
        (status = UNAUTHORIZED, description = "No valid credential was presented"),
        (status = FORBIDDEN, description = "The full listing is admin-scoped"),
    ),
    params(
        ("status" = Option<String>, Query, description = "Only issues with this status"),
        ("category" = Option<String>, Query, description = "Only issues in this category"),
        ("search" = Option<String>, Query, description = "Case-insensitive substring over title, location and state"),
    )
)]
#[instrument(skip_all, err(Debug), fields(caller = %identity.id))]
async fn list_issues<T>(
    State(service): State<TriageService<T>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<IssueListQuery>,
) -> Result<Response, EndpointError<TriageError>>
where
    T: IssueEngine,
{
    let issues = service
        .list_for_caller(&identity, query.into_filters())
        .await?;

    Ok(Json(issues).into_response())
}

/// Read-only feed of every report, with reporter identifiers redacted.
#[utoipa::path(
    get,
    path = ISSUE_PUBLIC_FEED_PATH,
    responses(
        (status = OK, description = "All issues, without reporter data", body = Vec<PublicIssue>),
    ),
)]
#[instrument(skip_all, err(Debug))]
async fn public_feed<T>(
    State(service): State<TriageService<T>>,
) -> Result<Response, EndpointError<TriageError>>
where
    T: IssueEngine,
{
    let feed = service
        .list_public()
        .await?
        .into_iter()
        .map(PublicIssue::from)
        .collect::<Vec<_>>();

    Ok(Json(feed).into_response())
}

/// Advance an issue through the triage state machine.
#[utoipa::path(
    put,
    path = ISSUE_UPDATE_STATUS_PATH,
    responses(
        (status = OK, description = "The issue moved to the requested status", body = Issue),
        (status = BAD_REQUEST, description = "The requested status is not reachable", body = IssueError),
        (status = NOT_FOUND, description = "No issue with the given id exists", body = IssueError),
    ),
    params(
        ("issue_id" = String, Path, description = "The issue to update"),
    ),
    request_body = UpdateStatusRequest,
)]
#[instrument(skip(service), err(Debug))]
async fn update_issue_status<T>(
    State(service): State<TriageService<T>>,
    Path(issue_id): Path<IssueId>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Response, EndpointError<TriageError>>
where
    T: IssueEngine,
{
    match service.transition(issue_id, request.status).await? {
        TransitionOutcome::Updated(issue) => Ok(IssueResponse::ok(issue).into_response()),
        TransitionOutcome::Invalid { from, to } => Ok(IssueError::bad_request(format!(
            "cannot move an issue from {from} to {to}"
        ))
        .into_response()),
        TransitionOutcome::NotFound => Ok(IssueError::not_found().into_response()),
    }
}

/// Permanently delete an issue. There is no undo.
#[utoipa::path(
    delete,
    path = ISSUE_DELETE_PATH,
    responses(
        (status = OK, description = "The issue was deleted"),
        (status = NOT_FOUND, description = "No issue with the given id exists", body = IssueError),
    ),
    params(
        ("issue_id" = String, Path, description = "The issue to delete"),
    ),
)]
#[instrument(skip(service), err(Debug))]
async fn delete_issue<T>(
    State(service): State<TriageService<T>>,
    Path(issue_id): Path<IssueId>,
) -> Result<Response, EndpointError<TriageError>>
where
    T: IssueEngine,
{
    match service.remove(issue_id).await? {
        RemoveOutcome::Removed => Ok(StatusCode::OK.into_response()),
        RemoveOutcome::NotFound => Ok(IssueError::not_found().into_response()),
    }
}
