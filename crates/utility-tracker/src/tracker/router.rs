use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use super::broadcast::EventPublisher;
use super::domain::{
    AnnouncementRequest, ComplaintFilter, ComplaintSubmission, LoginRequest, RegistrationRequest,
    StatusUpdateRequest,
};
use super::service::{TrackerError, TrackerService};
use super::store::SnapshotStore;

type SharedService<S, P> = State<Arc<TrackerService<S, P>>>;

/// Router builder exposing the citizen and admin JSON endpoints.
pub fn tracker_router<S, P>(service: Arc<TrackerService<S, P>>) -> Router
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    Router::new()
        .route("/api/login", post(login_handler::<S, P>))
        .route("/api/register", post(register_handler::<S, P>))
        .route(
            "/api/complaints",
            post(submit_complaint_handler::<S, P>).get(list_complaints_handler::<S, P>),
        )
        .route("/api/announcements", get(announcements_handler::<S, P>))
        .route("/api/areas", get(areas_handler::<S, P>))
        .route("/api/stats", get(stats_handler::<S, P>))
        .route(
            "/api/admin/complaints",
            get(admin_complaints_handler::<S, P>),
        )
        .route(
            "/api/admin/complaints/:complaint_id/status",
            put(update_status_handler::<S, P>),
        )
        .route(
            "/api/admin/announcements",
            post(publish_announcement_handler::<S, P>),
        )
        .route(
            "/api/admin/announcements/:announcement_id/deactivate",
            post(deactivate_announcement_handler::<S, P>),
        )
        .route("/api/admin/stats", get(admin_stats_handler::<S, P>))
        .route(
            "/api/admin/technicians",
            get(technicians_handler::<S, P>),
        )
        .with_state(service)
}

fn success<T: Serialize>(key: &str, value: T) -> Response {
    let mut body = serde_json::Map::new();
    body.insert("success".to_string(), json!(true));
    match serde_json::to_value(value) {
        Ok(value) => {
            body.insert(key.to_string(), value);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    let payload = json!({
        "success": false,
        "message": message,
    });
    (status, Json(payload)).into_response()
}

/// Lookup misses and conflicts are ordinary outcomes and keep a 200 status.
fn error_response(error: TrackerError) -> Response {
    let status = match &error {
        TrackerError::UserNotFound
        | TrackerError::UserExists
        | TrackerError::ComplaintNotFound(_)
        | TrackerError::AnnouncementNotFound(_) => StatusCode::OK,
        TrackerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TrackerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    failure(status, error.to_string())
}

/// Body, query, or path that could not be decoded into the request type.
fn malformed(message: String) -> Response {
    warn!(error = %message, "rejected malformed request");
    failure(StatusCode::UNPROCESSABLE_ENTITY, message)
}

/// Store access is synchronous file I/O under the writer lock, so it runs on the blocking pool.
async fn run_blocking<S, P, T, F>(
    service: Arc<TrackerService<S, P>>,
    key: &'static str,
    operation: F,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
    T: Serialize + Send + 'static,
    F: FnOnce(&TrackerService<S, P>) -> Result<T, TrackerError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || operation(&service)).await {
        Ok(Ok(value)) => success(key, value),
        Ok(Err(error)) => error_response(error),
        Err(err) => {
            error!(error = %err, "tracker task did not complete");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "request could not be completed".to_string(),
            )
        }
    }
}

pub(crate) async fn login_handler<S, P>(
    State(service): SharedService<S, P>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    match request {
        Ok(Json(request)) => {
            run_blocking(service, "user", move |service| service.login(&request.phone)).await
        }
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub(crate) async fn register_handler<S, P>(
    State(service): SharedService<S, P>,
    request: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    match request {
        Ok(Json(request)) => {
            run_blocking(service, "user", move |service| service.register(request)).await
        }
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub(crate) async fn submit_complaint_handler<S, P>(
    State(service): SharedService<S, P>,
    submission: Result<Json<ComplaintSubmission>, JsonRejection>,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    match submission {
        Ok(Json(submission)) => {
            run_blocking(service, "complaint", move |service| {
                service.submit_complaint(submission)
            })
            .await
        }
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub(crate) async fn list_complaints_handler<S, P>(
    State(service): SharedService<S, P>,
    filter: Result<Query<ComplaintFilter>, QueryRejection>,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    match filter {
        Ok(Query(filter)) => {
            run_blocking(service, "complaints", move |service| {
                Ok(service.complaints(&filter))
            })
            .await
        }
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub(crate) async fn announcements_handler<S, P>(State(service): SharedService<S, P>) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    run_blocking(service, "announcements", |service| {
        Ok(service.active_announcements())
    })
    .await
}

pub(crate) async fn areas_handler<S, P>(State(service): SharedService<S, P>) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    run_blocking(service, "areas", |service| Ok(service.areas())).await
}

pub(crate) async fn stats_handler<S, P>(State(service): SharedService<S, P>) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    run_blocking(service, "stats", |service| Ok(service.stats())).await
}

pub(crate) async fn admin_complaints_handler<S, P>(
    State(service): SharedService<S, P>,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    run_blocking(service, "complaints", |service| Ok(service.all_complaints())).await
}

pub(crate) async fn update_status_handler<S, P>(
    State(service): SharedService<S, P>,
    complaint_id: Result<Path<u64>, PathRejection>,
    request: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    let complaint_id = match complaint_id {
        Ok(Path(complaint_id)) => complaint_id,
        Err(rejection) => return malformed(rejection.body_text()),
    };
    match request {
        Ok(Json(request)) => {
            run_blocking(service, "complaint", move |service| {
                service.update_complaint_status(complaint_id, request.status)
            })
            .await
        }
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub(crate) async fn publish_announcement_handler<S, P>(
    State(service): SharedService<S, P>,
    request: Result<Json<AnnouncementRequest>, JsonRejection>,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    match request {
        Ok(Json(request)) => {
            run_blocking(service, "announcement", move |service| {
                service.publish_announcement(request)
            })
            .await
        }
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub(crate) async fn deactivate_announcement_handler<S, P>(
    State(service): SharedService<S, P>,
    announcement_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    match announcement_id {
        Ok(Path(announcement_id)) => {
            run_blocking(service, "announcement", move |service| {
                service.deactivate_announcement(announcement_id)
            })
            .await
        }
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub(crate) async fn admin_stats_handler<S, P>(State(service): SharedService<S, P>) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    run_blocking(service, "stats", |service| Ok(service.admin_stats())).await
}

pub(crate) async fn technicians_handler<S, P>(State(service): SharedService<S, P>) -> Response
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    run_blocking(service, "technicians", |service| Ok(service.technicians())).await
}
