use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        RequestList, RequestListQuery, RespondRequest, SubmitRequest, SubmitResponse, TrackQuery,
        TrackResponse,
    },
    repo,
    repo_types::UserRequest,
    services::{
        create_request, is_tracking_id, parse_status_filter, submitted_by, tally,
        validate_submission, RequestStatus,
    },
};
use crate::{
    auth::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(submit_request))
        .route("/requests/track/:tracking_id", get(track_request))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/requests", get(admin_list))
        .route("/admin/requests/:id/approve", post(approve_request))
        .route("/admin/requests/:id/respond", post(respond_request))
}

fn not_found() -> AppError {
    AppError::not_found("Request not found")
}

/// Signed-in users get the request linked to their account.
#[instrument(skip(state, user, form))]
pub async fn submit_request(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(form): Json<SubmitRequest>,
) -> AppResult<(StatusCode, Json<SubmitResponse>)> {
    let new = validate_submission(form)?;
    let user_id = user.map(|AuthUser(id)| id);
    let row = create_request(&state.db, user_id, &new).await?;
    info!(request_id = %row.id, tracking_id = %row.tracking_id, request_type = %row.request_type, "request submitted");
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            tracking_id: row.tracking_id,
            status: RequestStatus::Review,
            message: "Request submitted successfully! We will get back to you soon.",
        }),
    ))
}

/// Lookup needs the tracking id and the email it was submitted with.
#[instrument(skip(state, q))]
pub async fn track_request(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
    Query(q): Query<TrackQuery>,
) -> AppResult<Json<TrackResponse>> {
    if !is_tracking_id(&tracking_id) {
        return Err(AppError::bad_request("Tracking ID must be 5 digits"));
    }
    if q.email.trim().is_empty() {
        return Err(AppError::bad_request("Please enter the email used for the request"));
    }
    let req = repo::find_by_tracking_id(&state.db, &tracking_id)
        .await?
        .ok_or_else(not_found)?;
    submitted_by(&req, &q.email)?;
    Ok(Json(req.into()))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<RequestListQuery>,
) -> AppResult<Json<RequestList>> {
    let filter = parse_status_filter(q.status.as_deref())?;
    let requests = repo::list(&state.db, filter.map(RequestStatus::as_str)).await?;
    let counts = tally(&repo::count_by_status(&state.db).await?);
    Ok(Json(RequestList { requests, counts }))
}

async fn load_status(state: &AppState, id: Uuid) -> AppResult<RequestStatus> {
    let req = repo::get(&state.db, id).await?.ok_or_else(not_found)?;
    req.status.parse().map_err(|_| {
        warn!(request_id = %id, status = %req.status, "request has unknown status");
        AppError::Conflict(format!("Request has unknown status {}", req.status))
    })
}

async fn apply(
    state: &AppState,
    id: Uuid,
    from: RequestStatus,
    to: RequestStatus,
    response: Option<&str>,
) -> AppResult<UserRequest> {
    repo::transition(&state.db, id, from.as_str(), to.as_str(), response)
        .await?
        .ok_or_else(|| AppError::Conflict("Request was changed by someone else".into()))
}

#[instrument(skip(state, _admin))]
pub async fn approve_request(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserRequest>> {
    let current = load_status(&state, id).await?;
    let next = current.approve()?;
    let req = apply(&state, id, current, next, None).await?;
    info!(request_id = %id, tracking_id = %req.tracking_id, "request approved");
    Ok(Json(req))
}

#[instrument(skip(state, _admin, payload))]
pub async fn respond_request(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondRequest>,
) -> AppResult<Json<UserRequest>> {
    let response = payload.response.trim();
    if response.is_empty() {
        return Err(AppError::bad_request("Please enter a response"));
    }
    let current = load_status(&state, id).await?;
    let next = current.complete()?;
    let req = apply(&state, id, current, next, Some(response)).await?;
    info!(request_id = %id, tracking_id = %req.tracking_id, "request completed");
    Ok(Json(req))
}
