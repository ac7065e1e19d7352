use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::CalendarEventForm,
    repo,
    repo_types::{CalendarEvent, CalendarPage},
    services::{matches_search, summarize, to_view, validate_form},
};
use crate::{
    auth::AdminUser,
    error::{AppError, AppResult},
    listing::{AdminList, SearchQuery},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/calendar", get(list_events))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/calendar", get(admin_list).post(create_event))
        .route("/admin/calendar/:id", put(update_event).delete(delete_event))
        .route("/admin/calendar/:id/toggle-active", post(toggle_event))
}

fn not_found() -> AppError {
    AppError::not_found("Calendar event not found")
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<CalendarPage>> {
    let now = OffsetDateTime::now_utc();
    let events: Vec<CalendarEvent> = repo::list(&state.db, true)
        .await?
        .into_iter()
        .map(|e| to_view(e, now))
        .collect();
    let summary = summarize(&events);
    let events = events
        .into_iter()
        .filter(|e| matches_search(e, &q.search))
        .collect();
    Ok(Json(CalendarPage { events, summary }))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<AdminList<CalendarEvent>>> {
    let now = OffsetDateTime::now_utc();
    let events = repo::list(&state.db, false)
        .await?
        .into_iter()
        .map(|e| to_view(e, now))
        .collect();
    Ok(Json(AdminList::build(events, |e| e.is_active, |e| {
        matches_search(e, &q.search)
    })))
}

#[instrument(skip(state, _admin, form))]
pub async fn create_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(form): Json<CalendarEventForm>,
) -> AppResult<(StatusCode, Json<CalendarEvent>)> {
    let input = validate_form(form)?;
    let row = repo::insert(&state.db, &input).await?;
    info!(event_id = %row.id, exam = %row.exam_name, "calendar event added");
    Ok((StatusCode::CREATED, Json(to_view(row, OffsetDateTime::now_utc()))))
}

#[instrument(skip(state, _admin, form))]
pub async fn update_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(form): Json<CalendarEventForm>,
) -> AppResult<Json<CalendarEvent>> {
    let input = validate_form(form)?;
    let row = repo::update(&state.db, id, &input).await?.ok_or_else(not_found)?;
    info!(event_id = %row.id, "calendar event updated");
    Ok(Json(to_view(row, OffsetDateTime::now_utc())))
}

#[instrument(skip(state, _admin))]
pub async fn delete_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !repo::delete(&state.db, id).await? {
        return Err(not_found());
    }
    info!(event_id = %id, "calendar event deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _admin))]
pub async fn toggle_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CalendarEvent>> {
    let row = repo::toggle_active(&state.db, id).await?.ok_or_else(not_found)?;
    info!(event_id = %row.id, is_active = row.is_active, "calendar event visibility changed");
    Ok(Json(to_view(row, OffsetDateTime::now_utc())))
}
