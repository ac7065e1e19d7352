use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{DownloadResponse, PdfForm, PdfListQuery, TopicCard},
    repo,
    repo_types::PdfResource,
    services::{filter_pdfs, matches_admin_search, validate_form, Topic},
};
use crate::{
    auth::{services::ensure_active, AdminUser, AuthUser},
    error::{AppError, AppResult},
    listing::{AdminList, SearchQuery},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/pdfs", get(list_pdfs))
        .route("/pdfs/topics", get(list_topics))
        .route("/pdfs/:id", get(get_pdf))
        .route("/pdfs/:id/download", post(download_pdf))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/pdfs", get(admin_list).post(create_pdf))
        .route("/admin/pdfs/:id", axum::routing::put(update_pdf).delete(delete_pdf))
        .route("/admin/pdfs/:id/toggle-active", post(toggle_pdf))
}

pub(crate) fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok())
}

#[instrument(skip(state))]
pub async fn list_pdfs(
    State(state): State<AppState>,
    Query(q): Query<PdfListQuery>,
) -> AppResult<Json<Vec<PdfResource>>> {
    let pdfs = repo::list(&state.db, true).await?;
    Ok(Json(filter_pdfs(pdfs, q.topic.as_deref(), &q.search)?))
}

pub async fn list_topics() -> Json<Vec<TopicCard>> {
    Json(
        Topic::ALL
            .into_iter()
            .map(|t| TopicCard {
                value: t.as_str(),
                label: t.label(),
                image: t.image_path(),
            })
            .collect(),
    )
}

#[instrument(skip(state))]
pub async fn get_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PdfResource>> {
    repo::get(&state.db, id, true)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("PDF not found"))
}

/// Counting is best effort: the link is returned even when tracking fails.
#[instrument(skip(state, headers))]
pub async fn download_pdf(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<Json<DownloadResponse>> {
    ensure_active(&state.db, user_id).await?;
    let pdf = repo::get(&state.db, id, true)
        .await?
        .ok_or_else(|| AppError::not_found("PDF not found"))?;

    let download_count =
        match repo::record_download(&state.db, pdf.id, user_id, user_agent(&headers)).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, pdf_id = %pdf.id, "download tracking failed");
                pdf.download_count
            }
        };
    info!(pdf_id = %pdf.id, %user_id, download_count, "pdf download");
    Ok(Json(DownloadResponse {
        url: pdf.google_drive_link,
        download_count,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<AdminList<PdfResource>>> {
    let pdfs = repo::list(&state.db, false).await?;
    Ok(Json(AdminList::build(pdfs, |p| p.is_active, |p| {
        matches_admin_search(p, &q.search)
    })))
}

#[instrument(skip(state, _admin, form))]
pub async fn create_pdf(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(form): Json<PdfForm>,
) -> AppResult<(StatusCode, Json<PdfResource>)> {
    let input = validate_form(form)?;
    let pdf = repo::insert(&state.db, &input).await?;
    info!(pdf_id = %pdf.id, title = %pdf.title, "pdf added");
    Ok((StatusCode::CREATED, Json(pdf)))
}

#[instrument(skip(state, _admin, form))]
pub async fn update_pdf(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(form): Json<PdfForm>,
) -> AppResult<Json<PdfResource>> {
    let input = validate_form(form)?;
    let pdf = repo::update(&state.db, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("PDF not found"))?;
    info!(pdf_id = %pdf.id, "pdf updated");
    Ok(Json(pdf))
}

#[instrument(skip(state, _admin))]
pub async fn delete_pdf(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("PDF not found"));
    }
    info!(pdf_id = %id, "pdf deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _admin))]
pub async fn toggle_pdf(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PdfResource>> {
    let pdf = repo::toggle_active(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("PDF not found"))?;
    info!(pdf_id = %pdf.id, is_active = pdf.is_active, "pdf visibility changed");
    Ok(Json(pdf))
}
