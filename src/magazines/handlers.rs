use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{MagazineForm, MagazineList, MagazineListQuery},
    repo,
    repo_types::Magazine,
    services::{available_months, matches_admin_search, select_month, validate_form},
};
use crate::{
    auth::{services::ensure_active, AdminUser, AuthUser},
    error::{AppError, AppResult},
    listing::{AdminList, SearchQuery},
    pdfs::{user_agent, DownloadResponse},
    state::AppState,
    storage::CoverImage,
};

const COVER_URL_TTL: Duration = Duration::from_secs(10 * 60);
const COVER_MAX_BYTES: usize = 5 * 1024 * 1024;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/magazines", get(list_magazines))
        .route("/magazines/:id/cover", get(get_cover))
        .route("/magazines/:id/download", post(download_magazine))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/magazines", get(admin_list).post(create_magazine))
        .route("/admin/magazines/:id", put(update_magazine).delete(delete_magazine))
        .route("/admin/magazines/:id/toggle-active", post(toggle_magazine))
        .route(
            "/admin/magazines/:id/cover",
            post(upload_cover).layer(DefaultBodyLimit::max(COVER_MAX_BYTES)),
        )
}

fn not_found() -> AppError {
    AppError::not_found("Magazine not found")
}

#[instrument(skip(state))]
pub async fn list_magazines(
    State(state): State<AppState>,
    Query(q): Query<MagazineListQuery>,
) -> AppResult<Json<MagazineList>> {
    let all = repo::list(&state.db, true).await?;
    let months = available_months(&all);
    let (magazines, selected_month) = select_month(all, q.month.as_deref());
    Ok(Json(MagazineList {
        magazines,
        available_months: months,
        selected_month,
    }))
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// 302 to the uploaded cover, or to the bundled asset path.
#[instrument(skip(state))]
pub async fn get_cover(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Response> {
    let mag = repo::get(&state.db, id, true).await?.ok_or_else(not_found)?;
    let Some(key) = mag.cover_key else {
        return Ok(found(mag.cover_image));
    };
    match state.covers.signed_url(&key, COVER_URL_TTL).await {
        Ok(url) => Ok(found(url)),
        Err(e) => {
            warn!(error = %e, magazine_id = %id, "presign failed; serving bundled cover");
            Ok(found(mag.cover_image))
        }
    }
}

#[instrument(skip(state, headers))]
pub async fn download_magazine(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<Json<DownloadResponse>> {
    ensure_active(&state.db, user_id).await?;
    let mag = repo::get(&state.db, id, true).await?.ok_or_else(not_found)?;

    let download_count =
        match repo::record_download(&state.db, mag.id, user_id, user_agent(&headers)).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, magazine_id = %mag.id, "download tracking failed");
                mag.download_count
            }
        };
    info!(magazine_id = %mag.id, %user_id, download_count, "magazine download");
    Ok(Json(DownloadResponse {
        url: mag.google_drive_link,
        download_count,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<AdminList<Magazine>>> {
    let mags = repo::list(&state.db, false).await?;
    Ok(Json(AdminList::build(mags, |m| m.is_active, |m| {
        matches_admin_search(m, &q.search)
    })))
}

#[instrument(skip(state, _admin, form))]
pub async fn create_magazine(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(form): Json<MagazineForm>,
) -> AppResult<(StatusCode, Json<Magazine>)> {
    let input = validate_form(form)?;
    let mag = repo::insert(&state.db, &input).await?;
    info!(magazine_id = %mag.id, title = %mag.title, "magazine added");
    Ok((StatusCode::CREATED, Json(mag)))
}

#[instrument(skip(state, _admin, form))]
pub async fn update_magazine(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(form): Json<MagazineForm>,
) -> AppResult<Json<Magazine>> {
    let input = validate_form(form)?;
    let mag = repo::update(&state.db, id, &input).await?.ok_or_else(not_found)?;
    info!(magazine_id = %mag.id, "magazine updated");
    Ok(Json(mag))
}

#[instrument(skip(state, _admin))]
pub async fn delete_magazine(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mag = repo::delete(&state.db, id).await?.ok_or_else(not_found)?;
    if let Some(key) = mag.cover_key {
        if let Err(e) = state.covers.remove(&key).await {
            warn!(error = %e, %key, "orphaned magazine cover");
        }
    }
    info!(magazine_id = %id, "magazine deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _admin))]
pub async fn toggle_magazine(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Magazine>> {
    let mag = repo::toggle_active(&state.db, id).await?.ok_or_else(not_found)?;
    info!(magazine_id = %mag.id, is_active = mag.is_active, "magazine visibility changed");
    Ok(Json(mag))
}

/// POST multipart with a single `file` field holding a jpeg/png/webp.
#[instrument(skip(state, _admin, mp))]
pub async fn upload_cover(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut upload = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".into());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(e.to_string()))?;
        upload = Some((content_type, data));
        break;
    }
    let (content_type, data) = upload.ok_or_else(|| AppError::bad_request("file is required"))?;
    let cover = CoverImage::parse(&content_type, data)
        .ok_or_else(|| AppError::bad_request("Cover must be a JPEG, PNG or WebP image"))?;

    let mag = repo::get(&state.db, id, false).await?.ok_or_else(not_found)?;
    let key = cover.key_for(mag.id);
    state.covers.save(&key, cover).await?;
    repo::set_cover_key(&state.db, mag.id, &key).await?;

    if let Some(old) = mag.cover_key.filter(|old| *old != key) {
        if let Err(e) = state.covers.remove(&old).await {
            warn!(error = %e, key = %old, "could not remove previous cover");
        }
    }
    info!(magazine_id = %mag.id, %key, "magazine cover uploaded");
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "key": key }))))
}
