use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::{
    dto::{BlockToggleRequest, BlockToggleResponse, UserList, UserListQuery},
    repo,
    services::{export_csv, export_filename, user_list},
};
use crate::{
    auth::{services::normalize_email, AdminUser},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/block-toggle", post(toggle_block))
        .route("/admin/users/export.csv", get(export_users))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<UserListQuery>,
) -> AppResult<Json<UserList>> {
    let users = repo::list_users(&state.db, q.status.blocked()).await?;
    Ok(Json(user_list(users, &q.search)))
}

#[instrument(skip(state, _admin, payload))]
pub async fn toggle_block(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<BlockToggleRequest>,
) -> AppResult<Json<BlockToggleResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(AppError::bad_request("Please enter an email address"));
    }
    let user = repo::toggle_block(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found with this email"))?;

    info!(user_id = %user.id, is_blocked = user.is_blocked, "user block state changed");
    Ok(Json(BlockToggleResponse {
        email: user.email,
        full_name: user.full_name,
        is_blocked: user.is_blocked,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn export_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<impl IntoResponse> {
    let users = repo::list_users(&state.db, None).await?;
    let body = export_csv(&users)?;
    info!(count = users.len(), "users exported");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(OffsetDateTime::now_utc())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
