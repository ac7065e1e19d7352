use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{DashboardResponse, DashboardStats};
use crate::{
    auth::AdminUser, calendar, error::AppResult, magazines, pdfs, requests, state::AppState, users,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/dashboard", get(get_dashboard))
}

#[instrument(skip(state, _admin))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<DashboardResponse>> {
    let db = &state.db;
    let (pdf, magazine, active_calendar_events, by_status, (total_users, blocked_users)) = tokio::try_join!(
        pdfs::stats(db),
        magazines::stats(db),
        calendar::count_active(db),
        requests::count_by_status(db),
        users::count_users(db),
    )?;

    let stats = DashboardStats {
        total_pdfs: pdf.0,
        pdf_downloads: pdf.1,
        total_magazines: magazine.0,
        magazine_downloads: magazine.1,
        active_calendar_events,
        requests: requests::tally(&by_status),
        total_users,
        blocked_users,
    };
    Ok(Json(stats.into()))
}
