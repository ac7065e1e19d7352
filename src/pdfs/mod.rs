mod dto;
mod handlers;
mod repo;
mod repo_types;
mod services;

use crate::state::AppState;
use axum::Router;

pub(crate) use dto::{default_active, DownloadResponse};
pub(crate) use handlers::user_agent;
pub use repo::stats;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::public_routes())
        .merge(handlers::admin_routes())
}
