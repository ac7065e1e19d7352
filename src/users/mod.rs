mod dto;
mod handlers;
mod repo;
mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::count_users;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
