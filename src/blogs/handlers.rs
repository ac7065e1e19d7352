use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::BlogForm,
    repo,
    repo_types::Blog,
    services::{matches_search, validate_form},
};
use crate::{
    auth::AdminUser,
    error::{AppError, AppResult},
    listing::{AdminList, SearchQuery},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs))
        .route("/blogs/:slug", get(get_blog))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/blogs", get(admin_list).post(create_blog))
        .route("/admin/blogs/:id", put(update_blog).delete(delete_blog))
        .route("/admin/blogs/:id/toggle-publish", post(toggle_blog))
}

fn not_found() -> AppError {
    AppError::not_found("Blog not found")
}

async fn ensure_slug_free(db: &PgPool, slug: &str, except: Option<Uuid>) -> AppResult<()> {
    if repo::slug_taken(db, slug, except).await? {
        warn!(%slug, "blog slug already in use");
        return Err(AppError::Conflict(format!("Slug '{slug}' is already in use")));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<Vec<Blog>>> {
    let blogs = repo::list(&state.db, true).await?;
    Ok(Json(blogs.into_iter().filter(|b| matches_search(b, &q.search)).collect()))
}

#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Blog>> {
    repo::find_published_by_slug(&state.db, &slug)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<AdminList<Blog>>> {
    let blogs = repo::list(&state.db, false).await?;
    Ok(Json(AdminList::build(blogs, |b| b.is_published, |b| {
        matches_search(b, &q.search)
    })))
}

#[instrument(skip(state, _admin, form))]
pub async fn create_blog(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(form): Json<BlogForm>,
) -> AppResult<(StatusCode, Json<Blog>)> {
    let input = validate_form(form)?;
    ensure_slug_free(&state.db, &input.slug, None).await?;
    let blog = repo::insert(&state.db, &input).await?;
    info!(blog_id = %blog.id, slug = %blog.slug, "blog created");
    Ok((StatusCode::CREATED, Json(blog)))
}

#[instrument(skip(state, _admin, form))]
pub async fn update_blog(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(form): Json<BlogForm>,
) -> AppResult<Json<Blog>> {
    let input = validate_form(form)?;
    ensure_slug_free(&state.db, &input.slug, Some(id)).await?;
    let blog = repo::update(&state.db, id, &input).await?.ok_or_else(not_found)?;
    info!(blog_id = %blog.id, "blog updated");
    Ok(Json(blog))
}

#[instrument(skip(state, _admin))]
pub async fn delete_blog(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !repo::delete(&state.db, id).await? {
        return Err(not_found());
    }
    info!(blog_id = %id, "blog deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _admin))]
pub async fn toggle_blog(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Blog>> {
    let blog = repo::toggle_published(&state.db, id).await?.ok_or_else(not_found)?;
    info!(blog_id = %blog.id, is_published = blog.is_published, "blog publish state changed");
    Ok(Json(blog))
}
