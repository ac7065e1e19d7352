use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Blog, BlogInput};

const BLOG_COLUMNS: &str = "id, title, slug, content, excerpt, cover_image_url, tags, meta_title, \
     meta_description, is_published, read_time, created_at, updated_at";

pub async fn list(db: &PgPool, published_only: bool) -> anyhow::Result<Vec<Blog>> {
    let rows = sqlx::query_as::<_, Blog>(&format!(
        r#"
        SELECT {BLOG_COLUMNS}
        FROM blogs
        WHERE is_published OR NOT $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(published_only)
    .fetch_all(db)
    .await
    .context("list blogs")?;
    Ok(rows)
}

pub async fn find_published_by_slug(db: &PgPool, slug: &str) -> anyhow::Result<Option<Blog>> {
    let row = sqlx::query_as::<_, Blog>(&format!(
        "SELECT {BLOG_COLUMNS} FROM blogs WHERE slug = $1 AND is_published"
    ))
    .bind(slug)
    .fetch_optional(db)
    .await
    .context("get blog by slug")?;
    Ok(row)
}

/// Whether another post already uses `slug`.
pub async fn slug_taken(db: &PgPool, slug: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM blogs WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(slug)
    .bind(except)
    .fetch_one(db)
    .await
    .context("check blog slug")?;
    Ok(taken)
}

pub async fn insert(db: &PgPool, input: &BlogInput) -> anyhow::Result<Blog> {
    let row = sqlx::query_as::<_, Blog>(&format!(
        r#"
        INSERT INTO blogs
            (title, slug, content, excerpt, cover_image_url, tags, meta_title,
             meta_description, is_published, read_time)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {BLOG_COLUMNS}
        "#
    ))
    .bind(&input.title)
    .bind(&input.slug)
    .bind(&input.content)
    .bind(&input.excerpt)
    .bind(&input.cover_image_url)
    .bind(&input.tags)
    .bind(&input.meta_title)
    .bind(&input.meta_description)
    .bind(input.is_published)
    .bind(input.read_time)
    .fetch_one(db)
    .await
    .context("insert blog")?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, input: &BlogInput) -> anyhow::Result<Option<Blog>> {
    let row = sqlx::query_as::<_, Blog>(&format!(
        r#"
        UPDATE blogs
        SET title = $2, slug = $3, content = $4, excerpt = $5, cover_image_url = $6,
            tags = $7, meta_title = $8, meta_description = $9, is_published = $10,
            read_time = $11, updated_at = now()
        WHERE id = $1
        RETURNING {BLOG_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.title)
    .bind(&input.slug)
    .bind(&input.content)
    .bind(&input.excerpt)
    .bind(&input.cover_image_url)
    .bind(&input.tags)
    .bind(&input.meta_title)
    .bind(&input.meta_description)
    .bind(input.is_published)
    .bind(input.read_time)
    .fetch_optional(db)
    .await
    .context("update blog")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM blogs WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete blog")?;
    Ok(res.rows_affected() == 1)
}

pub async fn toggle_published(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Blog>> {
    let row = sqlx::query_as::<_, Blog>(&format!(
        r#"
        UPDATE blogs
        SET is_published = NOT is_published, updated_at = now()
        WHERE id = $1
        RETURNING {BLOG_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("toggle blog")?;
    Ok(row)
}
