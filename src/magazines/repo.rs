use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Magazine, MagazineInput};

const MAGAZINE_COLUMNS: &str = "id, title, description, month, year, language, google_drive_link, \
     preview_link, file_size, cover_image, cover_key, download_count, is_active, created_at, updated_at";

pub async fn list(db: &PgPool, active_only: bool) -> anyhow::Result<Vec<Magazine>> {
    let rows = sqlx::query_as::<_, Magazine>(&format!(
        r#"
        SELECT {MAGAZINE_COLUMNS}
        FROM magazines
        WHERE is_active OR NOT $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(active_only)
    .fetch_all(db)
    .await
    .context("list magazines")?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid, active_only: bool) -> anyhow::Result<Option<Magazine>> {
    let row = sqlx::query_as::<_, Magazine>(&format!(
        "SELECT {MAGAZINE_COLUMNS} FROM magazines WHERE id = $1 AND (is_active OR NOT $2)"
    ))
    .bind(id)
    .bind(active_only)
    .fetch_optional(db)
    .await
    .context("get magazine")?;
    Ok(row)
}

pub async fn insert(db: &PgPool, input: &MagazineInput) -> anyhow::Result<Magazine> {
    let row = sqlx::query_as::<_, Magazine>(&format!(
        r#"
        INSERT INTO magazines
            (title, description, month, year, language, google_drive_link,
             preview_link, file_size, cover_image, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {MAGAZINE_COLUMNS}
        "#
    ))
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.month)
    .bind(input.year)
    .bind(&input.language)
    .bind(&input.google_drive_link)
    .bind(&input.preview_link)
    .bind(&input.file_size)
    .bind(&input.cover_image)
    .bind(input.is_active)
    .fetch_one(db)
    .await
    .context("insert magazine")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    input: &MagazineInput,
) -> anyhow::Result<Option<Magazine>> {
    let row = sqlx::query_as::<_, Magazine>(&format!(
        r#"
        UPDATE magazines
        SET title = $2, description = $3, month = $4, year = $5, language = $6,
            google_drive_link = $7, preview_link = $8, file_size = $9,
            cover_image = $10, is_active = $11, updated_at = now()
        WHERE id = $1
        RETURNING {MAGAZINE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.month)
    .bind(input.year)
    .bind(&input.language)
    .bind(&input.google_drive_link)
    .bind(&input.preview_link)
    .bind(&input.file_size)
    .bind(&input.cover_image)
    .bind(input.is_active)
    .fetch_optional(db)
    .await
    .context("update magazine")?;
    Ok(row)
}

/// Returns the deleted row so its uploaded cover can be removed.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Magazine>> {
    let row = sqlx::query_as::<_, Magazine>(&format!(
        "DELETE FROM magazines WHERE id = $1 RETURNING {MAGAZINE_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("delete magazine")?;
    Ok(row)
}

pub async fn toggle_active(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Magazine>> {
    let row = sqlx::query_as::<_, Magazine>(&format!(
        r#"
        UPDATE magazines
        SET is_active = NOT is_active, updated_at = now()
        WHERE id = $1
        RETURNING {MAGAZINE_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("toggle magazine")?;
    Ok(row)
}

pub async fn set_cover_key(db: &PgPool, id: Uuid, key: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE magazines SET cover_key = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(key)
        .execute(db)
        .await
        .context("set magazine cover")?;
    Ok(())
}

pub async fn record_download(
    db: &PgPool,
    magazine_id: Uuid,
    user_id: Uuid,
    user_agent: Option<&str>,
) -> anyhow::Result<i32> {
    let mut tx = db.begin().await.context("begin tx")?;
    sqlx::query(
        r#"
        INSERT INTO download_analytics (magazine_id, user_id, user_agent)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(magazine_id)
    .bind(user_id)
    .bind(user_agent)
    .execute(&mut *tx)
    .await
    .context("insert download analytics")?;

    let count: i32 = sqlx::query_scalar(
        r#"
        UPDATE magazines
        SET download_count = download_count + 1
        WHERE id = $1
        RETURNING download_count
        "#,
    )
    .bind(magazine_id)
    .fetch_one(&mut *tx)
    .await
    .context("increment magazine downloads")?;
    tx.commit().await.context("commit tx")?;
    Ok(count)
}

/// (magazine count, total downloads)
pub async fn stats(db: &PgPool) -> anyhow::Result<(i64, i64)> {
    let row: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(download_count), 0)::BIGINT FROM magazines",
    )
    .fetch_one(db)
    .await
    .context("magazine stats")?;
    Ok(row)
}
