use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{PdfInput, PdfResource};

const PDF_COLUMNS: &str = "id, title, description, topic, google_drive_link, preview_link, \
     file_size, download_count, is_active, created_at, updated_at";

pub async fn list(db: &PgPool, active_only: bool) -> anyhow::Result<Vec<PdfResource>> {
    let rows = sqlx::query_as::<_, PdfResource>(&format!(
        r#"
        SELECT {PDF_COLUMNS}
        FROM pdf_resources
        WHERE is_active OR NOT $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(active_only)
    .fetch_all(db)
    .await
    .context("list pdfs")?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid, active_only: bool) -> anyhow::Result<Option<PdfResource>> {
    let row = sqlx::query_as::<_, PdfResource>(&format!(
        "SELECT {PDF_COLUMNS} FROM pdf_resources WHERE id = $1 AND (is_active OR NOT $2)"
    ))
    .bind(id)
    .bind(active_only)
    .fetch_optional(db)
    .await
    .context("get pdf")?;
    Ok(row)
}

pub async fn insert(db: &PgPool, input: &PdfInput) -> anyhow::Result<PdfResource> {
    let row = sqlx::query_as::<_, PdfResource>(&format!(
        r#"
        INSERT INTO pdf_resources
            (title, description, topic, google_drive_link, preview_link, file_size, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PDF_COLUMNS}
        "#
    ))
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.topic)
    .bind(&input.google_drive_link)
    .bind(&input.preview_link)
    .bind(&input.file_size)
    .bind(input.is_active)
    .fetch_one(db)
    .await
    .context("insert pdf")?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, input: &PdfInput) -> anyhow::Result<Option<PdfResource>> {
    let row = sqlx::query_as::<_, PdfResource>(&format!(
        r#"
        UPDATE pdf_resources
        SET title = $2, description = $3, topic = $4, google_drive_link = $5,
            preview_link = $6, file_size = $7, is_active = $8, updated_at = now()
        WHERE id = $1
        RETURNING {PDF_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.topic)
    .bind(&input.google_drive_link)
    .bind(&input.preview_link)
    .bind(&input.file_size)
    .bind(input.is_active)
    .fetch_optional(db)
    .await
    .context("update pdf")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM pdf_resources WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete pdf")?;
    Ok(res.rows_affected() == 1)
}

pub async fn toggle_active(db: &PgPool, id: Uuid) -> anyhow::Result<Option<PdfResource>> {
    let row = sqlx::query_as::<_, PdfResource>(&format!(
        r#"
        UPDATE pdf_resources
        SET is_active = NOT is_active, updated_at = now()
        WHERE id = $1
        RETURNING {PDF_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("toggle pdf")?;
    Ok(row)
}

/// Logs the download and bumps the counter in one transaction.
/// Returns the new counter value.
pub async fn record_download(
    db: &PgPool,
    pdf_id: Uuid,
    user_id: Uuid,
    user_agent: Option<&str>,
) -> anyhow::Result<i32> {
    let mut tx = db.begin().await.context("begin tx")?;
    sqlx::query(
        r#"
        INSERT INTO download_analytics (pdf_id, user_id, user_agent)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(pdf_id)
    .bind(user_id)
    .bind(user_agent)
    .execute(&mut *tx)
    .await
    .context("insert download analytics")?;

    let count: i32 = sqlx::query_scalar(
        r#"
        UPDATE pdf_resources
        SET download_count = download_count + 1
        WHERE id = $1
        RETURNING download_count
        "#,
    )
    .bind(pdf_id)
    .fetch_one(&mut *tx)
    .await
    .context("increment pdf downloads")?;
    tx.commit().await.context("commit tx")?;
    Ok(count)
}

/// (pdf count, total downloads)
pub async fn stats(db: &PgPool) -> anyhow::Result<(i64, i64)> {
    let row: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(download_count), 0)::BIGINT FROM pdf_resources",
    )
    .fetch_one(db)
    .await
    .context("pdf stats")?;
    Ok(row)
}
