use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewRequest, UserRequest};

const REQUEST_COLUMNS: &str = "id, tracking_id, user_id, name, email, request_type, subject, \
     message, exam_type, status, admin_response, created_at, updated_at";

pub async fn insert(
    db: &PgPool,
    tracking_id: &str,
    user_id: Option<Uuid>,
    req: &NewRequest,
    status: &str,
) -> anyhow::Result<UserRequest> {
    let row = sqlx::query_as::<_, UserRequest>(&format!(
        r#"
        INSERT INTO user_requests
            (tracking_id, user_id, name, email, request_type, subject, message, exam_type, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(tracking_id)
    .bind(user_id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.request_type)
    .bind(&req.subject)
    .bind(&req.message)
    .bind(&req.exam_type)
    .bind(status)
    .fetch_one(db)
    .await
    .context("insert user request")?;
    Ok(row)
}

pub async fn find_by_tracking_id(db: &PgPool, tracking_id: &str) -> anyhow::Result<Option<UserRequest>> {
    let row = sqlx::query_as::<_, UserRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM user_requests WHERE tracking_id = $1"
    ))
    .bind(tracking_id)
    .fetch_optional(db)
    .await
    .context("find request by tracking id")?;
    Ok(row)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<UserRequest>> {
    let row = sqlx::query_as::<_, UserRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM user_requests WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get request")?;
    Ok(row)
}

/// Newest first; `None` lists every status.
pub async fn list(db: &PgPool, status: Option<&str>) -> anyhow::Result<Vec<UserRequest>> {
    let rows = sqlx::query_as::<_, UserRequest>(&format!(
        r#"
        SELECT {REQUEST_COLUMNS}
        FROM user_requests
        WHERE $1::text IS NULL OR status = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(status)
    .fetch_all(db)
    .await
    .context("list requests")?;
    Ok(rows)
}

pub async fn count_by_status(db: &PgPool) -> anyhow::Result<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM user_requests GROUP BY status")
            .fetch_all(db)
            .await
            .context("count requests by status")?;
    Ok(rows)
}

/// Moves a request from `from` to `to`. Returns `None` when the row is gone
/// or no longer in `from`.
pub async fn transition(
    db: &PgPool,
    id: Uuid,
    from: &str,
    to: &str,
    admin_response: Option<&str>,
) -> anyhow::Result<Option<UserRequest>> {
    let row = sqlx::query_as::<_, UserRequest>(&format!(
        r#"
        UPDATE user_requests
        SET status = $3,
            admin_response = COALESCE($4, admin_response),
            updated_at = now()
        WHERE id = $1 AND status = $2
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(from)
    .bind(to)
    .bind(admin_response)
    .fetch_optional(db)
    .await
    .context("update request status")?;
    Ok(row)
}
