use sqlx::PgPool;

use crate::auth::{repo::USER_COLUMNS, repo_types::User};

/// Newest first, optionally restricted by block state.
pub async fn list_users(db: &PgPool, blocked: Option<bool>) -> anyhow::Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE ($1::boolean IS NULL OR is_blocked = $1)
        ORDER BY created_at DESC
        "#
    ))
    .bind(blocked)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Flips the block flag; `None` when no account has that email.
pub async fn toggle_block(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let row = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET is_blocked = NOT is_blocked
        WHERE email = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// (total, blocked)
pub async fn count_users(db: &PgPool) -> anyhow::Result<(i64, i64)> {
    let row: (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COUNT(*) FILTER (WHERE is_blocked)
        FROM users
        "#,
    )
    .fetch_one(db)
    .await?;
    Ok(row)
}
