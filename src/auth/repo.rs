use crate::auth::repo_types::{NewUser, User};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = "id, user_code, email, password_hash, full_name, \
     mobile_number, exam_preparing_for, is_blocked, last_sign_in_at, created_at";

impl User {
    /// Find a user by (lowercased) email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (user_code, email, password_hash, full_name, mobile_number, exam_preparing_for)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.user_code)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.full_name)
        .bind(new.mobile_number)
        .bind(new.exam_preparing_for)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn touch_last_sign_in(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_sign_in_at = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Swaps the hash only while it still equals `current_hash`.
    /// Returns false when the user is gone or the password already changed.
    pub async fn replace_password(
        db: &PgPool,
        id: Uuid,
        current_hash: &str,
        new_hash: &str,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "UPDATE users SET password_hash = $3 WHERE id = $1 AND password_hash = $2",
        )
        .bind(id)
        .bind(current_hash)
        .bind(new_hash)
        .execute(db)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
