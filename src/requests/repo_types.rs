use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRequest {
    pub id: Uuid,
    pub tracking_id: String,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub request_type: String,
    pub subject: String,
    pub message: String,
    pub exam_type: String,
    pub status: String,
    pub admin_response: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub name: String,
    pub email: String,
    pub request_type: String,
    pub subject: String,
    pub message: String,
    pub exam_type: String,
}
