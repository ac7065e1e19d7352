use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PdfResource {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub google_drive_link: String,
    pub preview_link: Option<String>,
    pub file_size: Option<String>,
    pub download_count: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated admin form, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfInput {
    pub title: String,
    pub description: String,
    pub topic: String,
    pub google_drive_link: String,
    pub preview_link: Option<String>,
    pub file_size: Option<String>,
    pub is_active: bool,
}
