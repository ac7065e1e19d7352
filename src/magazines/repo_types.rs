use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Magazine {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub month: String,
    pub year: i32,
    pub language: String,
    pub google_drive_link: String,
    pub preview_link: Option<String>,
    pub file_size: Option<String>,
    pub cover_image: String,
    #[serde(skip_serializing)]
    pub cover_key: Option<String>,
    pub download_count: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MagazineInput {
    pub title: String,
    pub description: String,
    pub month: String,
    pub year: i32,
    pub language: String,
    pub google_drive_link: String,
    pub preview_link: Option<String>,
    pub file_size: Option<String>,
    pub cover_image: String,
    pub is_active: bool,
}
