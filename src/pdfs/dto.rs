use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PdfListQuery {
    pub topic: Option<String>,
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct PdfForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub google_drive_link: String,
    pub preview_link: Option<String>,
    pub file_size: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

pub(crate) fn default_active() -> bool {
    true
}

/// Link to open plus the counter after this download.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub url: String,
    pub download_count: i32,
}

/// Topic card for the PDF library landing page.
#[derive(Debug, Serialize)]
pub struct TopicCard {
    pub value: &'static str,
    pub label: &'static str,
    pub image: String,
}
