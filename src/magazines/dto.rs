use serde::{Deserialize, Serialize};

use super::repo_types::Magazine;
use crate::pdfs::default_active;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MagazineListQuery {
    /// "September 2025"
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MagazineList {
    pub magazines: Vec<Magazine>,
    pub available_months: Vec<String>,
    pub selected_month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MagazineForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub month: String,
    pub year: Option<i32>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub google_drive_link: String,
    pub preview_link: Option<String>,
    pub file_size: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_language() -> String {
    "English".into()
}
