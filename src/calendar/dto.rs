use serde::Deserialize;

use crate::pdfs::default_active;

#[derive(Debug, Deserialize)]
pub struct CalendarEventForm {
    #[serde(default)]
    pub exam_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub form_fill_last_date: String,
    #[serde(default)]
    pub prelims_exam_dates: Vec<String>,
    #[serde(default)]
    pub mains_exam_dates: Vec<String>,
    pub notification_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}
