use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Exam dates are JSONB: normally an array of ISO dates, but older rows hold
/// a JSON-encoded string or a bare date.
#[derive(Debug, Clone, FromRow)]
pub struct CalendarEventRow {
    pub id: Uuid,
    pub exam_name: String,
    pub description: Option<String>,
    pub form_fill_last_date: Date,
    pub prelims_exam_date: serde_json::Value,
    pub mains_exam_date: serde_json::Value,
    pub notification_url: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEventInput {
    pub exam_name: String,
    pub description: Option<String>,
    pub form_fill_last_date: Date,
    pub prelims_exam_dates: Vec<Date>,
    pub mains_exam_dates: Vec<Date>,
    pub notification_url: Option<String>,
    pub is_active: bool,
}

/// How close a date is, bucketed for display.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Expired,
    Urgent,
    Soon,
    Later,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub label: String,
    pub urgency: Urgency,
}

#[derive(Debug, Serialize)]
pub struct DisplayDates {
    pub form_fill_last_date: String,
    pub prelims: String,
    pub mains: String,
}

#[derive(Debug, Serialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub exam_name: String,
    pub description: Option<String>,
    #[serde(with = "iso_date")]
    pub form_fill_last_date: Date,
    pub prelims_exam_dates: Vec<String>,
    pub mains_exam_dates: Vec<String>,
    pub notification_url: Option<String>,
    pub is_active: bool,
    pub deadline: Countdown,
    pub next_prelims: Option<Countdown>,
    pub next_mains: Option<Countdown>,
    pub display: DisplayDates,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Counts shown above the calendar: forms expired, closing within a week,
/// closing later.
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CalendarSummary {
    pub expired: usize,
    pub urgent: usize,
    pub soon: usize,
}

#[derive(Debug, Serialize)]
pub struct CalendarPage {
    pub events: Vec<CalendarEvent>,
    pub summary: CalendarSummary,
}
