use time::{macros::format_description, Date, OffsetDateTime};

use super::{
    dto::CalendarEventForm,
    repo_types::{
        CalendarEvent, CalendarEventInput, CalendarEventRow, CalendarSummary, Countdown,
        DisplayDates, Urgency,
    },
};
use crate::{
    error::{AppError, AppResult},
    validation::{contains_ci, optional, required},
};

const SECS_PER_DAY: i64 = 86_400;

/// Whole days from `now` until the start of `target` (UTC), rounded up.
pub fn days_remaining(target: Date, now: OffsetDateTime) -> i64 {
    let secs = (target.midnight().assume_utc() - now).whole_seconds();
    (secs + SECS_PER_DAY - 1).div_euclid(SECS_PER_DAY)
}

pub fn countdown(days: i64) -> Countdown {
    let (label, urgency) = match days {
        d if d < 0 => ("Expired".to_string(), Urgency::Expired),
        0 => ("Today".to_string(), Urgency::Urgent),
        1 => ("Tomorrow".to_string(), Urgency::Urgent),
        d if d <= 7 => (format!("{d} days"), Urgency::Urgent),
        d if d <= 30 => (format!("{d} days"), Urgency::Soon),
        d => (format!("{d} days"), Urgency::Later),
    };
    Countdown { days, label, urgency }
}

pub fn parse_iso_date(s: &str) -> Option<Date> {
    let s = s.trim();
    let day = s.get(..10).unwrap_or(s);
    Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}

/// "5 Sep 2025"
pub fn display_date(d: Date) -> String {
    d.format(format_description!("[day padding:none] [month repr:short] [year]"))
        .unwrap_or_else(|_| "N/A".to_string())
}

/// Comma-joined display dates; "N/A" when empty or any entry is unreadable.
pub fn display_dates(dates: &[String]) -> String {
    let parsed: Option<Vec<Date>> = dates.iter().map(|d| parse_iso_date(d)).collect();
    match parsed {
        Some(ds) if !ds.is_empty() => ds.into_iter().map(display_date).collect::<Vec<_>>().join(", "),
        _ => "N/A".to_string(),
    }
}

/// Accepts a JSON array of dates, a JSON-encoded array inside a string,
/// or a single date string.
pub fn parse_date_list(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        serde_json::Value::String(s) => match serde_json::from_str::<serde_json::Value>(s) {
            Ok(inner @ serde_json::Value::Array(_)) => parse_date_list(&inner),
            _ if s.trim().is_empty() => Vec::new(),
            _ => vec![s.trim().to_string()],
        },
        _ => Vec::new(),
    }
}

/// Countdown to the first date still ahead, or to the last one once all
/// have passed. `None` when no date is readable.
pub fn next_countdown(dates: &[String], now: OffsetDateTime) -> Option<Countdown> {
    let days: Vec<i64> = dates
        .iter()
        .filter_map(|d| parse_iso_date(d))
        .map(|d| days_remaining(d, now))
        .collect();
    days.iter()
        .copied()
        .filter(|d| *d >= 0)
        .min()
        .or_else(|| days.iter().copied().max())
        .map(countdown)
}

pub fn to_view(row: CalendarEventRow, now: OffsetDateTime) -> CalendarEvent {
    let prelims = parse_date_list(&row.prelims_exam_date);
    let mains = parse_date_list(&row.mains_exam_date);

    CalendarEvent {
        id: row.id,
        deadline: countdown(days_remaining(row.form_fill_last_date, now)),
        next_prelims: next_countdown(&prelims, now),
        next_mains: next_countdown(&mains, now),
        display: DisplayDates {
            form_fill_last_date: display_date(row.form_fill_last_date),
            prelims: display_dates(&prelims),
            mains: display_dates(&mains),
        },
        exam_name: row.exam_name,
        description: row.description,
        form_fill_last_date: row.form_fill_last_date,
        prelims_exam_dates: prelims,
        mains_exam_dates: mains,
        notification_url: row.notification_url,
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

/// Header counts, bucketed by form deadline: expired, within a week, later.
pub fn summarize(events: &[CalendarEvent]) -> CalendarSummary {
    let mut summary = CalendarSummary::default();
    for e in events {
        match e.deadline.days {
            d if d < 0 => summary.expired += 1,
            0..=7 => summary.urgent += 1,
            _ => summary.soon += 1,
        }
    }
    summary
}

pub fn matches_search(event: &CalendarEvent, search: &str) -> bool {
    contains_ci(&event.exam_name, search)
        || event
            .description
            .as_deref()
            .is_some_and(|d| contains_ci(d, search))
}

fn date_list(values: &[String], label: &str) -> AppResult<Vec<Date>> {
    let dates: Vec<&str> = values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if dates.is_empty() {
        return Err(AppError::bad_request(format!("At least one {label} date is required")));
    }
    dates
        .into_iter()
        .map(|s| {
            parse_iso_date(s)
                .ok_or_else(|| AppError::bad_request(format!("Invalid {label} date: {s}")))
        })
        .collect()
}

pub fn validate_form(form: CalendarEventForm) -> AppResult<CalendarEventInput> {
    let exam_name = required(&form.exam_name, "Exam name is required")?;
    let last = required(&form.form_fill_last_date, "Form fill last date is required")?;
    let form_fill_last_date = parse_iso_date(&last)
        .ok_or_else(|| AppError::bad_request("Form fill last date is invalid"))?;

    Ok(CalendarEventInput {
        exam_name,
        description: optional(form.description.as_deref()),
        form_fill_last_date,
        prelims_exam_dates: date_list(&form.prelims_exam_dates, "prelims")?,
        mains_exam_dates: date_list(&form.mains_exam_dates, "mains")?,
        notification_url: optional(form.notification_url.as_deref()),
        is_active: form.is_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    fn row(name: &str, description: Option<&str>) -> CalendarEventRow {
        CalendarEventRow {
            id: Uuid::new_v4(),
            exam_name: name.into(),
            description: description.map(str::to_string),
            form_fill_last_date: date!(2025 - 09 - 10),
            prelims_exam_date: json!(["2025-10-04", "2025-10-05"]),
            mains_exam_date: json!("[\"2025-11-29\"]"),
            notification_url: None,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn form() -> CalendarEventForm {
        CalendarEventForm {
            exam_name: " IBPS PO ".into(),
            description: Some("".into()),
            form_fill_last_date: "2025-09-10".into(),
            prelims_exam_dates: vec!["2025-10-04".into(), " ".into()],
            mains_exam_dates: vec!["2025-11-29".into()],
            notification_url: None,
            is_active: true,
        }
    }

    #[test]
    fn days_round_up_from_now() {
        let now = datetime!(2025-09-05 10:00 UTC);
        assert_eq!(days_remaining(date!(2025 - 09 - 05), now), 0);
        assert_eq!(days_remaining(date!(2025 - 09 - 06), now), 1);
        assert_eq!(days_remaining(date!(2025 - 09 - 04), now), -1);
        assert_eq!(days_remaining(date!(2025 - 09 - 12), now), 7);
        assert_eq!(days_remaining(date!(2025 - 09 - 06), datetime!(2025-09-06 00:00 UTC)), 0);
    }

    #[test]
    fn countdown_buckets() {
        assert_eq!(countdown(-3).label, "Expired");
        assert_eq!(countdown(-3).urgency, Urgency::Expired);
        assert_eq!(countdown(0).label, "Today");
        assert_eq!(countdown(1).label, "Tomorrow");
        assert_eq!(countdown(7), Countdown { days: 7, label: "7 days".into(), urgency: Urgency::Urgent });
        assert_eq!(countdown(8).urgency, Urgency::Soon);
        assert_eq!(countdown(30).urgency, Urgency::Soon);
        assert_eq!(countdown(31).urgency, Urgency::Later);
    }

    #[test]
    fn formats_dates_for_display() {
        assert_eq!(display_date(date!(2025 - 09 - 05)), "5 Sep 2025");
        assert_eq!(
            display_dates(&["2025-10-04".into(), "2025-10-05".into()]),
            "4 Oct 2025, 5 Oct 2025"
        );
        assert_eq!(display_dates(&[]), "N/A");
        assert_eq!(display_dates(&["soon".into()]), "N/A");
    }

    #[test]
    fn date_lists_accept_array_or_encoded_string() {
        assert_eq!(parse_date_list(&json!(["2025-10-04"])), vec!["2025-10-04"]);
        assert_eq!(
            parse_date_list(&json!("[\"2025-10-04\",\"2025-10-05\"]")),
            vec!["2025-10-04", "2025-10-05"]
        );
        assert_eq!(parse_date_list(&json!("2025-10-04")), vec!["2025-10-04"]);
        assert!(parse_date_list(&json!(null)).is_empty());
    }

    #[test]
    fn view_carries_countdowns_and_display_strings() {
        let view = to_view(row("SBI PO", None), datetime!(2025-09-05 10:00 UTC));
        assert_eq!(view.deadline.label, "5 days");
        assert_eq!(view.next_prelims.as_ref().map(|c| c.days), Some(29));
        assert_eq!(view.next_mains.as_ref().map(|c| c.days), Some(85));
        assert_eq!(view.display.form_fill_last_date, "10 Sep 2025");
        assert_eq!(view.display.mains, "29 Nov 2025");
        assert_eq!(view.mains_exam_dates, vec!["2025-11-29"]);
    }

    #[test]
    fn next_countdown_skips_past_dates() {
        let now = datetime!(2025-10-05 09:00 UTC);
        let dates = vec!["2025-10-04".to_string(), "2025-10-11".to_string(), "2025-10-06".to_string()];
        assert_eq!(next_countdown(&dates, now).map(|c| c.days), Some(1));

        let past = vec!["2025-09-01".to_string(), "2025-09-20".to_string()];
        let c = next_countdown(&past, now).unwrap();
        assert_eq!(c.urgency, Urgency::Expired);
        assert_eq!(c.days, -15);

        assert!(next_countdown(&["soon".to_string()], now).is_none());
        assert!(next_countdown(&[], now).is_none());
    }

    #[test]
    fn mains_countdown_is_none_without_dates() {
        let mut r = row("SBI Clerk", None);
        r.mains_exam_date = json!([]);
        let view = to_view(r, datetime!(2025-09-05 10:00 UTC));
        assert!(view.next_mains.is_none());
        assert_eq!(view.display.mains, "N/A");
    }

    #[test]
    fn summary_buckets_by_deadline() {
        let now = datetime!(2025-09-05 10:00 UTC);
        let deadlines = [
            date!(2025 - 09 - 01),
            date!(2025 - 09 - 05),
            date!(2025 - 09 - 12),
            date!(2025 - 09 - 13),
            date!(2025 - 12 - 01),
        ];
        let events: Vec<_> = deadlines
            .into_iter()
            .map(|d| {
                let mut r = row("IBPS PO", None);
                r.form_fill_last_date = d;
                to_view(r, now)
            })
            .collect();
        assert_eq!(
            summarize(&events),
            CalendarSummary { expired: 1, urgent: 2, soon: 2 }
        );
        assert_eq!(summarize(&[]), CalendarSummary::default());
    }

    #[test]
    fn search_checks_name_and_description() {
        let r = to_view(row("RBI Grade B", Some("Phase 1 notification")), OffsetDateTime::now_utc());
        assert!(matches_search(&r, "grade"));
        assert!(matches_search(&r, "PHASE"));
        assert!(matches_search(&r, ""));
        assert!(!matches_search(&r, "nabard"));
    }

    #[test]
    fn form_drops_blank_dates_and_requires_both_stages() {
        let input = validate_form(form()).unwrap();
        assert_eq!(input.exam_name, "IBPS PO");
        assert_eq!(input.description, None);
        assert_eq!(input.prelims_exam_dates, vec![date!(2025 - 10 - 04)]);

        let mut f = form();
        f.mains_exam_dates = vec!["".into()];
        assert_eq!(
            validate_form(f).unwrap_err().to_string(),
            "At least one mains date is required"
        );

        let mut f = form();
        f.prelims_exam_dates = vec!["04/10/2025".into()];
        assert!(validate_form(f).is_err());

        let mut f = form();
        f.form_fill_last_date = "".into();
        assert_eq!(
            validate_form(f).unwrap_err().to_string(),
            "Form fill last date is required"
        );
    }
}
