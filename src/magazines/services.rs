use super::{
    dto::MagazineForm,
    repo_types::{Magazine, MagazineInput},
};
use crate::{
    error::{AppError, AppResult},
    validation::{contains_ci, optional, required},
};

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const LANGUAGES: [&str; 2] = ["English", "Hindi"];

const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;

fn canonical<'a>(choices: &[&'a str], value: &str) -> Option<&'a str> {
    let value = value.trim();
    choices.iter().copied().find(|c| c.eq_ignore_ascii_case(value))
}

/// 1-based month number of an English month name.
pub fn month_number(name: &str) -> Option<u8> {
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name.trim()))
        .map(|i| i as u8 + 1)
}

pub fn cover_image_path(month: &str, year: i32, language: &str) -> String {
    format!(
        "/assets/magazines/{}{}{}.png",
        month.to_lowercase(),
        year,
        language.to_lowercase()
    )
}

pub fn month_label(m: &Magazine) -> String {
    format!("{} {}", m.month, m.year)
}

pub fn validate_form(form: MagazineForm) -> AppResult<MagazineInput> {
    let title = required(&form.title, "Title is required")?;
    let month = canonical(&MONTHS, &required(&form.month, "Month is required")?)
        .ok_or_else(|| AppError::bad_request("Month is invalid"))?;
    let year = form
        .year
        .ok_or_else(|| AppError::bad_request("Year is required"))?;
    if !YEAR_RANGE.contains(&year) {
        return Err(AppError::bad_request("Year is invalid"));
    }
    let language = canonical(&LANGUAGES, &required(&form.language, "Language is required")?)
        .ok_or_else(|| AppError::bad_request("Language must be English or Hindi"))?;
    let google_drive_link = required(&form.google_drive_link, "Google Drive link is required")?;

    Ok(MagazineInput {
        title,
        description: form.description.trim().to_string(),
        month: month.to_string(),
        year,
        language: language.to_string(),
        google_drive_link,
        preview_link: optional(form.preview_link.as_deref()),
        file_size: optional(form.file_size.as_deref()),
        cover_image: cover_image_path(month, year, language),
        is_active: form.is_active,
    })
}

fn sort_key(m: &Magazine) -> (i32, u8) {
    (m.year, month_number(&m.month).unwrap_or(0))
}

/// Distinct "Month Year" labels, newest first.
pub fn available_months(mags: &[Magazine]) -> Vec<String> {
    let mut keyed: Vec<((i32, u8), String)> = mags.iter().map(|m| (sort_key(m), month_label(m))).collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    keyed.into_iter().map(|(_, label)| label).collect()
}

/// Issues of the requested month, or of the newest month when none is given.
pub fn select_month(mags: Vec<Magazine>, month: Option<&str>) -> (Vec<Magazine>, Option<String>) {
    let wanted = match month.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => Some(m.to_string()),
        None => available_months(&mags).into_iter().next(),
    };
    let Some(label) = wanted else {
        return (Vec::new(), None);
    };
    let picked = mags
        .into_iter()
        .filter(|m| month_label(m).eq_ignore_ascii_case(&label))
        .collect();
    (picked, Some(label))
}

/// Admin search over title, month, year and language.
pub fn matches_admin_search(m: &Magazine, search: &str) -> bool {
    contains_ci(&m.title, search)
        || contains_ci(&m.month, search)
        || contains_ci(&m.year.to_string(), search)
        || contains_ci(&m.language, search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn mag(month: &str, year: i32, language: &str) -> Magazine {
        Magazine {
            id: Uuid::new_v4(),
            title: format!("Current Affairs {month} {year} ({language})"),
            description: String::new(),
            month: month.into(),
            year,
            language: language.into(),
            google_drive_link: "https://drive".into(),
            preview_link: None,
            file_size: None,
            cover_image: cover_image_path(month, year, language),
            cover_key: None,
            download_count: 0,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn form() -> MagazineForm {
        MagazineForm {
            title: "Current Affairs September 2025".into(),
            description: String::new(),
            month: "september".into(),
            year: Some(2025),
            language: "hindi".into(),
            google_drive_link: "https://drive.google.com/x".into(),
            preview_link: None,
            file_size: Some(" ".into()),
            is_active: true,
        }
    }

    #[test]
    fn cover_path_is_lowercased_concatenation() {
        assert_eq!(
            cover_image_path("September", 2025, "English"),
            "/assets/magazines/september2025english.png"
        );
    }

    #[test]
    fn form_canonicalizes_month_and_language() {
        let input = validate_form(form()).unwrap();
        assert_eq!(input.month, "September");
        assert_eq!(input.language, "Hindi");
        assert_eq!(input.cover_image, "/assets/magazines/september2025hindi.png");
        assert_eq!(input.file_size, None);
    }

    #[test]
    fn form_rejects_missing_or_invalid_fields() {
        let mut f = form();
        f.month = "Smarch".into();
        assert_eq!(validate_form(f).unwrap_err().to_string(), "Month is invalid");

        let mut f = form();
        f.year = None;
        assert_eq!(validate_form(f).unwrap_err().to_string(), "Year is required");

        let mut f = form();
        f.language = "Tamil".into();
        assert!(validate_form(f).is_err());

        let mut f = form();
        f.google_drive_link = "".into();
        assert_eq!(
            validate_form(f).unwrap_err().to_string(),
            "Google Drive link is required"
        );
    }

    #[test]
    fn months_sort_by_calendar_not_insertion() {
        let mags = vec![
            mag("July", 2025, "English"),
            mag("September", 2025, "English"),
            mag("December", 2024, "Hindi"),
            mag("September", 2025, "Hindi"),
        ];
        assert_eq!(
            available_months(&mags),
            vec!["September 2025", "July 2025", "December 2024"]
        );
    }

    #[test]
    fn defaults_to_newest_month() {
        let mags = vec![
            mag("August", 2025, "English"),
            mag("September", 2025, "English"),
            mag("September", 2025, "Hindi"),
        ];
        let (picked, label) = select_month(mags.clone(), None);
        assert_eq!(label.as_deref(), Some("September 2025"));
        assert_eq!(picked.len(), 2);

        let (picked, _) = select_month(mags, Some("august 2025"));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].month, "August");

        let (picked, label) = select_month(Vec::new(), None);
        assert!(picked.is_empty());
        assert!(label.is_none());
    }

    #[test]
    fn admin_search_covers_title_month_year_and_language() {
        let mut m = mag("October", 2025, "Hindi");
        m.title = "Monthly Digest".into();
        assert!(matches_admin_search(&m, "digest"));
        assert!(matches_admin_search(&m, "octo"));
        assert!(matches_admin_search(&m, "2025"));
        assert!(matches_admin_search(&m, "HINDI"));
        assert!(!matches_admin_search(&m, "English"));
        assert!(!matches_admin_search(&m, "2024"));
    }
}
