use std::{fmt, str::FromStr};

use super::{dto::PdfForm, repo_types::{PdfInput, PdfResource}};
use crate::{
    error::{AppError, AppResult},
    validation::{contains_ci, optional, required},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Quants,
    English,
    Reasoning,
    GeneralAwareness,
    Prelims,
    Mains,
    Po,
    Clerk,
    Insurance,
    Other,
}

impl Topic {
    pub const ALL: [Topic; 10] = [
        Topic::Quants,
        Topic::English,
        Topic::Reasoning,
        Topic::GeneralAwareness,
        Topic::Prelims,
        Topic::Mains,
        Topic::Po,
        Topic::Clerk,
        Topic::Insurance,
        Topic::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Quants => "quants",
            Topic::English => "english",
            Topic::Reasoning => "reasoning",
            Topic::GeneralAwareness => "general_awareness",
            Topic::Prelims => "prelims",
            Topic::Mains => "mains",
            Topic::Po => "po",
            Topic::Clerk => "clerk",
            Topic::Insurance => "insurance",
            Topic::Other => "other",
        }
    }

    /// Label shown in the topic picker.
    pub fn label(self) -> &'static str {
        match self {
            Topic::Quants => "Quants",
            Topic::English => "English",
            Topic::Reasoning => "Reasoning",
            Topic::GeneralAwareness => "General Awareness",
            Topic::Prelims => "Prelims",
            Topic::Mains => "Mains",
            Topic::Po => "PO",
            Topic::Clerk => "Clerk",
            Topic::Insurance => "Insurance",
            Topic::Other => "Other",
        }
    }

    pub fn image_path(self) -> String {
        format!("/assets/topics/{}.png", self.as_str())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = AppError;

    /// Accepts the stored value or the picker label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::bad_request(format!("Unknown topic: {s}")))
    }
}

pub fn validate_form(form: PdfForm) -> AppResult<PdfInput> {
    let title = required(&form.title, "Title is required")?;
    let topic = required(&form.topic, "Topic is required")?.parse::<Topic>()?;
    let google_drive_link = required(&form.google_drive_link, "Google Drive link is required")?;
    Ok(PdfInput {
        title,
        description: form.description.trim().to_string(),
        topic: topic.as_str().to_string(),
        google_drive_link,
        preview_link: optional(form.preview_link.as_deref()),
        file_size: optional(form.file_size.as_deref()),
        is_active: form.is_active,
    })
}

/// Topic filter ("All" or absent disables it) then title search.
pub fn filter_pdfs(
    pdfs: Vec<PdfResource>,
    topic: Option<&str>,
    search: &str,
) -> AppResult<Vec<PdfResource>> {
    let topic = match topic.map(str::trim) {
        None | Some("") => None,
        Some(t) if t.eq_ignore_ascii_case("all") => None,
        Some(t) => Some(t.parse::<Topic>()?),
    };
    Ok(pdfs
        .into_iter()
        .filter(|p| topic.map_or(true, |t| p.topic == t.as_str()))
        .filter(|p| contains_ci(&p.title, search))
        .collect())
}

/// Admin search over title, description and topic.
pub fn matches_admin_search(pdf: &PdfResource, search: &str) -> bool {
    contains_ci(&pdf.title, search)
        || contains_ci(&pdf.description, search)
        || contains_ci(&pdf.topic, search)
}
