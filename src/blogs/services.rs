use lazy_static::lazy_static;
use regex::Regex;

use super::{
    dto::{BlogForm, DEFAULT_READ_TIME},
    repo_types::{Blog, BlogInput},
};
use crate::{
    error::{AppError, AppResult},
    validation::{contains_ci, optional, required},
};

lazy_static! {
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9 -]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref DASHES: Regex = Regex::new(r"-+").unwrap();
}

/// URL slug from free text: "RBI Grade B: 2025 Plan!" -> "rbi-grade-b-2025-plan".
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let kept = NON_SLUG.replace_all(&lower, "");
    let dashed = WHITESPACE.replace_all(&kept, "-");
    let collapsed = DASHES.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn validate_form(form: BlogForm) -> AppResult<BlogInput> {
    let title = required(&form.title, "Title is required")?;
    let content = required(&form.content, "Content is required")?;
    let slug = match form.slug.trim() {
        "" => slugify(&title),
        given => slugify(given),
    };
    if slug.is_empty() {
        return Err(AppError::bad_request("Slug is required"));
    }
    let read_time = form.read_time.unwrap_or(DEFAULT_READ_TIME);
    if read_time < 1 {
        return Err(AppError::bad_request("Read time must be at least 1 minute"));
    }

    Ok(BlogInput {
        title,
        slug,
        content,
        excerpt: optional(form.excerpt.as_deref()),
        cover_image_url: optional(form.cover_image_url.as_deref()),
        tags: parse_tags(&form.tags),
        meta_title: optional(form.meta_title.as_deref()),
        meta_description: optional(form.meta_description.as_deref()),
        is_published: form.is_published,
        read_time,
    })
}

/// Search over title and excerpt, used by the public and admin lists.
pub fn matches_search(blog: &Blog, search: &str) -> bool {
    contains_ci(&blog.title, search)
        || blog
            .excerpt
            .as_deref()
            .is_some_and(|e| contains_ci(e, search))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> BlogForm {
        BlogForm {
            title: "How to Crack IBPS PO in 90 Days".into(),
            slug: "".into(),
            content: "<p>Plan</p>".into(),
            excerpt: Some(" ".into()),
            cover_image_url: None,
            tags: "IBPS, strategy, ,PO ".into(),
            meta_title: None,
            meta_description: None,
            is_published: false,
            read_time: None,
        }
    }

    #[test]
    fn slugify_strips_and_collapses() {
        assert_eq!(slugify("How to Crack IBPS PO in 90 Days"), "how-to-crack-ibps-po-in-90-days");
        assert_eq!(slugify("  RBI Grade B: 2025 -- Plan! "), "rbi-grade-b-2025-plan");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn tags_are_trimmed_and_blank_dropped() {
        assert_eq!(parse_tags("IBPS, strategy, ,PO "), vec!["IBPS", "strategy", "PO"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn form_generates_slug_and_defaults() {
        let input = validate_form(form()).unwrap();
        assert_eq!(input.slug, "how-to-crack-ibps-po-in-90-days");
        assert_eq!(input.read_time, DEFAULT_READ_TIME);
        assert_eq!(input.excerpt, None);
        assert_eq!(input.tags.len(), 3);
    }

    #[test]
    fn form_keeps_given_slug_normalized() {
        let mut f = form();
        f.slug = "My Custom Slug".into();
        f.read_time = Some(12);
        let input = validate_form(f).unwrap();
        assert_eq!(input.slug, "my-custom-slug");
        assert_eq!(input.read_time, 12);
    }

    #[test]
    fn form_rejects_missing_fields() {
        let mut f = form();
        f.title = " ".into();
        assert_eq!(validate_form(f).unwrap_err().to_string(), "Title is required");

        let mut f = form();
        f.content.clear();
        assert_eq!(validate_form(f).unwrap_err().to_string(), "Content is required");

        let mut f = form();
        f.title = "!!!".into();
        assert_eq!(validate_form(f).unwrap_err().to_string(), "Slug is required");
    }

    fn blog(title: &str, excerpt: Option<&str>) -> Blog {
        Blog {
            id: uuid::Uuid::new_v4(),
            title: title.into(),
            slug: slugify(title),
            content: "<p>body</p>".into(),
            excerpt: excerpt.map(str::to_string),
            cover_image_url: None,
            tags: vec![],
            meta_title: None,
            meta_description: None,
            is_published: true,
            read_time: DEFAULT_READ_TIME,
            created_at: time::OffsetDateTime::now_utc(),
            updated_at: time::OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn search_checks_title_and_excerpt() {
        let b = blog("Crack RBI Grade B", Some("A 120-day plan for Phase 1"));
        assert!(matches_search(&b, "grade b"));
        assert!(matches_search(&b, "PHASE 1"));
        assert!(matches_search(&b, ""));
        assert!(!matches_search(&b, "nabard"));
        assert!(!matches_search(&blog("IBPS Clerk Notes", None), "phase"));
        assert!(matches_search(&blog("IBPS Clerk Notes", None), "  "));
    }
}
