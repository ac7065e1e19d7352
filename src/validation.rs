//! Small helpers shared by the admin forms.

use crate::error::{AppError, AppResult};

/// Trimmed value, or a 400 with `message` when blank.
pub fn required(value: &str, message: &str) -> AppResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::bad_request(message));
    }
    Ok(v.to_string())
}

/// Trimmed value; blank becomes `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Case-insensitive substring test; an empty needle matches everything.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
