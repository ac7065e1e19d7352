//! Admin catalogue listings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub search: String,
}

/// Rows matching the admin search, with counts over the whole catalogue.
#[derive(Debug, Serialize)]
pub struct AdminList<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub active: usize,
}

impl<T> AdminList<T> {
    /// `total` and `active` are counted before `keep` narrows the rows.
    pub fn build(rows: Vec<T>, is_active: impl Fn(&T) -> bool, keep: impl Fn(&T) -> bool) -> Self {
        let total = rows.len();
        let active = rows.iter().filter(|r| is_active(r)).count();
        let items = rows.into_iter().filter(|r| keep(r)).collect();
        Self { items, total, active }
    }
}
