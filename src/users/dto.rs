use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Blocked,
}

impl StatusFilter {
    /// Value the `is_blocked` column must have, if any.
    pub fn blocked(self) -> Option<bool> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some(false),
            StatusFilter::Blocked => Some(true),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserListQuery {
    pub status: StatusFilter,
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub total: usize,
    pub active: usize,
    pub blocked: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlockToggleRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct BlockToggleResponse {
    pub email: String,
    pub full_name: String,
    pub is_blocked: bool,
}
