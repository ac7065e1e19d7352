use time::{macros::format_description, Date, OffsetDateTime};

use super::dto::UserList;
use crate::auth::repo_types::User;

const CSV_HEADERS: [&str; 8] = [
    "ID",
    "Full Name",
    "Email",
    "Mobile Number",
    "Exam Preparing For",
    "Registration Date",
    "Status",
    "Last Sign In",
];

/// Case-insensitive match on name, email and exam; substring match on mobile.
pub fn matches_search(user: &User, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    user.full_name.to_lowercase().contains(&needle)
        || user.email.to_lowercase().contains(&needle)
        || user.exam_preparing_for.to_lowercase().contains(&needle)
        || user.mobile_number.contains(term)
}

/// Counts describe the status-filtered rows; only `users` is narrowed by the search.
pub fn user_list(users: Vec<User>, search: &str) -> UserList {
    let total = users.len();
    let blocked = users.iter().filter(|u| u.is_blocked).count();
    let users = users.into_iter().filter(|u| matches_search(u, search)).collect();
    UserList {
        users,
        total,
        active: total - blocked,
        blocked,
    }
}

fn iso_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| d.to_string())
}

pub fn status_label(user: &User) -> &'static str {
    if user.is_blocked {
        "Blocked"
    } else {
        "Active"
    }
}

pub fn export_csv(users: &[User]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
    wtr.write_record(CSV_HEADERS)?;
    for u in users {
        let last_sign_in = u
            .last_sign_in_at
            .map(|t| iso_date(t.date()))
            .unwrap_or_else(|| "Never".into());
        let registered = iso_date(u.created_at.date());
        wtr.write_record([
            u.user_code.as_str(),
            u.full_name.as_str(),
            u.email.as_str(),
            u.mobile_number.as_str(),
            u.exam_preparing_for.as_str(),
            registered.as_str(),
            status_label(u),
            last_sign_in.as_str(),
        ])?;
    }
    wtr.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))
}

pub fn export_filename(now: OffsetDateTime) -> String {
    format!("users_export_{}.csv", iso_date(now.date()))
}
