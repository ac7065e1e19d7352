use std::{fmt, str::FromStr};

use rand::Rng;
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

use uuid::Uuid;

use super::{
    dto::{StatusCounts, SubmitRequest},
    repo,
    repo_types::{NewRequest, UserRequest},
};
use crate::{
    auth::services::{constant_time_eq, is_valid_email, normalize_email},
    error::{unique_violation, AppError, AppResult},
    ids::insert_with_fresh_id,
};

const MAX_TRACKING_ATTEMPTS: usize = 10;
const TRACKING_ID_CONSTRAINT: &str = "user_requests_tracking_id_key";
const TRACKING_RANGE: std::ops::RangeInclusive<u32> = 10_000..=99_999;

pub const REQUEST_TYPES: [&str; 5] = ["pdf_request", "feedback", "suggestion", "bug_report", "other"];

pub const EXAM_TYPES: [&str; 10] = [
    "SBI PO",
    "SBI Clerk",
    "IBPS PO",
    "IBPS Clerk",
    "RRB PO",
    "RRB Clerk",
    "Insurance",
    "RBI Grade B",
    "NABARD",
    "Other",
];

/// Review workflow: review -> approved -> completed, or review -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Review,
    Approved,
    Completed,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [Self::Review, Self::Approved, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Completed => "completed",
        }
    }

    pub fn approve(self) -> AppResult<Self> {
        match self {
            Self::Review => Ok(Self::Approved),
            other => Err(AppError::Conflict(format!("Cannot approve a request that is {other}"))),
        }
    }

    pub fn complete(self) -> AppResult<Self> {
        match self {
            Self::Review | Self::Approved => Ok(Self::Completed),
            Self::Completed => Err(AppError::Conflict("Request is already completed".into())),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::bad_request(format!("Unknown status: {s}")))
    }
}

/// `None` means every status.
pub fn parse_status_filter(raw: Option<&str>) -> AppResult<Option<RequestStatus>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

pub fn tally(rows: &[(String, i64)]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for (status, n) in rows {
        counts.all += n;
        match status.parse::<RequestStatus>() {
            Ok(RequestStatus::Review) => counts.review += n,
            Ok(RequestStatus::Approved) => counts.approved += n,
            Ok(RequestStatus::Completed) => counts.completed += n,
            Err(_) => {}
        }
    }
    counts
}

pub fn generate_tracking_id<R: Rng>(rng: &mut R) -> String {
    rng.gen_range(TRACKING_RANGE).to_string()
}

pub fn is_tracking_id(s: &str) -> bool {
    s.len() == 5 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Stores a new request in review, drawing another tracking id when the
/// insert hits one already in use.
pub async fn create_request(
    db: &PgPool,
    user_id: Option<Uuid>,
    req: &NewRequest,
) -> anyhow::Result<UserRequest> {
    let status = RequestStatus::Review.as_str();
    insert_with_fresh_id(
        MAX_TRACKING_ATTEMPTS,
        || generate_tracking_id(&mut rand::thread_rng()),
        move |tracking_id| async move { repo::insert(db, &tracking_id, user_id, req, status).await },
        |e| unique_violation(e) == Some(TRACKING_ID_CONSTRAINT),
    )
    .await
}

/// A tracking id is only shown to the address that submitted it.
pub fn submitted_by(req: &UserRequest, email: &str) -> AppResult<()> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::bad_request("Please enter the email used for the request"));
    }
    if !constant_time_eq(&normalize_email(&req.email), &email) {
        warn!(tracking_id = %req.tracking_id, "tracking lookup with wrong email");
        return Err(AppError::not_found("Request not found"));
    }
    Ok(())
}

fn pick(choices: &[&'static str], value: &str, default: &'static str) -> Option<&'static str> {
    let value = value.trim();
    if value.is_empty() {
        return Some(default);
    }
    choices.iter().copied().find(|c| c.eq_ignore_ascii_case(value))
}

pub fn validate_submission(form: SubmitRequest) -> AppResult<NewRequest> {
    let name = form.name.trim();
    let email = normalize_email(&form.email);
    let subject = form.subject.trim();
    let message = form.message.trim();
    if name.is_empty() || email.is_empty() || subject.is_empty() || message.is_empty() {
        return Err(AppError::bad_request("Please fill all required fields"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("Please enter a valid email address"));
    }
    let request_type = pick(&REQUEST_TYPES, &form.request_type, REQUEST_TYPES[0])
        .ok_or_else(|| AppError::bad_request("Invalid request type"))?;
    let exam_type = pick(&EXAM_TYPES, &form.exam_type, EXAM_TYPES[0])
        .ok_or_else(|| AppError::bad_request("Invalid exam type"))?;

    Ok(NewRequest {
        name: name.to_string(),
        email,
        request_type: request_type.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
        exam_type: exam_type.to_string(),
    })
}
