use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{repo_types::UserRequest, services::RequestStatus};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRequest {
    pub name: String,
    pub email: String,
    pub request_type: String,
    pub subject: String,
    pub message: String,
    pub exam_type: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub tracking_id: String,
    pub status: RequestStatus,
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackQuery {
    pub email: String,
}

/// What the submitter can see of their request.
#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub tracking_id: String,
    pub subject: String,
    pub request_type: String,
    pub status: String,
    pub admin_response: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<UserRequest> for TrackResponse {
    fn from(r: UserRequest) -> Self {
        Self {
            tracking_id: r.tracking_id,
            subject: r.subject,
            request_type: r.request_type,
            status: r.status,
            admin_response: r.admin_response,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: i64,
    pub review: i64,
    pub approved: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize)]
pub struct RequestList {
    pub requests: Vec<UserRequest>,
    pub counts: StatusCounts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RespondRequest {
    pub response: String,
}
