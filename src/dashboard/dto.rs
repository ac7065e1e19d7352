use serde::Serialize;

use crate::requests::StatusCounts;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_pdfs: i64,
    pub pdf_downloads: i64,
    pub total_magazines: i64,
    pub magazine_downloads: i64,
    pub active_calendar_events: i64,
    pub requests: StatusCounts,
    pub total_users: i64,
    pub blocked_users: i64,
}

impl DashboardStats {
    pub fn total_downloads(&self) -> i64 {
        self.pdf_downloads + self.magazine_downloads
    }
}

/// Wire shape: the stats plus the combined download total.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub total_downloads: i64,
}

impl From<DashboardStats> for DashboardResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_downloads: stats.total_downloads(),
            stats,
        }
    }
}
