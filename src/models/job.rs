use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::incident::IncidentSnapshot;

/// Status of an analysis job in its lifecycle.
///
/// Transitions are `Queued -> Processing -> {Completed | Failed}`; the two
/// terminal states admit no further transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal jobs carry a result and are eligible for retention sweeping.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// An incident analysis job.
///
/// Every state transition replaces the whole record, so readers always see a
/// complete, consistent job regardless of writer interleaving.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub job_id: Uuid,
    pub incident_id: Uuid,
    pub snapshot: IncidentSnapshot,
    pub status: JobStatus,
    pub markdown_report: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub pii_entities_masked: u32,
}
