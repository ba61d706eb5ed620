use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::job::{AnalysisJob, JobStatus};

/// Response returned when a new analysis job is submitted.
#[derive(Debug, Serialize)]
pub struct AnalysisJobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}

/// Response for polling the status and result of an analysis job.
#[derive(Debug, Serialize)]
pub struct AnalysisResultResponse {
    pub job_id: Uuid,
    pub incident_id: Uuid,
    pub status: JobStatus,
    pub markdown_report: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub pii_entities_masked: u32,
}

impl From<&AnalysisJob> for AnalysisResultResponse {
    fn from(job: &AnalysisJob) -> Self {
        Self {
            job_id: job.job_id,
            incident_id: job.incident_id,
            status: job.status,
            markdown_report: job.markdown_report.clone(),
            error_message: job.error_message.clone(),
            created_at: job.created_at,
            completed_at: job.completed_at,
            pii_entities_masked: job.pii_entities_masked,
        }
    }
}
