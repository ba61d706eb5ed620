//! In-memory analysis job store.
//!
//! A flat map keyed by job id rather than a queue: callers poll by id, never
//! in FIFO order. Every transition is a whole-record replacement (read the
//! current record, build the successor, insert), so readers only ever observe
//! complete records. Exactly one background task owns a given job end to end;
//! the lock guards the map, not a contended per-job write path.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::incident::IncidentSnapshot;
use crate::models::job::{AnalysisJob, JobStatus};

#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, AnalysisJob>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new job in `Queued` status and return its fresh id.
    pub fn create(&self, snapshot: IncidentSnapshot) -> Uuid {
        let job_id = Uuid::new_v4();
        let incident_id = snapshot.incident_id;
        let job = AnalysisJob {
            job_id,
            incident_id,
            snapshot,
            status: JobStatus::Queued,
            markdown_report: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
            pii_entities_masked: 0,
        };
        self.jobs
            .write()
            .expect("job table lock poisoned")
            .insert(job_id, job);
        tracing::info!(job_id = %job_id, incident_id = %incident_id, "created analysis job");
        job_id
    }

    /// Transition `Queued -> Processing`. No-op if the job does not exist.
    pub fn mark_processing(&self, job_id: Uuid) {
        let mut jobs = self.jobs.write().expect("job table lock poisoned");
        if let Some(job) = jobs.get(&job_id) {
            let mut updated = job.clone();
            updated.status = JobStatus::Processing;
            tracing::info!(job_id = %job_id, "job status: queued -> processing");
            jobs.insert(job_id, updated);
        }
    }

    /// Transition to `Completed` with the generated report and mask count.
    pub fn mark_completed(&self, job_id: Uuid, markdown_report: String, pii_entities_masked: u32) {
        let mut jobs = self.jobs.write().expect("job table lock poisoned");
        if let Some(job) = jobs.get(&job_id) {
            let mut updated = job.clone();
            updated.status = JobStatus::Completed;
            updated.markdown_report = Some(markdown_report);
            updated.error_message = None;
            updated.completed_at = Some(Utc::now());
            updated.pii_entities_masked = pii_entities_masked;
            tracing::info!(job_id = %job_id, incident_id = %job.incident_id, "job completed");
            jobs.insert(job_id, updated);
        }
    }

    /// Transition to `Failed` with a human-readable reason.
    pub fn mark_failed(&self, job_id: Uuid, error_message: &str) {
        let mut jobs = self.jobs.write().expect("job table lock poisoned");
        if let Some(job) = jobs.get(&job_id) {
            let mut updated = job.clone();
            updated.status = JobStatus::Failed;
            updated.markdown_report = None;
            updated.error_message = Some(error_message.to_string());
            updated.completed_at = Some(Utc::now());
            updated.pii_entities_masked = 0;
            tracing::error!(job_id = %job_id, incident_id = %job.incident_id, error = %error_message, "job failed");
            jobs.insert(job_id, updated);
        }
    }

    /// Snapshot read of a job. Absent means unknown or already swept.
    pub fn get(&self, job_id: Uuid) -> Option<AnalysisJob> {
        self.jobs
            .read()
            .expect("job table lock poisoned")
            .get(&job_id)
            .cloned()
    }

    /// The original submission for a job, used by its background task.
    pub fn get_snapshot(&self, job_id: Uuid) -> Option<IncidentSnapshot> {
        self.jobs
            .read()
            .expect("job table lock poisoned")
            .get(&job_id)
            .map(|job| job.snapshot.clone())
    }

    /// Remove terminal jobs older than the retention window.
    ///
    /// Queued and processing jobs are retained regardless of age; an
    /// in-flight job must never vanish from polling. Returns the number of
    /// records removed.
    pub fn sweep_expired(&self, retention: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - retention;
        let mut jobs = self.jobs.write().expect("job table lock poisoned");
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status.is_terminal() && job.created_at < cutoff));
        let removed = before - jobs.len();
        if removed > 0 {
            tracing::info!(removed, "retention sweep removed expired jobs");
        }
        removed
    }

    /// Number of jobs still queued or processing.
    pub fn active_count(&self) -> usize {
        self.jobs
            .read()
            .expect("job table lock poisoned")
            .values()
            .filter(|job| !job.status.is_terminal())
            .count()
    }

    /// Total number of jobs currently held, terminal included.
    pub fn total_count(&self) -> usize {
        self.jobs.read().expect("job table lock poisoned").len()
    }
}
