//! Integration test: full analysis flow against the public library API.
//!
//! Walks a submission through the orchestrator with a stub report generator:
//! job creation, PII sanitization, report finalization, polling, and
//! retention sweeping — no network or external services required.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use postmortem_gen::models::analysis::AnalysisResultResponse;
use postmortem_gen::models::incident::IncidentSnapshot;
use postmortem_gen::models::job::JobStatus;
use postmortem_gen::services::generator::{GeneratorError, ReportGenerator};
use postmortem_gen::services::job_store::JobStore;
use postmortem_gen::services::orchestrator::{Orchestrator, OrchestratorSettings};

struct RecordingGenerator;

#[async_trait]
impl ReportGenerator for RecordingGenerator {
    async fn generate_report(
        &self,
        snapshot: &IncidentSnapshot,
        sanitized_logs: &str,
    ) -> Result<String, GeneratorError> {
        // The trust boundary: raw PII must never reach the provider side.
        assert!(!sanitized_logs.contains("oncall@example.com"));
        assert!(!sanitized_logs.contains("203.0.113.7"));
        Ok(format!(
            "# Postmortem: {}\n\n## Summary\nGenerated from sanitized logs.",
            snapshot.title
        ))
    }
}

fn snapshot_with_pii() -> IncidentSnapshot {
    IncidentSnapshot {
        incident_id: Uuid::new_v4(),
        title: "Gateway 502 storm".to_string(),
        description: "Upstream resets during rollout".to_string(),
        severity: "SEV2".to_string(),
        log_content: concat!(
            "2026-08-06 02:14:07 ERROR upstream reset, reported by oncall@example.com\n",
            "2026-08-06 02:14:09 WARN retry from 203.0.113.7 failed\n",
        )
        .to_string(),
        incident_start_time: Utc::now(),
        created_at: Utc::now(),
        service_name: Some("edge-gateway".to_string()),
        environment: Some("production".to_string()),
        region: Some("eu-west-1".to_string()),
    }
}

fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        worker_count: 2,
        queue_capacity: 16,
        retention: chrono::Duration::hours(24),
        sweep_interval: Duration::from_secs(3600),
    }
}

async fn poll_until_terminal(store: &JobStore, job_id: Uuid) -> AnalysisResultResponse {
    for _ in 0..200 {
        if let Some(job) = store.get(job_id) {
            if job.status.is_terminal() {
                return AnalysisResultResponse::from(&job);
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

#[tokio::test]
async fn submission_to_completed_report() {
    let store = Arc::new(JobStore::new());
    let orchestrator =
        Orchestrator::start(store.clone(), Arc::new(RecordingGenerator), settings());

    let snapshot = snapshot_with_pii();
    let incident_id = snapshot.incident_id;

    // Submit returns immediately; the job is visible as queued or already
    // further along, never absent.
    let job_id = orchestrator.submit(snapshot).await;
    let early = store.get(job_id).expect("job visible right after submit");
    assert!(matches!(
        early.status,
        JobStatus::Queued | JobStatus::Processing | JobStatus::Completed
    ));

    let result = poll_until_terminal(&store, job_id).await;
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.incident_id, incident_id);
    assert_eq!(result.pii_entities_masked, 2);
    assert!(result
        .markdown_report
        .as_deref()
        .expect("report present")
        .contains("Gateway 502 storm"));
    assert!(result.error_message.is_none());
    assert!(result.completed_at.expect("completed_at set") >= result.created_at);
}

#[tokio::test]
async fn polling_unknown_job_reports_absence() {
    let store = JobStore::new();
    assert!(store.get(Uuid::new_v4()).is_none());
}

#[tokio::test]
async fn terminal_jobs_age_out_while_active_jobs_survive() {
    let store = Arc::new(JobStore::new());
    let orchestrator =
        Orchestrator::start(store.clone(), Arc::new(RecordingGenerator), settings());

    let done = orchestrator.submit(snapshot_with_pii()).await;
    poll_until_terminal(&store, done).await;

    // A second job created directly in the store stays queued (never handed
    // to the workers), standing in for an in-flight job of the same age.
    let parked = store.create(snapshot_with_pii());

    let removed = store.sweep_expired(
        chrono::Duration::hours(24),
        Utc::now() + chrono::Duration::hours(25),
    );

    assert_eq!(removed, 1);
    assert!(store.get(done).is_none());
    assert!(store.get(parked).is_some());
}
