//! Analysis job orchestration.
//!
//! `submit` creates the job record and hands its id to a bounded in-process
//! queue; a fixed pool of workers drains the queue and drives each job
//! through sanitize -> generate -> finalize. Excess submissions wait for
//! queue capacity instead of being shed, so acceptance semantics hold even
//! under burst load.
//!
//! Each job runs in its own spawned task whose handle the worker awaits: a
//! panic inside the pipeline surfaces as a `JoinError`, is recorded as that
//! job's failure, and leaves the worker and all other in-flight jobs intact.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::incident::IncidentSnapshot;
use crate::services::generator::ReportGenerator;
use crate::services::job_store::JobStore;
use crate::services::redactor;

/// Tunables for the background execution machinery.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub retention: chrono::Duration,
    pub sweep_interval: std::time::Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            worker_count: config.worker_count,
            queue_capacity: config.queue_capacity,
            retention: chrono::Duration::hours(config.retention_hours),
            sweep_interval: std::time::Duration::from_secs(config.sweep_interval_secs),
        }
    }
}

pub struct Orchestrator {
    store: Arc<JobStore>,
    queue: mpsc::Sender<Uuid>,
}

impl Orchestrator {
    /// Spawn the worker pool and the retention sweeper, returning the handle
    /// used to submit jobs. Workers run until the orchestrator is dropped.
    pub fn start(
        store: Arc<JobStore>,
        generator: Arc<dyn ReportGenerator>,
        settings: OrchestratorSettings,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<Uuid>(settings.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..settings.worker_count {
            tokio::spawn(worker_loop(
                worker_id,
                rx.clone(),
                store.clone(),
                generator.clone(),
            ));
        }

        tokio::spawn(retention_sweeper(
            store.clone(),
            settings.retention,
            settings.sweep_interval,
        ));

        tracing::info!(
            workers = settings.worker_count,
            queue_capacity = settings.queue_capacity,
            "analysis orchestrator started"
        );

        Self { store, queue: tx }
    }

    /// Create a job and schedule its background execution.
    ///
    /// Returns the job id immediately; the outcome is only observable by
    /// polling the job store.
    pub async fn submit(&self, snapshot: IncidentSnapshot) -> Uuid {
        let job_id = self.store.create(snapshot);
        metrics::counter!("analysis_jobs_total").increment(1);
        metrics::gauge!("analysis_queue_depth").increment(1.0);

        if self.queue.send(job_id).await.is_err() {
            // Worker pool is gone (shutdown); the job must not sit queued forever.
            metrics::gauge!("analysis_queue_depth").decrement(1.0);
            self.store
                .mark_failed(job_id, "analysis workers unavailable");
        }

        job_id
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Uuid>>>,
    store: Arc<JobStore>,
    generator: Arc<dyn ReportGenerator>,
) {
    loop {
        let job_id = {
            let mut queue = rx.lock().await;
            queue.recv().await
        };
        let Some(job_id) = job_id else {
            tracing::debug!(worker_id, "worker stopped: queue closed");
            return;
        };
        metrics::gauge!("analysis_queue_depth").decrement(1.0);

        let handle = tokio::spawn(run_job(job_id, store.clone(), generator.clone()));
        if let Err(join_error) = handle.await {
            tracing::error!(worker_id, job_id = %job_id, error = %join_error, "analysis task aborted");
            store.mark_failed(job_id, "internal error: analysis task aborted");
            metrics::counter!("analysis_jobs_failed").increment(1);
        }
    }
}

/// Drive one job from `Processing` to a terminal state. Every failure is
/// captured into the job record; nothing escapes to the worker.
async fn run_job(job_id: Uuid, store: Arc<JobStore>, generator: Arc<dyn ReportGenerator>) {
    let started = Instant::now();
    store.mark_processing(job_id);

    let Some(snapshot) = store.get_snapshot(job_id) else {
        store.mark_failed(job_id, "internal error: job snapshot missing");
        metrics::counter!("analysis_jobs_failed").increment(1);
        return;
    };

    tracing::debug!(job_id = %job_id, "sanitizing log content");
    let sanitization = redactor::sanitize(&snapshot.log_content);

    tracing::debug!(job_id = %job_id, "requesting postmortem report");
    match generator
        .generate_report(&snapshot, &sanitization.sanitized_content)
        .await
    {
        Ok(report) => {
            store.mark_completed(job_id, report, sanitization.total_masked_entities);
            metrics::counter!("analysis_jobs_completed").increment(1);
            metrics::histogram!("analysis_processing_seconds")
                .record(started.elapsed().as_secs_f64());
            tracing::info!(
                job_id = %job_id,
                pii_entities_masked = sanitization.total_masked_entities,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "analysis completed"
            );
        }
        Err(error) => {
            store.mark_failed(job_id, &format!("report generation failed: {error}"));
            metrics::counter!("analysis_jobs_failed").increment(1);
        }
    }
}

async fn retention_sweeper(
    store: Arc<JobStore>,
    retention: chrono::Duration,
    interval: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        store.sweep_expired(retention, chrono::Utc::now());
    }
}
