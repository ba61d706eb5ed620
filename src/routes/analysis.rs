use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::analysis::{AnalysisJobResponse, AnalysisResultResponse};
use crate::models::incident::IncidentSnapshot;
use crate::models::job::JobStatus;

/// POST /api/v1/analysis/jobs — submit an incident snapshot for analysis.
///
/// Returns 202 with a job id immediately; the analysis runs in the
/// background and its outcome is only observable via polling.
pub async fn submit_analysis_job(
    State(state): State<AppState>,
    Json(snapshot): Json<IncidentSnapshot>,
) -> Result<(StatusCode, Json<AnalysisJobResponse>), (StatusCode, String)> {
    if let Err(report) = snapshot.validate() {
        return Err((StatusCode::BAD_REQUEST, report.to_string()));
    }

    tracing::info!(incident_id = %snapshot.incident_id, "received analysis request");
    let job_id = state.orchestrator.submit(snapshot).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(AnalysisJobResponse {
            job_id,
            status: JobStatus::Queued,
            message: format!(
                "Analysis job queued. Poll /api/v1/analysis/jobs/{} for results.",
                job_id
            ),
        }),
    ))
}

/// GET /api/v1/analysis/jobs/{job_id} — poll job status and result.
pub async fn get_job_result(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<AnalysisResultResponse>, StatusCode> {
    match state.store.get(job_id) {
        Some(job) => Ok(Json(AnalysisResultResponse::from(&job))),
        None => {
            tracing::debug!(job_id = %job_id, "job not found");
            Err(StatusCode::NOT_FOUND)
        }
    }
}
