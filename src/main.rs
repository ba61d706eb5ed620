mod app_state;
mod config;
mod models;
mod routes;
mod services;

use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{
    generator::GroqClient,
    job_store::JobStore,
    orchestrator::{Orchestrator, OrchestratorSettings},
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing postmortem-gen server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_histogram!(
        "analysis_processing_seconds",
        "Time to process an analysis job end to end"
    );
    metrics::describe_counter!("analysis_jobs_total", "Total analysis jobs submitted");
    metrics::describe_counter!("analysis_jobs_completed", "Total analysis jobs completed");
    metrics::describe_counter!("analysis_jobs_failed", "Total analysis jobs that failed");
    metrics::describe_gauge!(
        "analysis_queue_depth",
        "Current number of jobs waiting for a worker"
    );
    metrics::describe_counter!(
        "pii_entities_masked_total",
        "Total PII entities masked before external transmission"
    );

    // Initialize Groq report generator client
    tracing::info!("Initializing Groq report generator client");
    let generator = Arc::new(
        GroqClient::new(
            &config.groq_base_url,
            &config.groq_api_key,
            &config.groq_model,
            Duration::from_secs(config.groq_timeout_secs),
        )
        .expect("Failed to initialize Groq client"),
    );

    // Initialize the in-memory job store and start the worker pool
    let store = Arc::new(JobStore::new());
    let orchestrator = Orchestrator::start(
        store.clone(),
        generator,
        OrchestratorSettings::from_config(&config),
    );

    // Create shared application state
    let state = AppState::new(store, orchestrator);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/api/v1/analysis/jobs",
            post(routes::analysis::submit_analysis_job),
        )
        .route(
            "/api/v1/analysis/jobs/{job_id}",
            get(routes::analysis::get_job_result),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting postmortem-gen on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
