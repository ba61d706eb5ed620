//! Report generation via the Groq chat-completions API (OpenAI-compatible).
//!
//! The orchestrator only depends on the [`ReportGenerator`] trait; the HTTP
//! client behind it enforces its own request timeout so a stuck provider call
//! surfaces as a generator failure instead of holding a worker forever.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::incident::IncidentSnapshot;

const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 4096;

/// Bytes of provider error body kept in failure messages.
const ERROR_BODY_LIMIT: usize = 256;

const SYSTEM_PROMPT: &str = concat!(
    "You are a senior site reliability engineer writing an incident postmortem. ",
    "From the incident context and sanitized log excerpt provided, produce a ",
    "blameless postmortem in markdown with these sections: Summary, Impact, ",
    "Timeline, Root Cause Analysis, Resolution, and Action Items. Ground every ",
    "claim in the supplied logs; where the logs are inconclusive, say so ",
    "explicitly rather than inventing details. Return ONLY the markdown report."
);

/// Boundary to the external report-generation provider.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Produce a markdown postmortem from the incident context and the
    /// already-sanitized log text. Implementations must never receive raw
    /// (unsanitized) log content.
    async fn generate_report(
        &self,
        snapshot: &IncidentSnapshot,
        sanitized_logs: &str,
    ) -> Result<String, GeneratorError>;
}

/// Client for Groq chat completions.
pub struct GroqClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl GroqClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GeneratorError::Http)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ReportGenerator for GroqClient {
    async fn generate_report(
        &self,
        snapshot: &IncidentSnapshot,
        sanitized_logs: &str,
    ) -> Result<String, GeneratorError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_message(snapshot, sanitized_logs),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(GeneratorError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(GeneratorError::Http)?;
        if !status.is_success() {
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let completion: ChatResponse =
            serde_json::from_str(&body).map_err(GeneratorError::Parse)?;

        if let Some(usage) = &completion.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "report generation usage"
            );
        }

        let markdown = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        if markdown.trim().is_empty() {
            return Err(GeneratorError::EmptyCompletion);
        }

        Ok(markdown)
    }
}

/// Assemble the user message from the incident context and sanitized logs.
fn build_user_message(snapshot: &IncidentSnapshot, sanitized_logs: &str) -> String {
    let mut message = String::new();
    let _ = writeln!(message, "Incident: {}", snapshot.title);
    let _ = writeln!(message, "Severity: {}", snapshot.severity_level());
    let _ = writeln!(message, "Description: {}", snapshot.description);
    let _ = writeln!(
        message,
        "Incident start time: {}",
        snapshot.incident_start_time.to_rfc3339()
    );
    if let Some(service) = &snapshot.service_name {
        let _ = writeln!(message, "Service: {}", service);
    }
    if let Some(environment) = &snapshot.environment {
        let _ = writeln!(message, "Environment: {}", environment);
    }
    if let Some(region) = &snapshot.region {
        let _ = writeln!(message, "Region: {}", region);
    }
    let _ = writeln!(message, "\nSanitized incident logs:\n```\n{}\n```", sanitized_logs);
    message
}

fn truncate_body(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("report provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("report provider returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse report provider response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("report provider returned an empty completion")]
    EmptyCompletion,
}
