use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Groq API key
    pub groq_api_key: String,

    /// Groq API base URL (OpenAI-compatible)
    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,

    /// Model used for postmortem generation
    #[serde(default = "default_groq_model")]
    pub groq_model: String,

    /// Per-request timeout for the report provider, in seconds
    #[serde(default = "default_groq_timeout_secs")]
    pub groq_timeout_secs: u64,

    /// Number of background analysis workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Capacity of the pending-analysis queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Hours a terminal job is kept before the retention sweep removes it
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,

    /// Seconds between retention sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_groq_timeout_secs() -> u64 {
    60
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_retention_hours() -> i64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
