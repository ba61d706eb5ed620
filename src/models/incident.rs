use std::str::FromStr;

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incident severity levels (PagerDuty/OpsGenie convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Sev1,
    Sev2,
    Sev3,
    Sev4,
    Sev5,
}

/// Full incident snapshot submitted for analysis.
///
/// This is the contract between the incident tooling and this service. The
/// snapshot is copied into the job record at submission and consumed by the
/// background task; it is never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IncidentSnapshot {
    #[garde(skip)]
    pub incident_id: Uuid,

    #[garde(custom(not_blank), length(max = 300))]
    pub title: String,

    #[garde(custom(not_blank), length(max = 10_000))]
    pub description: String,

    /// One of SEV1..SEV5. Unknown values fall back to SEV3 at the point of
    /// use rather than rejecting the submission.
    #[garde(skip)]
    pub severity: String,

    #[garde(custom(not_blank))]
    pub log_content: String,

    #[garde(skip)]
    pub incident_start_time: DateTime<Utc>,

    #[garde(skip)]
    pub created_at: DateTime<Utc>,

    #[garde(length(min = 1, max = 200))]
    pub service_name: Option<String>,

    #[garde(length(min = 1, max = 100))]
    pub environment: Option<String>,

    #[garde(length(min = 1, max = 100))]
    pub region: Option<String>,
}

impl IncidentSnapshot {
    /// Parsed severity, defaulting to SEV3 when the string is not a known level.
    pub fn severity_level(&self) -> Severity {
        Severity::from_str(&self.severity).unwrap_or(Severity::Sev3)
    }
}

fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}
