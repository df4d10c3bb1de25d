use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity attached to an insight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of model commentary about a record set. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub title: String,
    pub observation: String,
    pub recommendation: String,
    pub risk_level: RiskLevel,
}

/// Reasons an insight request produced nothing.
///
/// These stop at `request_insights`, which logs them and returns an
/// empty list.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("No API key configured for '{0}'")]
    MissingCredential(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("LLM API timeout after {secs}s for provider '{provider}'")]
    Timeout { provider: String, secs: u64 },

    #[error("LLM API request failed for {provider}: {message}")]
    Request { provider: String, message: String },

    #[error("LLM API error: {status} from {provider} - {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("LLM response does not match the insight schema: {0}")]
    Schema(String),
}
