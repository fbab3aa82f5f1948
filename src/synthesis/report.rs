//! Synthesis results as handed to the presentation layer.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Guidance shown when no LLM key is configured.
pub const UNCONFIGURED_MESSAGE: &str =
    "❌ GROQ_API_KEY is not configured. Add the key to the environment or config.toml.";

/// Why a synthesis produced no report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Nothing to synthesize. Not a fault.
    NoContent(String),
    /// Missing LLM credential.
    Unconfigured,
    /// Every retry hit the rate limiter.
    RateLimited { retries: u32, message: String },
    /// Any other LLM or transport failure.
    Other(String),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoContent(msg) | Self::Other(msg) => f.write_str(msg),
            Self::Unconfigured => f.write_str(UNCONFIGURED_MESSAGE),
            Self::RateLimited { retries, message } => {
                write!(f, "rate limit exceeded after {retries} retries: {message}")
            }
        }
    }
}

/// Outcome of one synthesis entry point.
///
/// Serializes as `{"report": ..., "processed_entries": n}` or
/// `{"error": ..., "processed_entries": 0}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Ready {
        report: String,
        processed_entries: usize,
    },
    Failed(Failure),
}

impl Report {
    pub fn ready(report: impl Into<String>) -> Self {
        Self::Ready {
            report: report.into(),
            processed_entries: 1,
        }
    }

    pub fn no_content(message: impl Into<String>) -> Self {
        Self::Failed(Failure::NoContent(message.into()))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn processed_entries(&self) -> usize {
        match self {
            Self::Ready {
                processed_entries, ..
            } => *processed_entries,
            Self::Failed(_) => 0,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(f) => Some(f),
            Self::Ready { .. } => None,
        }
    }

    /// Text for the user.
    pub fn to_message(&self) -> String {
        match self {
            Self::Ready { report, .. } => report.clone(),
            Self::Failed(Failure::NoContent(msg)) => format!("ℹ️ {msg}"),
            Self::Failed(Failure::Unconfigured) => UNCONFIGURED_MESSAGE.to_string(),
            Self::Failed(Failure::RateLimited { .. }) => {
                "⚠️ Too many requests. Please try again a little later.".to_string()
            }
            Self::Failed(Failure::Other(msg)) => format!("❌ Error: {msg}"),
        }
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Report", 2)?;
        match self {
            Self::Ready {
                report,
                processed_entries,
            } => {
                state.serialize_field("report", report)?;
                state.serialize_field("processed_entries", processed_entries)?;
            }
            Self::Failed(failure) => {
                state.serialize_field("error", &failure.to_string())?;
                state.serialize_field("processed_entries", &0usize)?;
            }
        }
        state.end()
    }
}
