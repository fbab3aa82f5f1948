//! Language-model client seam.
//!
//! Provides the [`LlmClient`] trait consumed by the synthesis workflow and a
//! Groq implementation (OpenAI-compatible chat completions). The client is
//! created via [`create_client`] from configuration.

pub mod groq;

use std::time::Duration;

use async_trait::async_trait;

use crate::retry::{looks_rate_limited, RetryClassify};

/// Errors surfaced by an [`LlmClient`].
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No API key configured.
    #[error("LLM API key is not configured")]
    Unconfigured,

    /// The provider answered 429.
    #[error("rate limited (429): {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Any other non-success status.
    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Connection, timeout, or body decoding failure.
    #[error("LLM transport error: {0}")]
    Transport(String),

    /// The response had no completion text.
    #[error("LLM response contained no choices")]
    EmptyResponse,
}

impl RetryClassify for LlmError {
    fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            // Some gateways tunnel rate limits through other statuses.
            Self::Api { message, .. } | Self::Transport(message) => looks_rate_limited(message),
            Self::Unconfigured | Self::EmptyResponse => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// A chat-completion style language model.
///
/// Calls are read-only and safe to repeat, so they may be wrapped in a
/// [`RetryPolicy`](crate::retry::RetryPolicy).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete one system + user exchange and return the model's text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Create the configured LLM client.
///
/// A missing API key is not an error here; the client reports
/// [`LlmError::Unconfigured`] on first use so callers can show guidance.
pub fn create_client(config: &crate::config::LlmConfig) -> anyhow::Result<Box<dyn LlmClient>> {
    let client = groq::GroqClient::new(config)?;
    Ok(Box::new(client))
}
