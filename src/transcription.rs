//! Speech-to-text via the Deepgram prerecorded `listen` endpoint.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::config::TranscriptionConfig;
use crate::retry::{looks_rate_limited, RetryClassify};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("Deepgram API key is not configured")]
    Unconfigured,

    #[error("Deepgram rate limit exceeded (429): {0}")]
    RateLimited(String),

    #[error("Deepgram API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("transcription transport error: {0}")]
    Transport(String),
}

impl RetryClassify for TranscriptionError {
    fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Api { message, .. } | Self::Transport(message) => looks_rate_limited(message),
            Self::Unconfigured => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl ListenResponse {
    fn into_transcript(self) -> String {
        self.results
            .and_then(|r| r.channels.into_iter().next())
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default()
    }
}

pub struct DeepgramTranscriber {
    http: reqwest::Client,
    api_key: String,
    endpoint: Url,
}

impl DeepgramTranscriber {
    pub fn new(config: &TranscriptionConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse_with_params(
            &config.api_url,
            &[
                ("model", config.model.as_str()),
                ("language", config.language.as_str()),
                ("punctuate", "true"),
                ("smart_format", "true"),
            ],
        )?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint,
        })
    }

    /// Transcribe an audio file's bytes. An empty string means no speech was recognized.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<String, TranscriptionError> {
        if self.api_key.is_empty() {
            return Err(TranscriptionError::Unconfigured);
        }
        tracing::info!(audio_bytes = audio.len(), "starting transcription");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", mime_type)
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(body = %body, "Deepgram rate limit exceeded");
            return Err(TranscriptionError::RateLimited(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ListenResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Transport(format!("invalid listen body: {e}")))?;
        let transcript = parsed.into_transcript();

        tracing::info!(chars = transcript.chars().count(), "transcription complete");
        Ok(transcript)
    }
}

/// Guess an upload content type from a file extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "ogg" | "oga" | "opus" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" | "mp4" => "audio/mp4",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}
