//! Capturing text notes and voice messages into the vault.
//!
//! Each capture is appended to the day's file and logged to the sender's
//! session so free-form prompts can refer back to it.

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::retry::{RetryError, RetryPolicy};
use crate::transcription::{DeepgramTranscriber, TranscriptionError};
use crate::vault::VaultStore;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("too many requests, try again a little later")]
    RateLimited,

    #[error("could not transcribe audio")]
    EmptyTranscript,

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug)]
pub struct Captured {
    pub text: String,
    pub daily_file: PathBuf,
}

/// Store a text note.
pub fn save_note(
    store: &VaultStore,
    user_id: i64,
    text: &str,
    at: DateTime<Local>,
) -> Result<Captured, IngestError> {
    let daily_file = store.append_to_daily(text, at, "[text]")?;
    store.append_session_entry_at(user_id, "text", text, serde_json::Map::new(), at)?;
    tracing::info!(chars = text.chars().count(), "text note saved");
    Ok(Captured {
        text: text.to_string(),
        daily_file,
    })
}

/// Transcribe a voice message (retrying on rate limits) and store the transcript.
pub async fn save_voice(
    store: &VaultStore,
    transcriber: &DeepgramTranscriber,
    retry: RetryPolicy,
    user_id: i64,
    audio: &[u8],
    mime_type: &str,
    at: DateTime<Local>,
) -> Result<Captured, IngestError> {
    let transcript = match retry.run(|| transcriber.transcribe(audio, mime_type)).await {
        Ok(t) => t,
        Err(RetryError::RateLimitExhausted { retries, last }) => {
            tracing::error!(retries, error = %last, "rate limit exceeded during transcription");
            return Err(IngestError::RateLimited);
        }
        Err(RetryError::Failed(e)) => return Err(e.into()),
    };

    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Err(IngestError::EmptyTranscript);
    }

    let daily_file = store.append_to_daily(transcript, at, "[voice]")?;
    let mut extra = serde_json::Map::new();
    extra.insert("audio_bytes".into(), serde_json::json!(audio.len()));
    store.append_session_entry_at(user_id, "voice", transcript, extra, at)?;

    tracing::info!(chars = transcript.chars().count(), "voice message saved");
    Ok(Captured {
        text: transcript.to_string(),
        daily_file,
    })
}
