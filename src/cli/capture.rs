//! CLI `note` and `voice` commands.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use super::App;
use dbrain::ingest::{self, IngestError};
use dbrain::transcription::{mime_for_extension, DeepgramTranscriber};

pub fn note(app: &App, text: &str, user_id: i64) -> Result<()> {
    let captured = ingest::save_note(&app.store, user_id, text, Local::now())?;
    println!("✓ Saved to {}", captured.daily_file.display());
    Ok(())
}

pub async fn voice(app: &App, file: &Path, user_id: i64) -> Result<()> {
    let audio = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read audio file {}", file.display()))?;
    let mime = file
        .extension()
        .and_then(|e| e.to_str())
        .map(mime_for_extension)
        .unwrap_or("application/octet-stream");

    let transcriber = DeepgramTranscriber::new(&app.config.transcription)?;

    let pb = super::spinner("Transcribing...");
    let result = ingest::save_voice(
        &app.store,
        &transcriber,
        app.config.retry.policy(),
        user_id,
        &audio,
        mime,
        Local::now(),
    )
    .await;
    pb.finish_and_clear();

    match result {
        Ok(captured) => {
            println!("🎤 {}\n\n✓ Saved", captured.text);
            Ok(())
        }
        Err(IngestError::RateLimited) => {
            println!("⚠️ Too many requests. Please try again a little later.");
            Ok(())
        }
        Err(IngestError::EmptyTranscript) => {
            println!("Could not transcribe audio");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
