//! Per-user session log: one JSON object per line in `.sessions/<user_id>.jsonl`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::VaultStore;

/// One logged interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub id: uuid::Uuid,
    pub ts: DateTime<Local>,
    /// Interaction kind, e.g. `"voice"`, `"text"`, `"prompt"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    /// Anything else the caller recorded (duration, message id, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VaultStore {
    pub fn session_file_path(&self, user_id: i64) -> PathBuf {
        self.sessions_dir().join(format!("{user_id}.jsonl"))
    }

    pub fn append_session_entry(
        &self,
        user_id: i64,
        kind: &str,
        text: &str,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Result<SessionEntry> {
        self.append_session_entry_at(user_id, kind, text, extra, Local::now())
    }

    pub fn append_session_entry_at(
        &self,
        user_id: i64,
        kind: &str,
        text: &str,
        extra: serde_json::Map<String, serde_json::Value>,
        ts: DateTime<Local>,
    ) -> Result<SessionEntry> {
        let entry = SessionEntry {
            id: uuid::Uuid::now_v7(),
            ts,
            kind: kind.to_string(),
            text: text.to_string(),
            extra,
        };

        let path = self.session_file_path(user_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        file.write_all(line.as_bytes())?;

        Ok(entry)
    }

    /// Entries for `user_id` logged on `date`, oldest first. Malformed lines are skipped.
    pub fn read_session_entries(&self, user_id: i64, date: NaiveDate) -> Vec<SessionEntry> {
        let path = self.session_file_path(user_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read session log");
                return Vec::new();
            }
        };

        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| match serde_json::from_str::<SessionEntry>(l) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed session line");
                    None
                }
            })
            .filter(|e| e.ts.date_naive() == date)
            .collect()
    }

    pub fn read_today_session_entries(&self, user_id: i64) -> Vec<SessionEntry> {
        self.read_session_entries(user_id, Local::now().date_naive())
    }
}
