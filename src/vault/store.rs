//! Vault file layout.
//!
//! ```text
//! <root>/daily/YYYY-MM-DD.md        accumulated entries for one day
//! <root>/summaries/YYYY-Www-summary.md
//! <root>/.sessions/<user_id>.jsonl  short-term session log
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};

pub const DAILY_DIR: &str = "daily";
pub const SUMMARIES_DIR: &str = "summaries";
pub const SESSIONS_DIR: &str = ".sessions";

#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn daily_file_path(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(DAILY_DIR)
            .join(format!("{}.md", date.format("%Y-%m-%d")))
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.root.join(SUMMARIES_DIR)
    }

    pub(crate) fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIR)
    }

    /// Contents of the day's file, or an empty string if there is none.
    ///
    /// Whitespace-only files read as empty.
    pub fn read_daily(&self, date: NaiveDate) -> String {
        let path = self.daily_file_path(date);
        match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => String::new(),
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read daily file");
                String::new()
            }
        }
    }

    /// Append one entry to the file for `timestamp`'s day, creating it with a
    /// date heading if needed. Returns the file written.
    pub fn append_to_daily(
        &self,
        text: &str,
        timestamp: DateTime<Local>,
        label: &str,
    ) -> Result<PathBuf> {
        let date = timestamp.date_naive();
        let path = self.daily_file_path(date);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let is_new = !path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let mut block = String::new();
        if is_new {
            block.push_str(&format!("# {}\n\n", date.format("%Y-%m-%d")));
        }
        block.push_str(&format!(
            "## {} {}\n\n{}\n\n",
            timestamp.format("%H:%M"),
            label,
            text.trim()
        ));
        file.write_all(block.as_bytes())
            .with_context(|| format!("failed to append to {}", path.display()))?;

        tracing::debug!(path = %path.display(), chars = text.len(), "daily entry appended");
        Ok(path)
    }

    /// Dates that have a daily file, newest first.
    pub fn daily_dates(&self) -> Vec<NaiveDate> {
        let dir = self.root.join(DAILY_DIR);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut dates: Vec<NaiveDate> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name();
                let stem = name.to_str()?.strip_suffix(".md")?;
                NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
            })
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates
    }
}
