//! Weekly summary files under `summaries/`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

use super::markdown::html_to_markdown;
use crate::vault::VaultStore;

pub const SUMMARY_TYPE: &str = "weekly-summary";

/// ISO week label, e.g. `2026-W07`.
pub fn iso_week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// `<ISO year>-W<ww>-summary.md`
pub fn summary_file_name(date: NaiveDate) -> String {
    format!("{}-summary.md", iso_week_label(date))
}

pub fn summary_path(store: &VaultStore, date: NaiveDate) -> PathBuf {
    store.summaries_dir().join(summary_file_name(date))
}

/// Front matter plus the report converted to markdown.
pub fn render_summary(report_html: &str, date: NaiveDate) -> String {
    format!(
        "---\ndate: {}\ntype: {}\nweek: {}\n---\n\n{}",
        date.format("%Y-%m-%d"),
        SUMMARY_TYPE,
        iso_week_label(date),
        html_to_markdown(report_html)
    )
}

/// Write (or overwrite) the summary for `date`'s ISO week.
pub fn write_weekly_summary(
    store: &VaultStore,
    report_html: &str,
    date: NaiveDate,
) -> Result<PathBuf> {
    let dir = store.summaries_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let path = summary_path(store, date);
    std::fs::write(&path, render_summary(report_html, date))
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), "weekly summary saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn file_name_uses_iso_week() {
        assert_eq!(summary_file_name(date(2026, 2, 12)), "2026-W07-summary.md");
        assert_eq!(summary_file_name(date(2026, 10, 16)), "2026-W42-summary.md");
    }

    #[test]
    fn iso_year_differs_from_calendar_year_at_boundaries() {
        // 2024-12-30 is Monday of ISO week 1 of 2025.
        assert_eq!(summary_file_name(date(2024, 12, 30)), "2025-W01-summary.md");
        // 2021-01-03 is Sunday of ISO week 53 of 2020.
        assert_eq!(summary_file_name(date(2021, 1, 3)), "2020-W53-summary.md");
    }

    #[test]
    fn path_is_under_summaries() {
        let store = VaultStore::new("/vault");
        assert_eq!(
            summary_path(&store, date(2026, 2, 12)),
            PathBuf::from("/vault/summaries/2026-W07-summary.md")
        );
    }

    #[test]
    fn render_has_front_matter_then_markdown() {
        let text = render_summary("<b>Wins</b>: shipped", date(2026, 2, 12));
        assert_eq!(
            text,
            "---\ndate: 2026-02-12\ntype: weekly-summary\nweek: 2026-W07\n---\n\n**Wins**: shipped"
        );
    }

    #[test]
    fn rewrite_overwrites_same_week() {
        let tmp = TempDir::new().unwrap();
        let store = VaultStore::new(tmp.path());

        let first = write_weekly_summary(&store, "first", date(2026, 2, 10)).unwrap();
        let second = write_weekly_summary(&store, "second", date(2026, 2, 12)).unwrap();

        assert_eq!(first, second);
        let content = std::fs::read_to_string(&second).unwrap();
        assert!(content.ends_with("second"));
        assert!(!content.contains("first"));
    }
}
