//! Daily and weekly synthesis of vault entries through the LLM.
//!
//! [`SynthesisWorkflow`] reads entries from the [`VaultStore`], builds
//! prompts, calls the [`LlmClient`] through a [`RetryPolicy`], and returns a
//! [`Report`]. It never returns an error: every failure becomes
//! [`Report::Failed`]. Committing the results is the job of the cycles in
//! [`cycle`].

pub mod context;
pub mod cycle;
pub mod markdown;
pub mod prompts;
pub mod report;
pub mod summary;

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};

use crate::llm::{LlmClient, LlmError};
use crate::retry::{RetryError, RetryPolicy};
use crate::vault::VaultStore;
use prompts::Prompt;

pub use report::{Failure, Report};

/// Days covered by the weekly digest, today included.
pub const WEEK_DAYS: u64 = 7;

pub struct SynthesisWorkflow {
    store: VaultStore,
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    language: String,
}

impl SynthesisWorkflow {
    pub fn new(
        store: VaultStore,
        llm: Arc<dyn LlmClient>,
        retry: RetryPolicy,
        language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            llm,
            retry,
            language: language.into(),
        }
    }

    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    /// Summarize one day's entries.
    pub async fn process_daily(&self, day: NaiveDate) -> Report {
        let content = self.store.read_daily(day);
        if content.is_empty() {
            let path = self.store.daily_file_path(day);
            tracing::warn!(
                %day,
                path = %path.display(),
                exists = path.exists(),
                "no daily content found"
            );
            return Report::no_content(format!("no entries for {day}"));
        }

        let prompt = prompts::daily(day, &content, &self.language);
        match self.complete(&prompt).await {
            Ok(output) => Report::ready(output),
            Err(failure) => Report::Failed(failure),
        }
    }

    /// Weekly digest for the seven days ending today.
    pub async fn generate_weekly(&self) -> Report {
        self.generate_weekly_at(Local::now().date_naive()).await
    }

    /// Weekly digest for the seven days ending `today`. On success the
    /// summary file for `today`'s ISO week is (re)written.
    pub async fn generate_weekly_at(&self, today: NaiveDate) -> Report {
        let Some(week_content) = self.week_content(today) else {
            return Report::no_content("no entries for the last week");
        };

        let prompt = prompts::weekly(today, &week_content, &self.language);
        let output = match self.complete(&prompt).await {
            Ok(output) => output,
            Err(failure) => return Report::Failed(failure),
        };

        if let Err(e) = summary::write_weekly_summary(&self.store, &output, today) {
            tracing::warn!(error = %format!("{e:#}"), "failed to save weekly summary");
        }

        Report::ready(output)
    }

    /// Non-empty days among the trailing week, newest first, each as
    /// `--- <date> ---\n<content>`, joined by blank lines.
    pub fn week_content(&self, today: NaiveDate) -> Option<String> {
        let blocks: Vec<String> = (0..WEEK_DAYS)
            .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
            .filter_map(|day| {
                let content = self.store.read_daily(day);
                (!content.is_empty()).then(|| format!("--- {day} ---\n{content}"))
            })
            .collect();

        if blocks.is_empty() {
            None
        } else {
            Some(blocks.join("\n\n"))
        }
    }

    /// Run an arbitrary request. A non-zero `user_id` adds today's session
    /// entries for that user to the system prompt.
    pub async fn execute_prompt(&self, request: &str, user_id: i64) -> Report {
        self.execute_prompt_at(request, user_id, Local::now().date_naive())
            .await
    }

    /// [`execute_prompt`](Self::execute_prompt) with `today` fixed.
    pub async fn execute_prompt_at(&self, request: &str, user_id: i64, today: NaiveDate) -> Report {
        let context = self.session_context(user_id, today);
        let prompt = prompts::free_form(
            today,
            &self.store.root().display().to_string(),
            &context,
            request,
            &self.language,
        );
        match self.complete(&prompt).await {
            Ok(output) => Report::ready(output),
            Err(failure) => Report::Failed(failure),
        }
    }

    /// Rendered session block for `user_id` on `date`; empty for user 0.
    pub fn session_context(&self, user_id: i64, date: NaiveDate) -> String {
        if user_id == 0 {
            return String::new();
        }
        let entries = self.store.read_session_entries(user_id, date);
        context::render_session_context(&entries)
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, Failure> {
        let result = self
            .retry
            .run(|| self.llm.complete(&prompt.system, &prompt.user))
            .await;

        match result {
            Ok(output) => Ok(output),
            Err(RetryError::RateLimitExhausted { retries, last }) => {
                Err(Failure::RateLimited { retries, message: last })
            }
            Err(RetryError::Failed(LlmError::Unconfigured)) => {
                tracing::warn!("LLM API key not configured");
                Err(Failure::Unconfigured)
            }
            Err(RetryError::Failed(e)) => {
                tracing::error!(error = %e, "LLM call failed");
                Err(Failure::Other(e.to_string()))
            }
        }
    }
}
