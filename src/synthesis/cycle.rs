//! Synthesis followed by persistence: what the `process` and `weekly`
//! commands run.

use chrono::NaiveDate;

use super::{Report, SynthesisWorkflow};
use crate::vault::VaultHandle;

#[derive(Debug)]
pub struct CycleOutcome {
    pub report: Report,
    /// `true` if the vault was committed and pushed, or had nothing to commit
    /// or push.
    /// Always `false` for failed reports and when no vault handle was given.
    pub persisted: bool,
}

/// Process `day` and, if a report came back, commit and push the vault.
pub async fn run_daily_cycle(
    workflow: &SynthesisWorkflow,
    vault: Option<&VaultHandle>,
    day: NaiveDate,
) -> CycleOutcome {
    let report = workflow.process_daily(day).await;
    let message = format!("chore: process daily {}", day.format("%Y-%m-%d"));
    persist(report, vault, message).await
}

/// Generate the weekly digest for the week ending `today` and, if it
/// succeeded, commit and push the summary.
pub async fn run_weekly_cycle(
    workflow: &SynthesisWorkflow,
    vault: Option<&VaultHandle>,
    today: NaiveDate,
) -> CycleOutcome {
    let report = workflow.generate_weekly_at(today).await;
    persist(report, vault, "chore: weekly digest".to_string()).await
}

async fn persist(report: Report, vault: Option<&VaultHandle>, message: String) -> CycleOutcome {
    let persisted = match (report.is_ready(), vault) {
        (true, Some(vault)) => {
            let ok = vault.commit_and_push(message).await;
            if !ok {
                tracing::warn!("vault changes were not pushed this cycle");
            }
            ok
        }
        _ => false,
    };
    CycleOutcome { report, persisted }
}
