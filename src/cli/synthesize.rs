//! CLI `process` and `weekly` commands.

use anyhow::Result;
use chrono::{Local, NaiveDate};

use super::App;
use dbrain::synthesis::cycle::{run_daily_cycle, run_weekly_cycle, CycleOutcome};

pub async fn process(app: &App, date: Option<NaiveDate>) -> Result<()> {
    let day = date.unwrap_or_else(|| Local::now().date_naive());
    tracing::info!(%day, "process command triggered");

    app.sync_vault().await;
    let workflow = app.workflow()?;

    let pb = super::spinner("Processing entries...");
    let outcome = run_daily_cycle(&workflow, app.vault.as_ref(), day).await;
    pb.finish_and_clear();

    print_outcome(&outcome);
    Ok(())
}

pub async fn weekly(app: &App) -> Result<()> {
    let today = Local::now().date_naive();
    tracing::info!(%today, "weekly digest triggered");

    app.sync_vault().await;
    let workflow = app.workflow()?;

    let pb = super::spinner("Generating weekly digest...");
    let outcome = run_weekly_cycle(&workflow, app.vault.as_ref(), today).await;
    pb.finish_and_clear();

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &CycleOutcome) {
    println!("{}", outcome.report.to_message());
    if outcome.report.is_ready() {
        eprintln!(
            "Processed entries: {} | vault pushed: {}",
            outcome.report.processed_entries(),
            if outcome.persisted { "yes" } else { "no" }
        );
    }
}
