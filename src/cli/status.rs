//! CLI `status` command. Prints vault and credential state.

use anyhow::Result;
use chrono::Local;

use super::App;
use dbrain::vault::git::redact_credentials;

pub async fn status(app: &App) -> Result<()> {
    let root = app.store.root();
    let today = Local::now().date_naive();
    let today_content = app.store.read_daily(today);
    let recent = app.store.daily_dates();

    println!("d-brain Status");
    println!("{}", "=".repeat(40));
    println!("  Vault:               {}", root.display());
    println!("  Exists:              {}", root.exists());
    println!();

    println!("Git:");
    match &app.vault {
        Some(vault) => {
            println!(
                "  Remote:              {}",
                redact_credentials(&app.config.vault.git_url)
            );
            println!("  Branch:              {}", app.config.vault.git_branch);
            println!(
                "  Token:               {}",
                if app.config.vault.github_token.is_empty() { "(not set)" } else { "set" }
            );
            println!("  Cloned:              {}", root.join(".git").exists());
            println!("  Uncommitted changes: {}", vault.has_local_changes().await);
        }
        None => println!("  (persistence disabled: no VAULT_GIT_URL)"),
    }
    println!();

    println!("Entries:");
    println!("  Today ({today}):    {} chars", today_content.chars().count());
    println!("  Days with entries:   {}", recent.len());
    if let Some(latest) = recent.first() {
        println!("  Latest day:          {latest}");
    }
    println!();

    println!("Services:");
    println!(
        "  LLM ({}):  {}",
        app.config.llm.model,
        if app.config.llm.api_key.is_empty() { "not configured" } else { "configured" }
    );
    println!(
        "  Transcription ({}):  {}",
        app.config.transcription.model,
        if app.config.transcription.api_key.is_empty() { "not configured" } else { "configured" }
    );

    Ok(())
}
