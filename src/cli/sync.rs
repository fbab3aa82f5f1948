use anyhow::Result;

use super::App;

/// Clone or pull the vault and report what happened.
pub async fn sync(app: &App) -> Result<()> {
    if app.vault.is_none() {
        println!("No VAULT_GIT_URL configured. Persistence is disabled.");
        return Ok(());
    }

    let pb = super::spinner("Syncing vault...");
    let ok = app.sync_vault().await;
    pb.finish_and_clear();

    if ok {
        println!("Vault synced at {}", app.store.root().display());
    } else {
        println!("Vault sync failed; see the log. Working with the local copy.");
    }
    Ok(())
}
