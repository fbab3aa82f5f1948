pub mod ask;
pub mod capture;
pub mod status;
pub mod synthesize;
pub mod sync;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use dbrain::config::DbrainConfig;
use dbrain::llm;
use dbrain::synthesis::SynthesisWorkflow;
use dbrain::vault::{RemoteSpec, VaultHandle, VaultStore};

/// Everything a command needs, built once from config.
pub struct App {
    pub config: DbrainConfig,
    pub store: VaultStore,
    /// `None` when no git remote is configured.
    pub vault: Option<VaultHandle>,
}

impl App {
    pub fn new(config: DbrainConfig) -> Self {
        let root = config.resolved_vault_path();
        let vault = if config.vault.git_url.is_empty() {
            tracing::warn!("no vault git URL configured, persistence is disabled");
            None
        } else {
            Some(VaultHandle::new(root.clone()))
        };
        Self {
            store: VaultStore::new(root),
            vault,
            config,
        }
    }

    /// Pull (or clone) the vault before doing work. A failed sync is logged
    /// and the command continues with whatever is on disk.
    pub async fn sync_vault(&self) -> bool {
        let Some(vault) = &self.vault else {
            return false;
        };
        let remote = RemoteSpec::from_config(&self.config.vault);
        tracing::info!(url = %remote.display_url(), "syncing vault");
        let ok = vault.ensure_synced(remote).await;
        if !ok {
            tracing::error!("failed to sync vault, continuing with local copy");
        }
        ok
    }

    pub fn workflow(&self) -> Result<SynthesisWorkflow> {
        let client = llm::create_client(&self.config.llm)?;
        Ok(SynthesisWorkflow::new(
            self.store.clone(),
            Arc::from(client),
            self.config.retry.policy(),
            self.config.llm.language.clone(),
        ))
    }
}

/// Stderr spinner shown while a slow call is in flight.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
