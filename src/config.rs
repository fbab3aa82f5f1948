use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::retry::RetryPolicy;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DbrainConfig {
    pub logging: LoggingConfig,
    pub vault: VaultConfig,
    pub llm: LlmConfig,
    pub transcription: TranscriptionConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VaultConfig {
    pub path: String,
    /// Remote to mirror. Empty disables git persistence.
    pub git_url: String,
    pub git_branch: String,
    pub github_token: String,
    pub author_name: String,
    pub author_email: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Language every report is written in.
    pub language: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub max_retries: u32,
    /// Ceiling for server `Retry-After` hints.
    pub max_delay_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        let path = default_dbrain_dir()
            .join("vault")
            .to_string_lossy()
            .into_owned();
        Self {
            path,
            git_url: String::new(),
            git_branch: "main".into(),
            github_token: String::new(),
            author_name: "d-brain-bot".into(),
            author_email: "bot@d-brain.local".into(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.groq.com/openai/v1/chat/completions".into(),
            model: "llama-3.3-70b-versatile".into(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_secs: 120,
            language: "Russian".into(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.deepgram.com/v1/listen".into(),
            model: "nova-3".into(),
            language: "ru".into(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_retries: 3,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.base_delay_ms), self.max_retries)
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

/// Returns `~/.dbrain/`
pub fn default_dbrain_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dbrain")
}

/// Returns the default config file path: `~/.dbrain/config.toml`
pub fn default_config_path() -> PathBuf {
    default_dbrain_dir().join("config.toml")
}

impl DbrainConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            DbrainConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides. Secrets are usually supplied this way.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DBRAIN_VAULT_PATH") {
            self.vault.path = val;
        }
        if let Ok(val) = std::env::var("VAULT_GIT_URL") {
            self.vault.git_url = val;
        }
        if let Ok(val) = std::env::var("VAULT_GIT_BRANCH") {
            self.vault.git_branch = val;
        }
        if let Ok(val) = std::env::var("GITHUB_TOKEN") {
            self.vault.github_token = val;
        }
        if let Ok(val) = std::env::var("GROQ_API_KEY") {
            self.llm.api_key = val;
        }
        if let Ok(val) = std::env::var("DEEPGRAM_API_KEY") {
            self.transcription.api_key = val;
        }
        if let Ok(val) = std::env::var("DBRAIN_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Resolve the vault path, expanding `~` if needed.
    pub fn resolved_vault_path(&self) -> PathBuf {
        expand_tilde(&self.vault.path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
