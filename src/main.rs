mod cli;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dbrain::config::DbrainConfig;

#[derive(Parser)]
#[command(name = "dbrain", version, about = "Voice notes and text into a git-backed vault, with LLM digests")]
struct Cli {
    /// Config file (default: ~/.dbrain/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clone or pull the vault from its git remote
    Sync,
    /// Summarize one day's entries, then commit and push
    Process {
        /// Day to process (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate the weekly digest and summary file, then commit and push
    Weekly,
    /// Send a free-form request to the assistant
    Ask {
        prompt: String,
        /// Include this user's session entries from today as context
        #[arg(long, default_value_t = 0)]
        user: i64,
    },
    /// Save a text note to today's entries
    Note {
        text: String,
        #[arg(long, default_value_t = 0)]
        user: i64,
    },
    /// Transcribe an audio file and save it to today's entries
    Voice {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        user: i64,
    },
    /// Show vault, git, and credential state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DbrainConfig::load_from(path)?,
        None => DbrainConfig::load()?,
    };

    // Log to stderr so stdout carries only command output.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(vault = %config.resolved_vault_path().display(), "d-brain starting");
    let app = cli::App::new(config);

    match cli.command {
        Command::Sync => cli::sync::sync(&app).await?,
        Command::Process { date } => cli::synthesize::process(&app, date).await?,
        Command::Weekly => cli::synthesize::weekly(&app).await?,
        Command::Ask { prompt, user } => cli::ask::ask(&app, &prompt, user).await?,
        Command::Note { text, user } => cli::capture::note(&app, &text, user)?,
        Command::Voice { file, user } => cli::capture::voice(&app, &file, user).await?,
        Command::Status => cli::status::status(&app).await?,
    }

    Ok(())
}
