//! Personal knowledge capture backed by a git vault.
//!
//! Voice notes and text are transcribed and appended to per-day files in a
//! local vault that mirrors a git remote. The assistant periodically asks a
//! language model to synthesize those entries into daily and weekly reports,
//! and commits the results back to the remote.
//!
//! # Architecture
//!
//! - **Retries**: every call to a rate-limited service goes through
//!   [`retry::RetryPolicy`] (exponential backoff, rate limits only)
//! - **Vault**: plain files on disk ([`vault::VaultStore`]) mirrored with git
//!   ([`vault::VaultRepository`]), shared through a single-writer
//!   [`vault::VaultHandle`]
//! - **Synthesis**: [`synthesis::SynthesisWorkflow`] turns entries into a
//!   [`synthesis::Report`]; the cycles in [`synthesis::cycle`] commit and push
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`retry`]: Rate-limit classification and exponential backoff
//! - [`vault`]: Vault file layout, session log, and git synchronization
//! - [`llm`]: Language-model client trait and the Groq implementation
//! - [`transcription`]: Deepgram speech-to-text client
//! - [`ingest`]: Saving notes and voice transcripts into the vault
//! - [`synthesis`]: Daily, weekly, and free-form synthesis

pub mod config;
pub mod ingest;
pub mod llm;
pub mod retry;
pub mod synthesis;
pub mod transcription;
pub mod vault;
