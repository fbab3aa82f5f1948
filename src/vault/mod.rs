//! The document vault: per-day entry files, per-user session logs, generated
//! summaries, and the git mirror that persists them.
//!
//! [`VaultStore`] owns the file layout. [`VaultRepository`] owns git.
//! [`VaultHandle`] is the shared, single-writer handle that async code uses
//! to reach the repository.

pub mod git;
pub mod session;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub use git::{GitOutput, RemoteSpec, VaultRepository};
pub use session::SessionEntry;
pub use store::VaultStore;

/// Shared handle to one vault's git repository.
///
/// Every operation takes the handle's lock on a blocking-pool thread, so at
/// most one git command sequence runs per vault at a time and the async
/// executor never waits on a subprocess. Clone the handle to share it.
#[derive(Clone, Debug)]
pub struct VaultHandle {
    path: Arc<PathBuf>,
    repo: Arc<Mutex<VaultRepository>>,
}

impl VaultHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            repo: Arc::new(Mutex::new(VaultRepository::new(path.clone()))),
            path: Arc::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn ensure_synced(&self, remote: RemoteSpec) -> bool {
        self.blocking("ensure_synced", move |repo| repo.ensure_synced(&remote))
            .await
    }

    pub async fn has_local_changes(&self) -> bool {
        self.blocking("has_local_changes", |repo| repo.has_local_changes())
            .await
    }

    pub async fn commit_all(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.blocking("commit_all", move |repo| repo.commit_all(&message))
            .await
    }

    pub async fn push_current(&self) -> bool {
        self.blocking("push_current", |repo| repo.push_current()).await
    }

    pub async fn commit_and_push(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.blocking("commit_and_push", move |repo| repo.commit_and_push(&message))
            .await
    }

    async fn blocking<F>(&self, op: &'static str, f: F) -> bool
    where
        F: FnOnce(&VaultRepository) -> bool + Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        let result = tokio::task::spawn_blocking(move || {
            // Repository state lives on disk; a poisoned lock is still usable.
            let guard = repo.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&*guard)
        })
        .await;

        match result {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!(op, error = %e, "vault task failed");
                false
            }
        }
    }
}
