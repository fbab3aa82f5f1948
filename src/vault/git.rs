//! Git mirror of the vault directory.
//!
//! [`VaultRepository`] shells out to `git` for clone, pull, commit, and push.
//! Every call is blocking; async callers go through
//! [`VaultHandle`](super::VaultHandle), which runs them on the blocking pool.
//! Nothing here returns an error: subprocess failures are logged with their
//! stderr and reported as `false`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::VaultConfig;

/// Where and as whom to sync.
#[derive(Debug, Clone)]
pub struct RemoteSpec {
    pub url: String,
    pub branch: String,
    pub token: Option<String>,
    pub author_name: String,
    pub author_email: String,
}

impl RemoteSpec {
    pub fn new(url: impl Into<String>, branch: impl Into<String>) -> Self {
        let defaults = VaultConfig::default();
        Self {
            url: url.into(),
            branch: branch.into(),
            token: None,
            author_name: defaults.author_name,
            author_email: defaults.author_email,
        }
    }

    pub fn from_config(config: &VaultConfig) -> Self {
        Self {
            url: config.git_url.clone(),
            branch: config.git_branch.clone(),
            token: Some(config.github_token.clone()).filter(|t| !t.is_empty()),
            author_name: config.author_name.clone(),
            author_email: config.author_email.clone(),
        }
    }

    /// Remote URL with the token injected as `scheme://TOKEN@host/path`.
    ///
    /// Left unchanged when there is no token, the URL has no scheme, or the
    /// URL already carries credentials.
    pub fn authenticated_url(&self) -> String {
        let token = match self.token.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => return self.url.clone(),
        };
        match self.url.split_once("://") {
            Some((scheme, rest)) if !self.url.contains('@') => {
                format!("{scheme}://{token}@{rest}")
            }
            _ => self.url.clone(),
        }
    }

    /// Remote URL safe to log.
    pub fn display_url(&self) -> String {
        redact_credentials(&self.url)
    }

    /// Strip the token and any URL credentials from subprocess diagnostics
    /// before they are logged.
    fn redact(&self, text: &str) -> String {
        let text = match self.token.as_deref() {
            Some(t) if !t.is_empty() => text.replace(t, "***"),
            _ => text.to_string(),
        };
        redact_credentials(&text)
    }
}

static URL_CREDENTIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z0-9+.-]*://)[^/@\s]+@").expect("credential pattern is valid")
});

/// Replace the userinfo part of every URL in `text` with `***`.
pub fn redact_credentials(text: &str) -> String {
    URL_CREDENTIALS.replace_all(text, "${1}***@").into_owned()
}

/// Captured result of one `git` invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub struct VaultRepository {
    path: PathBuf,
}

impl VaultRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_cloned(&self) -> bool {
        self.path.join(".git").exists()
    }

    /// Run `git` with `args` inside the vault directory.
    pub fn run_git(&self, args: &[&str]) -> GitOutput {
        run_git_in(&self.path, args)
    }

    /// Clone the remote if there is no checkout yet, otherwise re-point
    /// `origin` and pull. Then set the local commit identity.
    pub fn ensure_synced(&self, remote: &RemoteSpec) -> bool {
        if remote.url.is_empty() {
            tracing::warn!("no git URL provided, skipping vault sync");
            return false;
        }

        let auth_url = remote.authenticated_url();

        if !self.is_cloned() {
            tracing::info!(url = %remote.display_url(), branch = %remote.branch, "cloning vault");
            if let Err(e) = std::fs::create_dir_all(&self.path) {
                tracing::error!(path = %self.path.display(), error = %e, "failed to create vault directory");
                return false;
            }
            let out = self.run_git(&["clone", "--branch", &remote.branch, &auth_url, "."]);
            if !out.success {
                tracing::error!(stderr = %remote.redact(out.stderr.trim()), "git clone failed");
                return false;
            }
            tracing::info!(path = %self.path.display(), "vault cloned");
            self.configure_identity(remote);
        } else {
            tracing::info!(path = %self.path.display(), "vault already exists, pulling changes");
            let set_url = self.run_git(&["remote", "set-url", "origin", &auth_url]);
            if !set_url.success {
                tracing::warn!(stderr = %remote.redact(set_url.stderr.trim()), "git remote set-url failed");
            }
            // Identity first: reconciling a diverged branch makes a merge commit.
            self.configure_identity(remote);
            let out = self.run_git(&["pull", "--no-rebase", "--no-edit", "origin", &remote.branch]);
            if !out.success {
                tracing::error!(stderr = %remote.redact(out.stderr.trim()), "git pull failed");
                return false;
            }
            tracing::info!("vault updated");
        }

        true
    }

    fn configure_identity(&self, remote: &RemoteSpec) {
        for (key, value) in [
            ("user.name", remote.author_name.as_str()),
            ("user.email", remote.author_email.as_str()),
        ] {
            let out = self.run_git(&["config", key, value]);
            if !out.success {
                tracing::warn!(key, stderr = %out.stderr.trim(), "git config failed");
            }
        }
    }

    /// `true` if the working tree has any tracked or untracked modification.
    pub fn has_local_changes(&self) -> bool {
        let out = self.run_git(&["status", "--porcelain"]);
        if !out.success {
            tracing::warn!(stderr = %out.stderr.trim(), "git status failed");
            return false;
        }
        !out.stdout.trim().is_empty()
    }

    /// Stage everything and commit. Returns `true` only if a commit was made.
    pub fn commit_all(&self, message: &str) -> bool {
        if !self.has_local_changes() {
            tracing::info!("no changes to commit");
            return false;
        }

        let add = self.run_git(&["add", "-A"]);
        if !add.success {
            tracing::error!(stderr = %add.stderr.trim(), "git add failed");
            return false;
        }

        let commit = self.run_git(&["commit", "-m", message]);
        if !commit.success {
            tracing::error!(stderr = %commit.stderr.trim(), "git commit failed");
            return false;
        }

        tracing::info!(commit_message = message, "committed");
        true
    }

    /// Push the current branch to its upstream.
    pub fn push_current(&self) -> bool {
        let out = self.run_git(&["push"]);
        if !out.success {
            tracing::error!(stderr = %out.stderr.trim(), "git push failed");
            return false;
        }
        tracing::info!("pushed to remote");
        true
    }

    /// `true` if the branch has commits its upstream does not. Without an
    /// upstream this is `false`.
    pub fn has_unpushed_commits(&self) -> bool {
        let out = self.run_git(&["rev-list", "--count", "@{upstream}..HEAD"]);
        out.success && out.stdout.trim().parse::<u32>().is_ok_and(|n| n > 0)
    }

    /// Commit and push. Commits left behind by an earlier failed push are
    /// pushed too. Having nothing to commit or push counts as success.
    pub fn commit_and_push(&self, message: &str) -> bool {
        if self.commit_all(message) {
            return self.push_current();
        }
        if self.has_unpushed_commits() {
            tracing::info!("pushing commits from an earlier cycle");
            return self.push_current();
        }
        true
    }
}

fn run_git_in(dir: &Path, args: &[&str]) -> GitOutput {
    let result = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output();

    match result {
        Ok(output) => GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: redact_credentials(&String::from_utf8_lossy(&output.stderr)),
        },
        Err(e) => GitOutput {
            success: false,
            stdout: String::new(),
            stderr: format!("git not available: {e}"),
        },
    }
}
