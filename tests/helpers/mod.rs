#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use dbrain::llm::{LlmClient, LlmError};
use dbrain::retry::RetryPolicy;
use dbrain::synthesis::SynthesisWorkflow;
use dbrain::vault::{RemoteSpec, VaultStore};

/// Run git in `dir` and panic with its stderr on failure. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git must be installed for these tests");
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.email", "test@test.com"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// A bare remote with one commit on `main`, plus a separate working clone
/// ("upstream") that tests can use to push changes from elsewhere.
pub struct RemoteFixture {
    pub remote: PathBuf,
    pub upstream: PathBuf,
}

impl RemoteFixture {
    pub fn new(base: &Path) -> Self {
        let remote = base.join("remote.git");
        let upstream = base.join("upstream");
        std::fs::create_dir_all(&remote).unwrap();
        std::fs::create_dir_all(&upstream).unwrap();

        git(&remote, &["init", "--bare"]);
        git(&upstream, &["init"]);
        configure_identity(&upstream);
        std::fs::write(upstream.join("README.md"), "# vault\n").unwrap();
        git(&upstream, &["add", "."]);
        git(&upstream, &["commit", "-m", "init"]);
        let remote_str = remote.to_string_lossy().into_owned();
        git(&upstream, &["push", &remote_str, "HEAD:refs/heads/main"]);

        Self { remote, upstream }
    }

    pub fn url(&self) -> String {
        self.remote.to_string_lossy().into_owned()
    }

    pub fn spec(&self) -> RemoteSpec {
        RemoteSpec::new(self.url(), "main")
    }

    /// Commit a file on the remote's `main` from the upstream clone.
    pub fn push_upstream_file(&self, name: &str, content: &str) {
        std::fs::write(self.upstream.join(name), content).unwrap();
        git(&self.upstream, &["add", "."]);
        git(&self.upstream, &["commit", "-m", &format!("add {name}")]);
        git(&self.upstream, &["push", &self.url(), "HEAD:refs/heads/main"]);
    }

    /// Move the bare remote to `to`. Clones still pointing at the old path
    /// can no longer reach it.
    pub fn relocate(&mut self, to: &Path) {
        std::fs::rename(&self.remote, to).unwrap();
        self.remote = to.to_path_buf();
    }

    pub fn main_head(&self) -> String {
        git(&self.remote, &["rev-parse", "main"])
    }

    pub fn main_subject(&self) -> String {
        git(&self.remote, &["log", "-1", "--format=%s", "main"])
    }
}

pub fn commit_count(dir: &Path) -> usize {
    git(dir, &["rev-list", "--count", "HEAD"]).parse().unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(day: NaiveDate, hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .from_local_datetime(&day.and_hms_opt(hour, minute, 0).unwrap())
        .unwrap()
}

type Responder = Box<dyn Fn() -> Result<String, LlmError> + Send + Sync>;

/// Call-counting LLM stand-in that records the last prompt it saw.
pub struct StubLlm {
    respond: Responder,
    calls: AtomicUsize,
    last: Mutex<Option<(String, String)>>,
}

impl StubLlm {
    pub fn new(respond: impl Fn() -> Result<String, LlmError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::new(move || Ok(text.clone()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_system(&self) -> String {
        self.last.lock().unwrap().clone().map(|(s, _)| s).unwrap_or_default()
    }

    pub fn last_user(&self) -> String {
        self.last.lock().unwrap().clone().map(|(_, u)| u).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((system.to_string(), user.to_string()));
        (self.respond)()
    }
}

/// Workflow over `root` with a fast retry policy.
pub fn workflow(root: &Path, llm: Arc<StubLlm>, max_retries: u32) -> SynthesisWorkflow {
    SynthesisWorkflow::new(
        VaultStore::new(root),
        llm,
        RetryPolicy::new(Duration::from_millis(1), max_retries),
        "English",
    )
}
