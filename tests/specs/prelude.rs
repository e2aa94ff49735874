//! Test harness for confab-syncd behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

pub const POLL_INTERVAL_MS: u64 = 20;

/// Resolves the confab-syncd binary, built alongside this test binary.
fn binary_path() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug/confab-syncd");
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("confab-syncd");
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

/// A confab-syncd session running against an isolated `CONFAB_CLAUDE_DIR`
/// and a caller-supplied backend base URL.
pub struct Daemon {
    dir: tempfile::TempDir,
    config_path: PathBuf,
    backend_base_url: String,
    child: Child,
}

pub struct DaemonConfig {
    pub external_id: String,
    pub backend_base_url: String,
    pub api_key: String,
    pub sync_interval_ms: u64,
    pub sync_jitter_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub transcript_wait_timeout_ms: u64,
    pub transcript_poll_ms: u64,
}

impl DaemonConfig {
    pub fn new(external_id: &str, backend_base_url: &str) -> Self {
        Self {
            external_id: external_id.to_string(),
            backend_base_url: backend_base_url.to_string(),
            api_key: "test-key".to_string(),
            sync_interval_ms: 20,
            sync_jitter_ms: 0,
            shutdown_timeout_ms: 2_000,
            transcript_wait_timeout_ms: 2_000,
            transcript_poll_ms: 10,
        }
    }

    pub fn shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.shutdown_timeout_ms = ms;
        self
    }
}

impl Daemon {
    /// Writes `config.toml` and a transcript with the given lines already
    /// present, then spawns confab-syncd with the session-start payload.
    pub fn spawn(config: DaemonConfig, transcript_lines: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let claude_dir = dir.path().join("claude");
        std::fs::create_dir_all(&claude_dir).unwrap();

        let config_path = claude_dir.join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "backend_base_url = \"{}\"", config.backend_base_url).unwrap();
        writeln!(file, "api_key = \"{}\"", config.api_key).unwrap();

        let transcript_path = dir.path().join("transcript.jsonl");
        if !transcript_lines.is_empty() {
            let mut body = transcript_lines.join("\n");
            body.push('\n');
            std::fs::write(&transcript_path, body).unwrap();
        }

        let payload = serde_json::json!({
            "external_id": config.external_id,
            "transcript_path": transcript_path,
            "cwd": dir.path(),
            "parent_process_id": 0,
        });

        let child = Command::new(binary_path())
            .arg(payload.to_string())
            .env("CONFAB_CLAUDE_DIR", &claude_dir)
            .env("CONFAB_SYNC_INTERVAL_MS", config.sync_interval_ms.to_string())
            .env("CONFAB_SYNC_JITTER_MS", config.sync_jitter_ms.to_string())
            .env("CONFAB_SHUTDOWN_TIMEOUT_MS", config.shutdown_timeout_ms.to_string())
            .env(
                "CONFAB_TRANSCRIPT_WAIT_TIMEOUT_MS",
                config.transcript_wait_timeout_ms.to_string(),
            )
            .env("CONFAB_TRANSCRIPT_POLL_MS", config.transcript_poll_ms.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .expect("confab-syncd should spawn");

        Self {
            dir,
            config_path,
            backend_base_url: config.backend_base_url,
            child,
        }
    }

    /// Rewrites `config.toml` with a new API key, leaving the backend URL
    /// alone. `lazy_init` reloads this file on every attempt, so a daemon
    /// stuck on an unauthorized engine picks this up on its next tick.
    pub fn update_api_key(&self, api_key: &str) {
        let mut file = std::fs::File::create(&self.config_path).unwrap();
        writeln!(file, "backend_base_url = \"{}\"", self.backend_base_url).unwrap();
        writeln!(file, "api_key = \"{api_key}\"").unwrap();
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.dir.path().join("transcript.jsonl")
    }

    pub fn append_transcript_line(&self, line: &str) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(self.transcript_path())
            .unwrap();
        writeln!(file, "{line}").unwrap();
    }

    pub fn state_path(&self, external_id: &str) -> PathBuf {
        self.dir.path().join("claude").join("sync").join(format!("{external_id}.json"))
    }

    pub fn inbox_path(&self, external_id: &str) -> PathBuf {
        self.dir
            .path()
            .join("claude")
            .join("sync")
            .join(format!("{external_id}.inbox.jsonl"))
    }

    /// Sends SIGTERM, matching how the event-handler layer would request a
    /// graceful shutdown out of process.
    pub fn request_shutdown(&self) {
        let _ = Command::new("kill")
            .args(["-TERM", &self.child.id().to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }

    /// Waits for the process to exit, polling rather than blocking forever
    /// so a hung daemon fails the test instead of the test run.
    pub fn wait_for_exit(&mut self, timeout: Duration) -> Option<i32> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(Some(status)) = self.child.try_wait() {
                return status.code();
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
        }
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Polls `condition` until it's true or `timeout_ms` elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
    false
}

/// Async counterpart of [`wait_for`], for conditions backed by an async
/// call such as `MockServer::received_requests`.
pub async fn wait_for_async<F, Fut>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
    false
}
