// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! confab-syncd: the per-session daemon binary. Spawned detached by
//! `ensure_daemon_running` with a single hidden argument carrying the
//! JSON-serialized session-start payload; takes no other runtime
//! configuration from the command line.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use confab_daemon::config::Config;
use confab_daemon::spawn::SpawnPayload;
use confab_daemon::supervisor;
use confab_storage::SessionPaths;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

/// Maximum log file size before rotation.
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> ExitCode {
    let Some(payload_json) = std::env::args().nth(1) else {
        eprintln!("confab-syncd: missing session payload argument");
        return ExitCode::FAILURE;
    };

    let payload: SpawnPayload = match serde_json::from_str(&payload_json) {
        Ok(payload) => payload,
        Err(error) => {
            eprintln!("confab-syncd: malformed session payload: {error}");
            return ExitCode::FAILURE;
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("confab-syncd: failed to load config: {error}");
            return ExitCode::FAILURE;
        }
    };

    let log_path = match log_path_for(&payload.external_id) {
        Ok(path) => path,
        Err(error) => {
            eprintln!("confab-syncd: failed to resolve log path: {error}");
            return ExitCode::FAILURE;
        }
    };
    rotate_log_if_needed(&log_path);
    let _log_guard = match setup_logging(&log_path, &config.log_level) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("confab-syncd: failed to set up logging: {error}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "confab-syncd: starting (pid {}, external_id {}, interval {}ms)",
        std::process::id(),
        short(&payload.external_id),
        config.sync_interval.as_millis()
    );

    match supervisor::run(payload, config).await {
        Ok(outcome) => {
            eprintln!("confab-syncd: shut down ({})", outcome.reason);
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(%error, "confab-syncd exiting without entering the main loop");
            eprintln!("confab-syncd: {error}");
            ExitCode::FAILURE
        }
    }
}

fn short(s: &str) -> &str {
    s.get(..8).unwrap_or(s)
}

fn log_path_for(external_id: &str) -> Result<PathBuf, confab_storage::StateStoreError> {
    Ok(SessionPaths::sync_dir()?.join(format!("{external_id}.log")))
}

/// Rotates `confab-syncd.log` to `.log.1` once it exceeds [`MAX_LOG_SIZE`].
/// Best-effort: rotation failures are silently ignored so the daemon still
/// starts, and a single session's log rarely grows large enough to matter.
fn rotate_log_if_needed(log_path: &Path) {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return;
    };
    if metadata.len() < MAX_LOG_SIZE {
        return;
    }
    let rotated = log_path.with_extension("log.1");
    let _ = std::fs::rename(log_path, rotated);
}

fn setup_logging(
    log_path: &Path,
    log_level: &str,
) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = log_path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no file name"))?;
    let dir = log_path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no parent"))?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
