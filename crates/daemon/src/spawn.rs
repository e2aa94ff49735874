// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn coordinator: the at-most-one-daemon-per-session guarantee, detached
//! child launch, and parent-process discovery. Used by the event-handler
//! layer on session start.

use crate::proctree::discover_parent_process_id;
use confab_core::{ExternalId, StateRecord, SystemClock};
use confab_storage::{SessionPaths, StateStore, StateStoreError};
use serde::{Deserialize, Serialize};
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error(transparent)]
    State(#[from] StateStoreError),

    #[error("failed to launch confab-syncd: {0}")]
    Launch(#[source] std::io::Error),

    #[error("failed to serialize spawn payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The hidden argument passed to the spawned daemon: a single hidden flag
/// carrying the JSON-serialized session-start payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPayload {
    pub external_id: String,
    pub transcript_path: PathBuf,
    pub cwd: PathBuf,
    /// 0 disables parent-process monitoring.
    pub parent_process_id: u32,
}

/// What the caller should take away from a spawn attempt: either a daemon
/// was already live, or a new one was launched (its state record is already
/// on disk by the time this returns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    AlreadyRunning { pid: u32 },
    Spawned { pid: u32 },
}

/// Everything the coordinator needs to know to ensure a session has a daemon.
pub struct SpawnRequest {
    pub external_id: ExternalId,
    pub transcript_path: PathBuf,
    pub working_dir: PathBuf,
}

/// Runs the C5 protocol: load-check, discover parent, launch detached,
/// write state synchronously before returning. This closes the race where a
/// second caller could otherwise observe "no daemon" before the first
/// caller's child has registered itself.
pub fn ensure_daemon_running(request: SpawnRequest) -> Result<SpawnOutcome, SpawnError> {
    if let Some(existing) = StateStore::load(&request.external_id)? {
        if StateStore::is_daemon_running(&existing) {
            return Ok(SpawnOutcome::AlreadyRunning {
                pid: existing.daemon_process_id,
            });
        }
    }

    let parent_process_id = discover_parent_process_id();
    let inbox_path = SessionPaths::inbox_path(&request.external_id)?;

    let payload = SpawnPayload {
        external_id: request.external_id.as_str().to_string(),
        transcript_path: request.transcript_path.clone(),
        cwd: request.working_dir.clone(),
        parent_process_id,
    };
    let payload_json = serde_json::to_string(&payload)?;

    let child = Command::new(daemon_binary_path())
        .arg(&payload_json)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(SpawnError::Launch)?;
    let pid = child.id();
    // Not waited on: the point of this coordinator is to hand the daemon off
    // detached, not to supervise it. Dropping the handle here closes our copy
    // of its stdio descriptors without sending any signal.
    drop(child);

    let clock = SystemClock;
    let record = StateRecord::new(
        request.external_id,
        request.transcript_path,
        request.working_dir,
        parent_process_id,
        inbox_path,
        &clock,
    )
    .with_daemon_pid(pid);
    StateStore::save(&record)?;

    Ok(SpawnOutcome::Spawned { pid })
}

/// `CONFAB_DAEMON_BINARY` override, else a `confab-syncd` sibling of the
/// current executable, else bare `confab-syncd` resolved through `PATH`.
fn daemon_binary_path() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary_path() {
        return PathBuf::from(path);
    }
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let sibling = dir.join("confab-syncd");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("confab-syncd")
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
