// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk state record shape.

use crate::clock::Clock;
use crate::ids::ExternalId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One record per `external_id`. Invariants:
/// 1. At most one state record per external_id exists at any time.
/// 2. `daemon_process_id` is the PID of the daemon, not the spawner, and is
///    written before the spawner returns.
/// 3. The record is deleted only by the daemon's own shutdown path, or by a
///    sender that has just discovered the PID is dead ("stale cleanup").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub external_id: ExternalId,
    /// Backend-issued session id. Empty until the engine's first successful
    /// `init` against the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub transcript_path: PathBuf,
    pub working_dir: PathBuf,
    /// 0 disables parent-process monitoring.
    pub parent_process_id: u32,
    /// PID of the daemon process itself, written by the spawn coordinator
    /// immediately after the child starts — never the spawner's own PID.
    pub daemon_process_id: u32,
    /// ISO-8601 with fractional seconds.
    pub started_at: String,
    pub inbox_path: PathBuf,
}

impl StateRecord {
    /// Construct a record prior to spawning. `daemon_process_id` is seeded
    /// with the *current* process's PID as a placeholder only — the spawn
    /// coordinator (C5) overwrites it with the real child PID immediately
    /// after launch, before returning to its caller.
    pub fn new(
        external_id: ExternalId,
        transcript_path: PathBuf,
        working_dir: PathBuf,
        parent_process_id: u32,
        inbox_path: PathBuf,
        clock: &impl Clock,
    ) -> Self {
        Self {
            external_id,
            session_id: None,
            transcript_path,
            working_dir,
            parent_process_id,
            daemon_process_id: std::process::id(),
            started_at: clock.now_iso8601(),
            inbox_path,
        }
    }

    pub fn with_daemon_pid(mut self, pid: u32) -> Self {
        self.daemon_process_id = pid;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}
