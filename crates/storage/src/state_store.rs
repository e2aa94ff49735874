// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state store: one JSON file per `external_id`, written atomically,
//! read by any process that needs to know whether a session's daemon is
//! still alive.

use crate::liveness::is_process_alive;
use crate::paths::SessionPaths;
use confab_core::{ExternalId, StateRecord};
use std::fs::File;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed state record: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Reads and writes per-session state records. Single-writer per
/// `external_id` by construction: only the session's own daemon writes
/// after the spawn coordinator's initial write.
pub struct StateStore;

impl StateStore {
    /// Atomic write: serialize to a temp file in the same directory, fsync,
    /// then rename over the final path, with `0600` permissions. Rename is
    /// atomic on POSIX filesystems, so a concurrent reader observes either
    /// the old record or the new one, never a torn write.
    pub fn save(record: &StateRecord) -> Result<(), StateStoreError> {
        let path = SessionPaths::state_path(&record.external_id)?;
        Self::write_atomic(&path, &serde_json::to_vec_pretty(record)?)
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StateStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Returns `Ok(None)` when absent rather than an error — readers are
    /// expected to treat a missing file as "no live daemon".
    pub fn load(external_id: &ExternalId) -> Result<Option<StateRecord>, StateStoreError> {
        let path = SessionPaths::state_path(external_id)?;
        Self::load_path(&path)
    }

    fn load_path(path: &Path) -> Result<Option<StateRecord>, StateStoreError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Idempotent: removing an already-absent file is not an error.
    pub fn delete(record: &StateRecord) -> Result<(), StateStoreError> {
        let path = SessionPaths::state_path(&record.external_id)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// True iff the PID the record references is alive. Does not
    /// distinguish "this process happens to reuse a dead daemon's old PID"
    /// from a genuinely live one — a signal-0 check can't tell the two apart.
    pub fn is_daemon_running(record: &StateRecord) -> bool {
        is_process_alive(record.daemon_process_id)
    }

    /// Enumerates every state record under the sync directory. Used for
    /// status reporting by tools outside the core loop — not called from
    /// the daemon's own lifecycle.
    pub fn list_all() -> Result<Vec<StateRecord>, StateStoreError> {
        let dir = SessionPaths::sync_dir()?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Readers tolerate a missing or freshly-replaced file: another
            // process may delete/rename this entry between readdir and read.
            if let Some(record) = Self::load_path(&path)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
