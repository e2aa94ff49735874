// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known paths for state and inbox files.
//!
//! `CONFAB_CLAUDE_DIR` overrides the host-tool state directory; the sync
//! subsystem always writes under `<that dir>/sync/`.

use crate::state_store::StateStoreError;
use confab_core::ExternalId;
use std::path::PathBuf;

/// Resolves the directory under which state and inbox files live, and
/// derives per-session paths from an `external_id`.
pub struct SessionPaths;

impl SessionPaths {
    /// `CONFAB_CLAUDE_DIR` > `~/.claude` (the host tool's own default),
    /// with a `sync/` subdirectory for this core's files.
    pub fn sync_dir() -> Result<PathBuf, StateStoreError> {
        if let Ok(dir) = std::env::var("CONFAB_CLAUDE_DIR") {
            return Ok(PathBuf::from(dir).join("sync"));
        }
        let home = std::env::var("HOME").map_err(|_| StateStoreError::NoStateDir)?;
        Ok(PathBuf::from(home).join(".claude").join("sync"))
    }

    /// `~/<confab-dir>/sync/<external_id>.json`
    pub fn state_path(external_id: &ExternalId) -> Result<PathBuf, StateStoreError> {
        Ok(Self::sync_dir()?.join(format!("{}.json", external_id.as_str())))
    }

    /// Sibling of the state file, same stem, `.inbox.jsonl` extension.
    pub fn inbox_path(external_id: &ExternalId) -> Result<PathBuf, StateStoreError> {
        Ok(Self::sync_dir()?.join(format!("{}.inbox.jsonl", external_id.as_str())))
    }
}
