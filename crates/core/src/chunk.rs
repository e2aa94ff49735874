// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-file progress tracking and upload chunks.

use serde::{Deserialize, Serialize};

/// Which file a tracker/chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Transcript,
    Sidechain,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Transcript => write!(f, "transcript"),
            FileKind::Sidechain => write!(f, "sidechain"),
        }
    }
}

/// In-memory per-file progress. `last_acked_line` is a 1-based line count,
/// not a byte offset — it is the unit the backend reports progress in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTracker {
    pub file_kind: FileKind,
    pub file_name: String,
    pub last_acked_line: u64,
}

impl FileTracker {
    pub fn new(file_kind: FileKind, file_name: impl Into<String>, last_acked_line: u64) -> Self {
        Self {
            file_kind,
            file_name: file_name.into(),
            last_acked_line,
        }
    }

    /// The line number the next chunk for this file must start at: one
    /// past `last_acked_line` at the moment of send.
    pub fn next_first_line(&self) -> u64 {
        self.last_acked_line + 1
    }

    /// Adopt the backend's reported high-water mark, even if it is lower
    /// than what we last observed (backend rollback/restore).
    pub fn adopt_backend_value(&mut self, last_synced_line: u64) {
        self.last_acked_line = last_synced_line;
    }

    /// Advance after a successfully acknowledged chunk. Never goes backwards
    /// within a daemon lifetime unless the backend itself reports a lower
    /// value, which callers handle via `adopt_backend_value`.
    pub fn advance(&mut self, acknowledged_through: u64) {
        if acknowledged_through > self.last_acked_line {
            self.last_acked_line = acknowledged_through;
        }
    }
}

/// A bounded batch of consecutive lines from a single file, uploaded in one
/// `POST /sync/chunk`. Chunks never straddle files; a zero-line chunk is
/// never constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub session_id: String,
    pub file_type: FileKind,
    pub file_name: String,
    pub first_line: u64,
    pub lines: Vec<String>,
}

impl Chunk {
    pub fn last_line(&self) -> u64 {
        self.first_line + self.lines.len() as u64 - 1
    }
}
