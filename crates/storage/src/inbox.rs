// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only inbox: a one-way queue from any sender that wants to pass a
//! payload to the live daemon before signaling it.

use confab_core::{InboxEvent, InboxEventKind};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a session's inbox file. Created lazily on first write; the
/// daemon drains and deletes it once, during shutdown.
pub struct Inbox {
    path: PathBuf,
}

impl Inbox {
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one event, creating the file (and its parent directory) on
    /// first write. POSIX append-mode writes of this size are safe with
    /// concurrent writers.
    pub fn append(&self, event: &InboxEvent) -> Result<(), InboxError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_vec(event).unwrap_or_default();
        line.push(b'\n');
        file.write_all(&line)?;
        Ok(())
    }

    /// Read every well-formed record. A missing file is treated as empty,
    /// not an error. Unknown record types and individual malformed lines are
    /// logged and skipped rather than failing the whole drain.
    pub fn drain(&self) -> Result<Vec<InboxEvent>, InboxError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InboxEvent>(&line) {
                Ok(event) => {
                    if matches!(event.kind, InboxEventKind::Unknown) {
                        warn!(lineno, "inbox: ignoring unknown event type");
                    }
                    events.push(event);
                }
                Err(error) => {
                    warn!(lineno, %error, "inbox: skipping malformed record");
                }
            }
        }
        Ok(events)
    }

    /// Idempotent removal, called by the daemon after draining at shutdown.
    pub fn delete(&self) -> Result<(), InboxError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;
