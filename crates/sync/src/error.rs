// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use confab_transport::TransportError;
use thiserror::Error;

/// Errors surfaced by the sync engine. The daemon supervisor pattern-matches
/// on these to decide whether to reset the engine, count towards the
/// not-found shutdown threshold, or just log and retry next tick.
#[derive(Debug, Error)]
pub enum SyncEngineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A single line exceeds the chunk byte budget on its own. The file is
    /// skipped this cycle; progress does not advance.
    #[error("line {line} of {file_name} ({bytes} bytes) exceeds the chunk budget")]
    LineTooLarge {
        file_name: String,
        line: u64,
        bytes: usize,
    },

    #[error("reading {file_name}: {source}")]
    Io {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    /// `send_chunk`/`send_session_end` called before a successful `init`.
    #[error("sync engine used before init")]
    NotInitialized,
}

impl SyncEngineError {
    /// True for the transport's own 401 classification — the daemon resets
    /// the engine on this.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncEngineError::Transport(TransportError::Unauthorized))
    }

    /// True for the transport's own 404 classification — the daemon counts
    /// these towards its consecutive-not-found shutdown threshold.
    pub fn is_session_not_found(&self) -> bool {
        matches!(self, SyncEngineError::Transport(TransportError::SessionNotFound))
    }
}
