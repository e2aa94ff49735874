// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory [`SyncTransport`] double for tests that exercise the sync
//! engine or the daemon without a real HTTP server. Scriptable failures let
//! tests drive scenarios like "the backend reports 404 three times in a
//! row" without wiremock's request/response ceremony.

use crate::client::SyncTransport;
use crate::error::TransportError;
use crate::wire::{ChunkRequest, ChunkResponse, FileProgress, InitRequest, InitResponse, SessionEndRequest};
use async_trait::async_trait;
use confab_core::FileKind;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct FakeState {
    init_calls: u32,
    session_end_calls: u32,
    sent_chunks: Vec<ChunkRequest>,
    last_synced: HashMap<String, u64>,
    pending_not_found: u32,
    pending_unauthorized: u32,
    resume_overrides: HashMap<String, u64>,
}

pub struct FakeTransport {
    session_id: String,
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn init_calls(&self) -> u32 {
        self.state.lock().expect("lock poisoned").init_calls
    }

    pub fn session_end_calls(&self) -> u32 {
        self.state.lock().expect("lock poisoned").session_end_calls
    }

    pub fn sent_chunks(&self) -> Vec<ChunkRequest> {
        self.state.lock().expect("lock poisoned").sent_chunks.clone()
    }

    /// Makes the next `init` call report this file's `last_synced_line` as
    /// the given value, as if the backend rolled back or restored a backup.
    pub fn set_resume_line(&self, file_name: &str, line: u64) {
        self.state
            .lock()
            .expect("lock poisoned")
            .resume_overrides
            .insert(file_name.to_string(), line);
    }

    /// The next `n` `send_chunk` calls fail with `SessionNotFound`.
    pub fn fail_next_chunks_with_not_found(&self, n: u32) {
        self.state.lock().expect("lock poisoned").pending_not_found = n;
    }

    /// The next `n` calls (of any kind) fail with `Unauthorized`.
    pub fn fail_next_with_unauthorized(&self, n: u32) {
        self.state.lock().expect("lock poisoned").pending_unauthorized = n;
    }
}

#[async_trait]
impl SyncTransport for FakeTransport {
    async fn init(&self, _req: &InitRequest) -> Result<InitResponse, TransportError> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.init_calls += 1;
        if state.pending_unauthorized > 0 {
            state.pending_unauthorized -= 1;
            return Err(TransportError::Unauthorized);
        }

        let mut files = HashMap::new();
        for (name, line) in state.last_synced.iter() {
            files.insert(name.clone(), FileProgress { last_synced_line: *line });
        }
        for (name, line) in state.resume_overrides.drain() {
            files.insert(name.clone(), FileProgress { last_synced_line: line });
            state.last_synced.insert(name, line);
        }

        Ok(InitResponse {
            session_id: self.session_id.clone(),
            files,
        })
    }

    async fn send_chunk(&self, req: &ChunkRequest) -> Result<ChunkResponse, TransportError> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.pending_unauthorized > 0 {
            state.pending_unauthorized -= 1;
            return Err(TransportError::Unauthorized);
        }
        if state.pending_not_found > 0 {
            state.pending_not_found -= 1;
            return Err(TransportError::SessionNotFound);
        }

        let last_line = req.first_line + req.lines.len() as u64 - 1;
        state.last_synced.insert(req.file_name.clone(), last_line);
        state.sent_chunks.push(req.clone());
        Ok(ChunkResponse { last_synced_line: last_line })
    }

    async fn send_session_end(
        &self,
        _session_id: &str,
        _req: &SessionEndRequest<'_>,
    ) -> Result<(), TransportError> {
        self.state.lock().expect("lock poisoned").session_end_calls += 1;
        Ok(())
    }
}
