// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync engine: per-file line tracking, chunking, the init/resume
//! handshake, and upload submission.

use crate::chunking::{partition_lines, DEFAULT_MAX_CHUNK_BYTES};
use crate::discoverer::discover_sidechain_candidates;
use crate::error::SyncEngineError;
use confab_core::{FileKind, FileTracker, Redactor, SessionEndPayload};
use confab_transport::{ChunkRequest, InitRequest, SessionEndRequest, SyncTransport};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one `sync_all` sweep.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub chunks_uploaded: u64,
    pub first_error: Option<SyncEngineError>,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.first_error.is_none()
    }
}

/// Per-file progress plus the chunks it has produced, keyed by the file's
/// basename.
pub struct SyncEngine {
    transport: Arc<dyn SyncTransport>,
    redactor: Redactor,
    external_id: String,
    transcript_path: PathBuf,
    working_dir: PathBuf,
    max_chunk_bytes: usize,

    initialized: bool,
    session_id: Option<String>,
    trackers: HashMap<String, FileTracker>,
}

impl SyncEngine {
    pub fn new(
        transport: Arc<dyn SyncTransport>,
        redactor: Redactor,
        external_id: impl Into<String>,
        transcript_path: PathBuf,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            transport,
            redactor,
            external_id: external_id.into(),
            transcript_path,
            working_dir,
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            initialized: false,
            session_id: None,
            trackers: HashMap::new(),
        }
    }

    pub fn with_max_chunk_bytes(mut self, max_chunk_bytes: usize) -> Self {
        self.max_chunk_bytes = max_chunk_bytes;
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Telemetry surface: per-file `last_acked_line`.
    pub fn last_acked_line(&self, file_name: &str) -> Option<u64> {
        self.trackers.get(file_name).map(|t| t.last_acked_line)
    }

    /// `POST /sync/init`. Idempotent: a second call on an already-initialized
    /// engine is a no-op.
    pub async fn init(&mut self) -> Result<(), SyncEngineError> {
        if self.initialized {
            return Ok(());
        }

        let request = InitRequest {
            external_id: self.external_id.clone(),
            transcript_path: self.transcript_path.to_string_lossy().into_owned(),
            cwd: self.working_dir.to_string_lossy().into_owned(),
        };
        let response = self.transport.init(&request).await?;

        self.trackers.clear();
        for (file_name, progress) in &response.files {
            let kind = if *file_name == main_file_name(&self.transcript_path) {
                FileKind::Transcript
            } else {
                FileKind::Sidechain
            };
            self.trackers.insert(
                file_name.clone(),
                FileTracker::new(kind, file_name.clone(), progress.last_synced_line),
            );
        }

        info!(session_id = %response.session_id, "sync engine initialized");
        self.session_id = Some(response.session_id);
        self.initialized = true;
        Ok(())
    }

    /// Clears initialization and cached tracker state. The next `init` call
    /// re-reads whatever credentials the caller's transport was built with.
    pub fn reset(&mut self) {
        self.initialized = false;
        self.session_id = None;
        self.trackers.clear();
    }

    /// Lists the main transcript plus any sidechain files that currently
    /// exist on disk.
    fn candidate_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.transcript_path.clone()];
        files.extend(
            discover_sidechain_candidates(&self.transcript_path)
                .into_iter()
                .filter(|p| p.exists()),
        );
        files
    }

    /// One full sweep across the transcript and any known sidechain files.
    pub async fn sync_all(&mut self) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();

        if !self.initialized {
            if let Err(error) = self.init().await {
                outcome.first_error = Some(error);
                return outcome;
            }
        }

        for path in self.candidate_files() {
            match self.sync_file(&path).await {
                Ok(uploaded) => outcome.chunks_uploaded += uploaded,
                Err(error) => {
                    warn!(file = %path.display(), error = %error, "sync cycle failed for file");
                    if outcome.first_error.is_none() {
                        outcome.first_error = Some(error);
                    }
                }
            }
        }

        outcome
    }

    async fn sync_file(&mut self, path: &Path) -> Result<u64, SyncEngineError> {
        let file_name = basename(path);
        let file_kind = if path == self.transcript_path {
            FileKind::Transcript
        } else {
            FileKind::Sidechain
        };

        let start_line = self
            .trackers
            .entry(file_name.clone())
            .or_insert_with(|| FileTracker::new(file_kind, file_name.clone(), 0))
            .next_first_line();

        let raw_lines =
            crate::reader::read_lines_after(path, start_line - 1).map_err(|source| SyncEngineError::Io {
                file_name: file_name.clone(),
                source,
            })?;

        if raw_lines.is_empty() {
            return Ok(0);
        }

        let redactor = Arc::clone(&self.redactor);
        let redacted: Vec<String> = raw_lines
            .into_iter()
            .map(|line| String::from_utf8_lossy(&redactor(&line)).into_owned())
            .collect();

        let spans = partition_lines(&file_name, redacted, start_line, self.max_chunk_bytes)?;

        let session_id = self
            .session_id
            .clone()
            .ok_or(SyncEngineError::NotInitialized)?;

        let mut uploaded = 0u64;
        for span in spans {
            debug!(
                file = %file_name,
                first_line = span.first_line,
                lines = span.lines.len(),
                "uploading chunk"
            );
            let request = ChunkRequest {
                session_id: session_id.clone(),
                file_type: file_kind,
                file_name: file_name.clone(),
                first_line: span.first_line,
                lines: span.lines,
            };
            let response = self.transport.send_chunk(&request).await?;

            // The backend is authoritative; its echoed high-water mark may be
            // lower than ours after a restore.
            let tracker = self
                .trackers
                .get_mut(&file_name)
                .expect("tracker inserted above");
            tracker.advance(response.last_synced_line);
            uploaded += 1;
        }

        Ok(uploaded)
    }

    /// Dedicated POST, called only from shutdown after the final chunk sync
    /// has completed. Failure is logged and swallowed by the caller, not
    /// here, so callers can decide how loud to be about it.
    pub async fn send_session_end(
        &self,
        payload: &SessionEndPayload,
        timestamp: &str,
    ) -> Result<(), SyncEngineError> {
        let session_id = self
            .session_id
            .clone()
            .ok_or(SyncEngineError::NotInitialized)?;
        let value = serde_json::to_value(payload).unwrap_or(serde_json::Value::Null);
        let request = SessionEndRequest {
            payload: &value,
            timestamp,
        };
        self.transport
            .send_session_end(&session_id, &request)
            .await?;
        Ok(())
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn main_file_name(transcript_path: &Path) -> String {
    basename(transcript_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::redact::identity_redactor;
    use confab_transport::fake::FakeTransport;
    use std::io::Write;
    use tempfile::TempDir;

    fn engine_over(dir: &TempDir, transport: Arc<FakeTransport>) -> (SyncEngine, PathBuf) {
        let transcript = dir.path().join("transcript.jsonl");
        std::fs::File::create(&transcript).unwrap();
        let engine = SyncEngine::new(
            transport,
            identity_redactor(),
            "ext-1",
            transcript.clone(),
            dir.path().to_path_buf(),
        );
        (engine, transcript)
    }

    fn append_line(path: &Path, line: &str) {
        let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        writeln!(file, "{line}").unwrap();
    }

    #[tokio::test]
    async fn happy_path_uploads_one_chunk_for_three_lines() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::new("backend-1"));
        let (mut engine, transcript) = engine_over(&dir, Arc::clone(&transport));
        append_line(&transcript, "A");
        append_line(&transcript, "B");
        append_line(&transcript, "C");

        let outcome = engine.sync_all().await;
        assert!(outcome.is_success());
        assert_eq!(outcome.chunks_uploaded, 1);
        let sent = transport.sent_chunks();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].first_line, 1);
        assert_eq!(sent[0].lines, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn second_tick_uploads_only_new_lines() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::new("backend-1"));
        let (mut engine, transcript) = engine_over(&dir, Arc::clone(&transport));
        append_line(&transcript, "A");
        engine.sync_all().await;

        append_line(&transcript, "D");
        let outcome = engine.sync_all().await;
        assert!(outcome.is_success());
        let sent = transport.sent_chunks();
        assert_eq!(sent.last().unwrap().first_line, 2);
        assert_eq!(sent.last().unwrap().lines, vec!["D"]);
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::new("backend-1"));
        let (mut engine, _) = engine_over(&dir, Arc::clone(&transport));
        engine.init().await.unwrap();
        engine.init().await.unwrap();
        assert_eq!(transport.init_calls(), 1);
    }

    #[tokio::test]
    async fn backend_rollback_is_adopted_even_if_lower_than_client_value() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::new("backend-1"));
        let (mut engine, transcript) = engine_over(&dir, Arc::clone(&transport));
        for line in ["L1", "L2", "L3", "L4", "L5", "L6"] {
            append_line(&transcript, line);
        }
        engine.sync_all().await;
        assert_eq!(engine.last_acked_line("transcript.jsonl"), Some(6));

        engine.reset();
        transport.set_resume_line("transcript.jsonl", 3);
        let outcome = engine.sync_all().await;
        assert!(outcome.is_success());
        let sent = transport.sent_chunks();
        let last = sent.last().unwrap();
        assert_eq!(last.first_line, 4);
        assert_eq!(last.lines, vec!["L4", "L5", "L6"]);
    }

    #[tokio::test]
    async fn oversized_line_fails_file_but_not_whole_sweep() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::new("backend-1"));
        let (mut engine, transcript) = engine_over(&dir, Arc::clone(&transport));
        append_line(&transcript, &"x".repeat(DEFAULT_MAX_CHUNK_BYTES + 1));

        let outcome = engine.sync_all().await;
        assert!(matches!(
            outcome.first_error,
            Some(SyncEngineError::LineTooLarge { .. })
        ));
        assert_eq!(outcome.chunks_uploaded, 0);
    }

    #[tokio::test]
    async fn session_not_found_surfaces_through_sync_all() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::new("backend-1"));
        let (mut engine, transcript) = engine_over(&dir, Arc::clone(&transport));
        append_line(&transcript, "A");
        engine.init().await.unwrap();
        transport.fail_next_chunks_with_not_found(1);

        let outcome = engine.sync_all().await;
        assert!(outcome.first_error.as_ref().is_some_and(|e| e.is_session_not_found()));
    }

    #[tokio::test]
    async fn empty_transcript_inits_but_sends_no_chunk() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::new("backend-1"));
        let (mut engine, _) = engine_over(&dir, Arc::clone(&transport));
        let outcome = engine.sync_all().await;
        assert!(outcome.is_success());
        assert_eq!(outcome.chunks_uploaded, 0);
        assert!(engine.is_initialized());
    }

    #[tokio::test]
    async fn send_session_end_requires_init() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::new("backend-1"));
        let (engine, _) = engine_over(&dir, Arc::clone(&transport));
        let payload = SessionEndPayload {
            reason: "user quit".into(),
            transcript_path: "/tmp/t.jsonl".into(),
            extra: serde_json::Map::new(),
        };
        let error = engine
            .send_session_end(&payload, "2026-01-01T00:00:00.000Z")
            .await
            .unwrap_err();
        assert!(matches!(error, SyncEngineError::NotInitialized));
    }
}
