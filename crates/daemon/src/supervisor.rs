// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon supervisor: startup, the jittered main loop, and shutdown. One
//! process per session; runs inside the child launched by
//! [`crate::spawn::ensure_daemon_running`].

use crate::config::Config;
use crate::spawn::SpawnPayload;
use confab_core::redact::identity_redactor;
use confab_core::{ExternalId, StateRecord, SystemClock};
use confab_storage::{is_process_alive, Inbox, SessionPaths, StateStore, StateStoreError};
use confab_sync::{SyncEngine, SyncEngineError};
use confab_transport::{HttpConfig, HttpSyncTransport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("transcript {path} did not appear within {timeout:?}")]
    TranscriptTimeout { path: PathBuf, timeout: Duration },

    #[error("shutdown requested before the transcript appeared")]
    CancelledDuringStartup,

    #[error(transparent)]
    State(#[from] StateStoreError),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

/// What the caller (`main.rs`) should report: the reason shutdown happened,
/// for the one stderr line printed at shutdown.
#[derive(Debug, Clone)]
pub struct SupervisorOutcome {
    pub reason: String,
}

/// Termination signals, installed once at the very start of [`run`] — before
/// any I/O — so a signal arriving during `wait_for_transcript` or the main
/// loop is never missed.
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

impl ShutdownSignals {
    fn install() -> Result<Self, SupervisorError> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate()).map_err(SupervisorError::Signal)?,
            sigint: signal(SignalKind::interrupt()).map_err(SupervisorError::Signal)?,
        })
    }

    async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigterm.recv() => {}
            _ = self.sigint.recv() => {}
        }
    }
}

/// Cancellation handles a caller can use to interrupt a running supervisor
/// without sending a real OS signal — mainly for tests, but also the shape
/// an embedding process would use to ask this session's daemon to stop
/// without going through the inbox+signal protocol.
#[derive(Clone, Default)]
pub struct Lifecycle {
    pub stop: Arc<Notify>,
    pub cancel: CancellationToken,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.cancel.cancel();
        self.stop.notify_waiters();
    }
}

/// Runs the full C1 protocol for one session: wait for the transcript, write
/// state, loop until some termination condition fires, then shut down.
/// Returns `Ok` with the shutdown reason on a graceful exit; `Err` only when
/// a prerequisite could not be acquired.
pub async fn run(payload: SpawnPayload, config: Config) -> Result<SupervisorOutcome, SupervisorError> {
    run_with_lifecycle(payload, config, Lifecycle::new()).await
}

pub async fn run_with_lifecycle(
    payload: SpawnPayload,
    config: Config,
    lifecycle: Lifecycle,
) -> Result<SupervisorOutcome, SupervisorError> {
    let mut signals = ShutdownSignals::install()?;
    let external_id = ExternalId::new(payload.external_id.clone());

    info!(
        external_id = external_id.short(8),
        pid = std::process::id(),
        parent_pid = payload.parent_process_id,
        interval_ms = config.sync_interval.as_millis() as u64,
        "confab-syncd starting"
    );

    wait_for_transcript(
        &payload.transcript_path,
        config.transcript_poll_interval,
        config.transcript_wait_timeout,
        &lifecycle,
        &mut signals,
    )
    .await?;

    let clock = SystemClock;
    let inbox_path = SessionPaths::inbox_path(&external_id)?;
    let record = StateRecord::new(
        external_id.clone(),
        payload.transcript_path.clone(),
        payload.cwd.clone(),
        payload.parent_process_id,
        inbox_path,
        &clock,
    );
    StateStore::save(&record)?;

    // A panicking main loop must still delete the state record before the
    // process exits, so a stale entry doesn't outlive a daemon that crashed
    // mid-cycle. tokio::spawn's JoinHandle gives us this for free: a panic
    // there surfaces as a JoinError rather than
    // unwinding through `run`, so we keep a cheap clone of the record around
    // to clean up with if that happens.
    let record_for_panic_cleanup = record.clone();
    let task = tokio::spawn(main_loop(
        record,
        config.clone(),
        external_id.clone(),
        payload.transcript_path.clone(),
        payload.cwd.clone(),
        lifecycle,
        signals,
    ));

    let (record, engine, reason) = match task.await {
        Ok(outcome) => outcome,
        Err(join_error) => {
            let _ = StateStore::delete(&record_for_panic_cleanup);
            if join_error.is_panic() {
                std::panic::resume_unwind(join_error.into_panic());
            }
            return Err(SupervisorError::CancelledDuringStartup);
        }
    };

    shutdown(&record, &config, engine, &reason).await;
    Ok(SupervisorOutcome { reason })
}

/// Waits for the transcript to exist, polling at a short fixed interval up
/// to a bounded total timeout. Honors cancellation, the stop notifier, and
/// signal receipt the whole time; no state record is written during this
/// wait.
async fn wait_for_transcript(
    path: &Path,
    poll_interval: Duration,
    total_timeout: Duration,
    lifecycle: &Lifecycle,
    signals: &mut ShutdownSignals,
) -> Result<(), SupervisorError> {
    let deadline = tokio::time::Instant::now() + total_timeout;

    loop {
        if path.exists() {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(SupervisorError::TranscriptTimeout {
                path: path.to_path_buf(),
                timeout: total_timeout,
            });
        }

        tokio::select! {
            () = lifecycle.cancel.cancelled() => return Err(SupervisorError::CancelledDuringStartup),
            () = lifecycle.stop.notified() => return Err(SupervisorError::CancelledDuringStartup),
            () = signals.recv() => return Err(SupervisorError::CancelledDuringStartup),
            () = tokio::time::sleep(poll_interval) => {}
        }
    }
}

/// The jittered main loop. Owns the sync
/// engine's lazy initialization and the consecutive-not-found shutdown
/// counter; returns the (possibly session_id-updated) state record, the
/// engine (so shutdown can run one more sync through it), and the reason
/// the loop ended.
async fn main_loop(
    mut record: StateRecord,
    config: Config,
    external_id: ExternalId,
    transcript_path: PathBuf,
    working_dir: PathBuf,
    lifecycle: Lifecycle,
    mut signals: ShutdownSignals,
) -> (StateRecord, Option<SyncEngine>, String) {
    let mut engine: Option<SyncEngine> = None;
    let mut not_found_streak: u32 = 0;
    let mut first_tick = true;

    let reason = loop {
        let delay = if first_tick {
            first_tick = false;
            Duration::ZERO
        } else {
            config.sync_interval + jitter(config.sync_jitter)
        };

        tokio::select! {
            () = lifecycle.cancel.cancelled() => break "context cancelled".to_string(),
            () = lifecycle.stop.notified() => break "stop requested".to_string(),
            () = signals.recv() => break "signal received".to_string(),
            () = tokio::time::sleep(delay) => {}
        }

        if record.parent_process_id > 0 && !is_process_alive(record.parent_process_id) {
            break "parent process exited".to_string();
        }

        if engine.is_none() {
            match lazy_init(&external_id, &transcript_path, &working_dir, &config).await {
                Ok(initialized) => {
                    if let Some(session_id) = initialized.session_id() {
                        if record.session_id.as_deref() != Some(session_id) {
                            record.session_id = Some(session_id.to_string());
                            if let Err(error) = StateStore::save(&record) {
                                warn!(%error, "failed to persist backend session_id");
                            }
                        }
                    }
                    engine = Some(initialized);
                }
                Err(error) if error.is_unauthorized() => {
                    // Discard and retry next tick: it will re-read config,
                    // picking up rotated credentials.
                    warn!(external_id = external_id.short(8), "init unauthorized, will retry");
                }
                Err(error) => {
                    warn!(external_id = external_id.short(8), %error, "lazy init failed");
                }
            }
            continue;
        }

        let Some(active) = engine.as_mut() else {
            continue;
        };
        let outcome = active.sync_all().await;
        match &outcome.first_error {
            Some(error) if error.is_unauthorized() => {
                engine = None;
            }
            Some(error) if error.is_session_not_found() => {
                not_found_streak += 1;
                if not_found_streak >= 3 {
                    break "session deleted".to_string();
                }
            }
            Some(error) => {
                warn!(external_id = external_id.short(8), %error, "sync cycle failed");
            }
            None => {
                if outcome.chunks_uploaded > 0 {
                    not_found_streak = 0;
                }
            }
        }
    };

    (record, engine, reason)
}

/// One attempt at establishing the engine: fresh config (so a rotated API
/// key is picked up), fresh transport, `init` against the backend.
async fn lazy_init(
    external_id: &ExternalId,
    transcript_path: &Path,
    working_dir: &Path,
    base_config: &Config,
) -> Result<SyncEngine, SyncEngineError> {
    let live = Config::load().unwrap_or_else(|_| base_config.clone());
    let transport = Arc::new(HttpSyncTransport::new(HttpConfig {
        base_url: live.backend_base_url,
        api_key: live.api_key,
    }));
    let mut engine = SyncEngine::new(
        transport,
        identity_redactor(),
        external_id.as_str(),
        transcript_path.to_path_buf(),
        working_dir.to_path_buf(),
    )
    .with_max_chunk_bytes(base_config.max_chunk_bytes);
    engine.init().await?;
    Ok(engine)
}

fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    use rand::Rng;
    let bound = max.as_millis().min(u128::from(u64::MAX)) as u64;
    Duration::from_millis(rand::rng().random_range(0..=bound))
}

/// Drains the inbox, runs one final sync bounded by a wall-clock cap, sends
/// the session-end event if one was enqueued, then deletes the inbox and
/// state record.
async fn shutdown(record: &StateRecord, config: &Config, engine: Option<SyncEngine>, reason: &str) {
    info!(external_id = record.external_id.short(8), reason, "confab-syncd shutting down");

    let inbox = Inbox::at(record.inbox_path.clone());
    let events = inbox.drain().unwrap_or_else(|error| {
        warn!(%error, "failed to drain inbox");
        Vec::new()
    });
    let session_end = events
        .into_iter()
        .rev()
        .find_map(|event| match event.kind {
            confab_core::InboxEventKind::SessionEnd { payload } => Some((payload, event.timestamp)),
            confab_core::InboxEventKind::Unknown => None,
        });

    if let Some(mut engine) = engine {
        let final_sync = async {
            let outcome = engine.sync_all().await;
            if let Some(error) = &outcome.first_error {
                warn!(%error, "final sync had errors");
            }
            if let Some((payload, timestamp)) = &session_end {
                if let Err(error) = engine.send_session_end(payload, timestamp).await {
                    warn!(%error, "send_session_end failed");
                }
            }
        };

        tokio::select! {
            () = final_sync => {}
            () = tokio::time::sleep(config.shutdown_timeout) => {
                warn!("final sync exceeded shutdown timeout, skipping remainder");
            }
        }
    }

    if let Err(error) = inbox.delete() {
        warn!(%error, "failed to delete inbox");
    }
    if let Err(error) = StateStore::delete(record) {
        warn!(%error, "failed to delete state record");
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
