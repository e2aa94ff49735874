// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

fn parse_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Overrides the default tick interval.
pub fn sync_interval_ms() -> Option<Duration> {
    parse_ms("CONFAB_SYNC_INTERVAL_MS")
}

/// Overrides the jitter upper bound; `0` disables jitter.
pub fn sync_jitter_ms() -> Option<Duration> {
    parse_ms("CONFAB_SYNC_JITTER_MS")
}

/// Overrides the config file location.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("CONFAB_CONFIG_PATH").ok().map(PathBuf::from)
}

/// Direct credential override, ahead of whatever the config file holds —
/// the core only consumes an already-acquired credential, it does not
/// perform the auth flow that would normally rotate this file.
pub fn api_key() -> Option<String> {
    std::env::var("CONFAB_API_KEY").ok()
}

/// Overrides the final-sync wall-clock cap, mainly for tests.
pub fn shutdown_timeout_ms() -> Option<Duration> {
    parse_ms("CONFAB_SHUTDOWN_TIMEOUT_MS")
}

/// Overrides `wait_for_transcript`'s total timeout.
pub fn transcript_wait_timeout_ms() -> Option<Duration> {
    parse_ms("CONFAB_TRANSCRIPT_WAIT_TIMEOUT_MS")
}

/// Overrides `wait_for_transcript`'s poll interval.
pub fn transcript_poll_ms() -> Option<Duration> {
    parse_ms("CONFAB_TRANSCRIPT_POLL_MS")
}

/// Overrides the per-chunk raw-byte budget; the multi-megabyte production
/// default would make realistic tests slow otherwise.
pub fn sync_chunk_bytes() -> Option<usize> {
    std::env::var("CONFAB_SYNC_CHUNK_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
}

/// Overrides where the spawn coordinator looks for the `confab-syncd`
/// binary, mainly for tests that want a stand-in process.
pub fn daemon_binary_path() -> Option<String> {
    std::env::var("CONFAB_DAEMON_BINARY").ok()
}

/// Overrides the regex used to recognize the host-tool process by name when
/// walking the process tree.
pub fn host_process_pattern() -> Option<String> {
    std::env::var("CONFAB_HOST_PROCESS_PATTERN").ok()
}
