// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! confab-sync: the sync engine (C2) and sidechain discoverer (C7).
//!
//! Owns per-file line tracking, chunking, the init/resume handshake, and
//! upload submission against a [`confab_transport::SyncTransport`]. Holds no
//! knowledge of process lifecycle, signals, or the state store — that's
//! `confab-daemon`'s job.

pub mod chunking;
pub mod discoverer;
pub mod engine;
pub mod error;
pub mod reader;

pub use chunking::{ChunkSpan, DEFAULT_MAX_CHUNK_BYTES};
pub use discoverer::discover_sidechain_candidates;
pub use engine::{SyncEngine, SyncOutcome};
pub use error::SyncEngineError;

#[cfg(any(test, feature = "test-support"))]
pub use confab_transport::FakeTransport;
