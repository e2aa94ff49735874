// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! confab-transport: the HTTP backend client.
//!
//! `GET /auth/validate` is part of the wire protocol but is consumed only
//! by the auth collaborator that lives outside this crate, so it is not
//! implemented here.

pub mod client;
pub mod error;
pub mod wire;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use client::{HttpConfig, HttpSyncTransport, SyncTransport};
pub use error::TransportError;
pub use wire::{ChunkRequest, ChunkResponse, FileProgress, InitRequest, InitResponse, SessionEndRequest};

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;
