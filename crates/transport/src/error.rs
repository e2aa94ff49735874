// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed error taxonomy. The transport classifies HTTP responses; it never
//! retries — the daemon's tick is the only retry loop, so retry happens as
//! loop cadence, not as a decorator around a single call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// 401. The supervisor resets the engine and re-reads credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// 404 on a session-scoped endpoint. Consumed by the not-found counter.
    #[error("session not found")]
    SessionNotFound,

    /// 409. Consumed by the (out-of-scope) outbound-link path as "already linked".
    #[error("conflict")]
    Conflict,

    /// 400. Non-retryable for this payload; the engine does not advance
    /// progress, so a later cycle retries with the same `first_line`.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 5xx, network errors, or timeouts. Retried on the next daemon tick.
    #[error("transient error: {0}")]
    Transient(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Transient(_))
    }
}
