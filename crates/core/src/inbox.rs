// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox record shape.
//!
//! The inbox is an append-only line-delimited JSON queue. The core only
//! defines one event type, `session_end`; any other `type` value is
//! preserved through `InboxEventKind::Unknown` so a reader can log and skip
//! it instead of failing to parse the whole file.

use serde::{Deserialize, Serialize};

/// Payload of a `session_end` event: reason, transcript path, and whatever
/// extra fields a sender includes are preserved in `extra` rather than dropped,
/// since the core only needs `reason` and `transcript_path` itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEndPayload {
    pub reason: String,
    pub transcript_path: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The one event type the core defines, plus a catch-all for anything a
/// writer enqueues that the core doesn't know about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboxEventKind {
    SessionEnd { payload: SessionEndPayload },
    #[serde(other)]
    Unknown,
}

/// One line of the inbox file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboxEvent {
    #[serde(flatten)]
    pub kind: InboxEventKind,
    pub timestamp: String,
}
