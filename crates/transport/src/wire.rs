// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire request/response bodies.

use confab_core::FileKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct InitRequest {
    pub external_id: String,
    pub transcript_path: String,
    pub cwd: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileProgress {
    pub last_synced_line: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitResponse {
    pub session_id: String,
    #[serde(default)]
    pub files: HashMap<String, FileProgress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkRequest {
    pub session_id: String,
    pub file_type: FileKind,
    pub file_name: String,
    pub first_line: u64,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkResponse {
    pub last_synced_line: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEndRequest<'a> {
    pub payload: &'a serde_json::Value,
    pub timestamp: &'a str,
}
