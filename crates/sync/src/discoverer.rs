// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sidechain discoverer: scans the main transcript for references to
//! auxiliary files created for subtasks within a session. Re-parses the
//! whole transcript on each call — acceptable at the transcript sizes this
//! core targets.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn sidechain_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"\b[0-9a-f]{8}\b").unwrap()
    })
}

/// An identifier is valid iff it is exactly 8 lowercase-hex characters.
fn is_valid_sidechain_id(candidate: &str) -> bool {
    candidate.len() == 8 && candidate.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

/// Builds the sidechain file name for a discovered identifier: `sidechain-<id>.jsonl`
/// in the same directory as the main transcript.
fn sidechain_path(transcript_path: &Path, id: &str) -> PathBuf {
    let dir = transcript_path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("sidechain-{id}.jsonl"))
}

/// Candidate identifiers embedded as free text in a tool-result block's
/// textual content (e.g. a sub-task summary mentioning the sidechain it ran in).
fn collect_from_text(text: &str, ids: &mut BTreeSet<String>) {
    for candidate in sidechain_id_pattern().find_iter(text) {
        ids.insert(candidate.as_str().to_string());
    }
}

/// Walks a single transcript JSON record (a `user` event) for sidechain
/// identifiers: the well-defined `sidechain_id` field and any nested
/// tool-result blocks.
fn collect_from_record(record: &Value, ids: &mut BTreeSet<String>) {
    if record.get("type").and_then(Value::as_str) != Some("user") {
        return;
    }

    if let Some(id) = record.get("sidechain_id").and_then(Value::as_str) {
        if is_valid_sidechain_id(id) {
            ids.insert(id.to_string());
        }
    }

    let Some(content) = record
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
    else {
        return;
    };

    for block in content {
        if block.get("type").and_then(Value::as_str) != Some("tool_result") {
            continue;
        }
        if let Some(id) = block.get("sidechain_id").and_then(Value::as_str) {
            if is_valid_sidechain_id(id) {
                ids.insert(id.to_string());
            }
        }
        if let Some(text) = block.get("content").and_then(Value::as_str) {
            collect_from_text(text, ids);
        }
    }
}

/// Scans the main transcript and returns candidate sidechain file paths.
/// Malformed lines are skipped, not treated as an error — the daemon must
/// keep discovering sidechains from the rest of the transcript even if one
/// line is truncated or corrupt.
///
/// Returned paths are candidates only; callers (the sync engine) must check
/// existence themselves, since a referenced sidechain file may not have been
/// written yet — missing sidechain files are silently skipped this cycle.
pub fn discover_sidechain_candidates(transcript_path: &Path) -> Vec<PathBuf> {
    let Ok(file) = std::fs::File::open(transcript_path) else {
        return Vec::new();
    };

    let mut ids = BTreeSet::new();
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<Value>(trimmed) else {
            continue;
        };
        collect_from_record(&record, &mut ids);
    }

    ids.iter()
        .map(|id| sidechain_path(transcript_path, id))
        .collect()
}
