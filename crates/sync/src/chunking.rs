// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunk partitioning: splitting tailed lines into bounded upload batches.

use crate::error::SyncEngineError;

/// Default maximum raw line bytes per chunk, before compression. Overridable
/// via `*_SYNC_CHUNK_BYTES`.
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 14 * 1024 * 1024;

/// A contiguous run of lines destined for one `POST /sync/chunk`.
pub struct ChunkSpan {
    pub first_line: u64,
    pub lines: Vec<String>,
}

/// Splits `lines` (the first of which is line number `start_line`) into
/// chunks that never exceed `max_bytes` of raw line content. A chunk is
/// never started with a single line that alone exceeds the budget — that
/// fails the whole file for this cycle.
pub fn partition_lines(
    file_name: &str,
    lines: Vec<String>,
    start_line: u64,
    max_bytes: usize,
) -> Result<Vec<ChunkSpan>, SyncEngineError> {
    let mut spans = Vec::new();
    let mut current = Vec::new();
    let mut current_bytes = 0usize;
    let mut current_first = start_line;
    let mut line_no = start_line;

    for line in lines {
        let line_bytes = line.len();
        if line_bytes > max_bytes {
            return Err(SyncEngineError::LineTooLarge {
                file_name: file_name.to_string(),
                line: line_no,
                bytes: line_bytes,
            });
        }

        if !current.is_empty() && current_bytes + line_bytes > max_bytes {
            spans.push(ChunkSpan {
                first_line: current_first,
                lines: std::mem::take(&mut current),
            });
            current_bytes = 0;
            current_first = line_no;
        }

        current_bytes += line_bytes;
        current.push(line);
        line_no += 1;
    }

    if !current.is_empty() {
        spans.push(ChunkSpan {
            first_line: current_first,
            lines: current,
        });
    }

    Ok(spans)
}
