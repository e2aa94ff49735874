// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-based tailing of append-only transcript/sidechain files. Progress is
//! tracked by line number, not byte offset, so a cycle re-scans the file
//! from the start to count lines. The host tool's files are small enough at
//! the sizes this core targets for that to be cheap; the sidechain
//! discoverer makes the same tradeoff.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Minimum per-line read buffer, tolerant of very large lines. `BufReader`'s
/// capacity is only a starting hint — `read_until` grows its buffer as
/// needed regardless — but sizing it here avoids repeated reallocation for
/// the common case.
const MIN_LINE_BUFFER_BYTES: usize = 10 * 1024 * 1024;

/// Reads every complete line after `from_line` (1-based, 0 = from the start).
/// An incomplete trailing line (the host tool mid-write) is left for the next
/// cycle. If the file currently has fewer lines than `from_line` — the host
/// tool truncated it — this simply returns no lines; it does not error.
pub fn read_lines_after(path: &Path, from_line: u64) -> std::io::Result<Vec<Vec<u8>>> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(MIN_LINE_BUFFER_BYTES, file);

    let mut collected = Vec::new();
    let mut buf = Vec::new();
    let mut line_no: u64 = 0;

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') {
            break;
        }
        line_no += 1;
        if line_no <= from_line {
            continue;
        }
        let mut content = buf.clone();
        content.pop(); // trailing '\n'
        if content.last() == Some(&b'\r') {
            content.pop();
        }
        collected.push(content);
    }

    Ok(collected)
}
