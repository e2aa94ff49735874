// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parent-process discovery for the spawn coordinator: walk up to two
//! process-tree levels looking for the host tool by name.

use regex::Regex;
use std::sync::OnceLock;

/// Matches the host tool's process name. Word-bounded so, e.g., a shell
/// script named `claude-wrapper.sh` doesn't falsely match `claude`.
const DEFAULT_HOST_PROCESS_PATTERN: &str = r"\bclaude\b";

const MAX_LEVELS: u32 = 2;

fn default_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(DEFAULT_HOST_PROCESS_PATTERN).unwrap()
    })
}

fn pattern() -> Regex {
    match crate::env::host_process_pattern() {
        Some(custom) => Regex::new(&custom).unwrap_or_else(|_| default_pattern().clone()),
        None => default_pattern().clone(),
    }
}

/// Reads `PPid` out of `/proc/<pid>/stat`. The comm field (second, parenthesized)
/// may itself contain spaces or parens, so fields are read from the end.
fn read_ppid(pid: u32) -> Option<u32> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let after_comm = stat.rfind(')')?;
    let rest = stat.get(after_comm + 2..)?;
    let mut fields = rest.split_whitespace();
    fields.next()?; // state
    fields.next()?.parse().ok()
}

fn read_comm(pid: u32) -> Option<String> {
    std::fs::read_to_string(format!("/proc/{pid}/comm"))
        .ok()
        .map(|s| s.trim().to_string())
}

/// Walks the parent, then grandparent, of the current process looking for
/// one whose name matches the host-tool pattern. Returns 0 (disables parent
/// monitoring) if neither level matches or `/proc` can't be read.
pub fn discover_parent_process_id() -> u32 {
    let pattern = pattern();
    let mut pid = std::process::id();

    for _ in 0..MAX_LEVELS {
        let Some(ppid) = read_ppid(pid) else {
            return 0;
        };
        if ppid == 0 {
            return 0;
        }
        if let Some(name) = read_comm(ppid) {
            if pattern.is_match(&name) {
                return ppid;
            }
        }
        pid = ppid;
    }

    0
}
