// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PID liveness check backing `StateStore::is_daemon_running`. A signal-0
//! check suffices on POSIX-like systems.

use nix::sys::signal::kill;
use nix::unistd::Pid;

/// True iff a process with the given PID exists and we're permitted to
/// signal it. `kill(pid, 0)` sends no signal but still validates existence;
/// `ESRCH` means the process is gone, `EPERM` means it exists but is owned
/// by another user (still "alive" for our purposes).
pub fn is_process_alive(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}
