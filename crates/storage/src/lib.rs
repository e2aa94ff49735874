// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! confab-storage: on-disk per-session state records and the inbox queue
//! used to hand shutdown payloads to a live daemon.

pub mod inbox;
pub mod liveness;
pub mod paths;
pub mod state_store;

pub use inbox::{Inbox, InboxError};
pub use liveness::is_process_alive;
pub use paths::SessionPaths;
pub use state_store::{StateStore, StateStoreError};
