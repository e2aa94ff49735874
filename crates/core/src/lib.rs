// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! confab-core: shared types for the session sync core.
//!
//! Holds only data that crosses crate boundaries (state store, transport,
//! sync engine, daemon supervisor). No I/O and no behavior beyond small
//! invariant-preserving constructors lives here.

pub mod chunk;
pub mod clock;
pub mod ids;
pub mod inbox;
pub mod redact;
pub mod state;

pub use chunk::{Chunk, FileKind, FileTracker};
pub use clock::{Clock, FakeClock, SystemClock};
pub use ids::ExternalId;
pub use inbox::{InboxEvent, InboxEventKind, SessionEndPayload};
pub use redact::Redactor;
pub use state::StateRecord;
