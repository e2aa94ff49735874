// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redaction boundary: the core consumes a redactor as a byte-stream
//! transform. Rule configuration lives outside the core; this module only
//! defines the seam the sync engine calls through.

use std::sync::Arc;

/// A pure byte-to-byte transform applied to each line before upload.
/// `Arc<dyn Fn>` rather than a trait object with a named method: the
/// collaborator is a single pure function, not a stateful service.
pub type Redactor = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Redactor that returns its input unchanged. Used where no external
/// redaction configuration is wired up (e.g. unit tests of the sync engine
/// that aren't exercising redaction itself).
pub fn identity_redactor() -> Redactor {
    Arc::new(|line: &[u8]| line.to_vec())
}
