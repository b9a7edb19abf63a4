//! Unified error type for the law-chunker crate.
//!
//! Failures form a closed taxonomy; every kind carries a stable
//! machine-readable reason string for auditability. The core never guesses
//! or best-effort fills evidence data: a fatal failure aborts the whole
//! document's materialization and surfaces with document id, span id and
//! device type attached.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Closed set of failure kinds. `Display` yields the stable reason string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Resolver asked to resolve whitespace-only text.
    EmptyText,
    /// Resolver found zero occurrences within the parent range.
    NotFound,
    /// Resolver found more than one occurrence; no tie-break is permitted.
    Ambiguous,
    /// Child resolution requested without a canonical text.
    NoCanonicalText,
    /// Resolved child offsets escape the parent's structural range.
    ContainmentViolation,
    /// Span id contradicts the literal text prefix.
    AddressMismatch,
    /// Exit invariants failed at the materializer gate.
    ContractViolation,
    /// Stored hash does not match the current canonical text.
    HashMismatch,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureKind::EmptyText => "EMPTY_TEXT",
            FailureKind::NotFound => "NOT_FOUND",
            FailureKind::Ambiguous => "AMBIGUOUS",
            FailureKind::NoCanonicalText => "NO_CANONICAL_TEXT",
            FailureKind::ContainmentViolation => "CONTAINMENT_VIOLATION",
            FailureKind::AddressMismatch => "ADDRESS_MISMATCH",
            FailureKind::ContractViolation => "CONTRACT_VIOLATION",
            FailureKind::HashMismatch => "HASH_MISMATCH",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by chunk materialization.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Offset resolution failed for one chunk; the containing article's
    /// materialization is aborted.
    #[error("{kind} for {document_id}#{span_id} ({device_type}): {detail}")]
    Resolution {
        kind: FailureKind,
        document_id: String,
        span_id: String,
        device_type: String,
        detail: String,
    },

    /// The invariant gate found violations; nothing is emitted.
    #[error("CONTRACT_VIOLATION for {document_id}: {}", .violations.join("; "))]
    Contract {
        document_id: String,
        violations: Vec<String>,
    },

    #[error(transparent)]
    Parse(#[from] law_parser::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChunkError {
    /// Stable machine-readable discriminator.
    pub fn reason(&self) -> &'static str {
        match self {
            ChunkError::Resolution { kind, .. } => kind.as_str(),
            ChunkError::Contract { .. } => FailureKind::ContractViolation.as_str(),
            ChunkError::Parse(e) => e.reason(),
            ChunkError::Json(_) => "JSON",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChunkError>;
