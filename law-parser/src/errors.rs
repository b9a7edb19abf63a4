use thiserror::Error;

/// Errors produced while extracting spans from a document.
#[derive(Debug, Error)]
pub enum Error {
    /// A child span landed outside its parent's structural range. This is a
    /// pattern/ordering bug, never valid input; extraction must abort.
    #[error(
        "CONTAINMENT_VIOLATION: span {span_id} [{start}..{end}) escapes parent {parent_id} [{parent_start}..{parent_end})"
    )]
    ContainmentViolation {
        span_id: String,
        parent_id: String,
        start: usize,
        end: usize,
        parent_start: usize,
        parent_end: usize,
    },

    /// A span's id contradicts the literal prefix of its text (strict mode).
    #[error("ADDRESS_MISMATCH: span {span_id} declares '{expected}' but text starts with '{actual}'")]
    AddressMismatch {
        span_id: String,
        expected: String,
        actual: String,
    },
}

impl Error {
    /// Stable machine-readable discriminator for audit logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::ContainmentViolation { .. } => "CONTAINMENT_VIOLATION",
            Error::AddressMismatch { .. } => "ADDRESS_MISMATCH",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
