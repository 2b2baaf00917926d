//! Unified error type for the scale core.
//!
//! A record whose handle or magic byte does not match is *not* an error.
//! It decodes with `valid == false` and callers decide whether to trust it.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which of the three notification layouts a payload was decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Person,
    Weight,
    Body,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Person => "person",
            Self::Weight => "weight",
            Self::Body => "body",
        };
        f.write_str(name)
    }
}

/// Top-level error type used across the crate.
#[derive(Debug, Error)]
pub enum ScaleError {
    /// Payload is shorter than the fixed layout of its record type.
    #[error("malformed {kind} payload: need at least {expected} bytes, got {actual}")]
    MalformedPayload {
        kind: RecordKind,
        expected: usize,
        actual: usize,
    },

    /// A weight or body record referenced a person slot that has not been
    /// announced by a person notification yet.
    #[error("no person record for id {0}")]
    UnknownPerson(u8),

    /// The GATT transport reported a failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// An outbound write did not complete in time.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// The shared router lock was poisoned by a panicking holder.
    #[error("lock error")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, ScaleError>;
