//! Error handling for VersoDB.
//!
//! This module provides the unified error type and result alias used
//! across all VersoDB components.

use std::io;
use thiserror::Error;

use crate::types::PageKey;

/// Result type alias for VersoDB operations.
pub type VersoResult<T> = Result<T, VersoError>;

/// Errors that can occur in the page-reconstruction engine.
///
/// Invariant violations and capacity overruns indicate internal bugs and
/// abort the enclosing transaction; I/O and codec errors from the
/// persistent tier are propagated verbatim, never retried.
#[derive(Debug, Error)]
pub enum VersoError {
    /// A strategy or cache precondition did not hold.
    #[error("invariant violation: {reason}")]
    InvariantViolation {
        /// What was expected and what was found.
        reason: String,
    },

    /// An insert would push a page past its fixed entry capacity.
    #[error("page {page_key} exceeds its capacity of {capacity} entries")]
    CapacityExceeded {
        /// Page the insert targeted.
        page_key: PageKey,
        /// The fixed per-page entry capacity.
        capacity: usize,
    },

    /// I/O error from the persistent tier.
    #[error("storage I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Encoding a value for the persistent tier failed.
    #[error("failed to serialize: {reason}")]
    Serialization {
        /// Codec failure detail.
        reason: String,
    },

    /// Decoding a value from the persistent tier failed.
    #[error("failed to deserialize: {reason}")]
    Deserialization {
        /// Codec failure detail.
        reason: String,
    },

    /// Operation on a cache or log that was already closed.
    #[error("cache is closed")]
    Closed,
}

impl VersoError {
    /// Creates an invariant-violation error.
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// Creates a capacity-exceeded error.
    pub fn capacity_exceeded(page_key: PageKey, capacity: usize) -> Self {
        Self::CapacityExceeded { page_key, capacity }
    }

    /// Creates a serialization error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    /// Creates a deserialization error.
    pub fn deserialization(reason: impl Into<String>) -> Self {
        Self::Deserialization {
            reason: reason.into(),
        }
    }

    /// Returns true if this error indicates an internal bug rather than an
    /// environmental failure.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation { .. } | Self::CapacityExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = VersoError::invariant("expected a single fragment");
        assert!(err.is_internal());

        let err = VersoError::capacity_exceeded(PageKey::new(7), 512);
        assert!(err.is_internal());
        let msg = format!("{}", err);
        assert!(msg.contains('7'));
        assert!(msg.contains("512"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: VersoError = io_err.into();
        assert!(matches!(err, VersoError::Io { .. }));
        assert!(!err.is_internal());
    }
}
