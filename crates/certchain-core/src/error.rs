//! # Error Types
//!
//! Errors raised by the foundational types. All use `thiserror`.
//! Validation errors name the offending field and value so that an
//! upload can be rejected with an actionable message before any
//! network call is made.

use thiserror::Error;

/// Top-level error type for `certchain-core`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// An identifier failed validation.
    #[error("invalid {kind}: {reason}")]
    InvalidIdentifier {
        /// Identifier kind (e.g. "certificate id", "owner address").
        kind: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A timestamp could not be parsed or was not UTC.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A calendar date field could not be parsed.
    #[error("invalid date in field {field}: {value:?} ({reason})")]
    InvalidDate {
        /// Metadata field name.
        field: &'static str,
        /// The rejected input.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A digest string could not be parsed.
    #[error("invalid digest {value:?}: {reason}")]
    InvalidDigest {
        /// The rejected input.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// A fractional number appeared in data bound for a commitment.
    #[error("fractional number {value} at {pointer} cannot be canonicalized")]
    FloatRejected {
        /// JSON pointer to the value.
        pointer: String,
        value: f64,
    },

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
