//! Errors for content addressing and the blob store.

use thiserror::Error;

/// Errors from content addressing and blob storage.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Content addressing requires at least one byte.
    #[error("cannot address empty content")]
    EmptyInput,

    /// A content id or locator string was malformed.
    #[error("invalid content id {value:?}: {reason}")]
    InvalidContentId {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Stored bytes no longer hash to the id they were stored under.
    #[error("integrity violation: blob at {path} hashes to {actual}, expected {expected}")]
    IntegrityViolation {
        /// Filesystem path of the corrupted blob.
        path: String,
        /// Content id the blob was stored under.
        expected: String,
        /// Content id recomputed from the stored bytes.
        actual: String,
    },

    /// I/O error from blob store filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
