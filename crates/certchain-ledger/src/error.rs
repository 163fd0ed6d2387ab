//! Errors from ledger operations.

use thiserror::Error;

/// Errors from [`LedgerAnchor`](crate::LedgerAnchor) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Transport failure: the ledger could not be reached or answered
    /// with a server error. Retryable.
    #[error("ledger {ledger} unavailable: {reason}")]
    Unavailable {
        /// Ledger identifier.
        ledger: String,
        /// Failure reason.
        reason: String,
    },

    /// The ledger refused the request. Not retryable.
    #[error("ledger {ledger} rejected request: {reason}")]
    Rejected {
        /// Ledger identifier.
        ledger: String,
        /// Refusal reason.
        reason: String,
    },

    /// The ledger answered with something that is not a valid response.
    #[error("ledger {ledger} protocol error: {reason}")]
    Protocol {
        /// Ledger identifier.
        ledger: String,
        /// What was wrong with the response.
        reason: String,
    },
}

impl LedgerError {
    /// Whether the caller should retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
