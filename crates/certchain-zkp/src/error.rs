//! Errors from commitment encoding and the commitment backends.

use thiserror::Error;

use crate::traits::ProofError;

/// Errors from [`CommitmentBackend`](crate::CommitmentBackend) operations.
#[derive(Error, Debug)]
pub enum CommitmentError {
    /// Metadata contains a field that cannot be canonically encoded.
    #[error("cannot encode commitment input: {0}")]
    Encoding(String),

    /// The commitment was produced by a different backend.
    #[error("commitment scheme mismatch: backend is {backend}, commitment is {commitment}")]
    SchemeMismatch {
        /// Scheme of the backend asked to verify.
        backend: String,
        /// Scheme recorded in the commitment.
        commitment: String,
    },

    /// The proof system could not attest or check the statement.
    #[error(transparent)]
    Proof(#[from] ProofError),
}

impl From<certchain_core::CoreError> for CommitmentError {
    fn from(e: certchain_core::CoreError) -> Self {
        Self::Encoding(e.to_string())
    }
}

impl From<certchain_core::CanonicalizationError> for CommitmentError {
    fn from(e: certchain_core::CanonicalizationError) -> Self {
        Self::Encoding(e.to_string())
    }
}
