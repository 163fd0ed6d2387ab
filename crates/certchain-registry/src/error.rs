//! # Registry Errors
//!
//! Every failure is assigned an [`ErrorClass`]. The class decides whether
//! a caller may retry and what a user is told:
//!
//! | Class | Retry | User message |
//! |-------|-------|--------------|
//! | `Input` | never | the validation message |
//! | `Transient` | bounded backoff | "try again later" |
//! | `Integrity` | never | "could not verify" |
//! | `Consistency` | never | "could not verify" |
//! | `NotFound` / `Unauthorized` / `Lifecycle` | never | specific message |

use certchain_core::{CertificateId, CoreError, OwnerAddress};
use certchain_crypto::CryptoError;
use certchain_ledger::LedgerError;
use certchain_state::{CertificateState, LifecycleError};
use certchain_zkp::CommitmentError;
use thiserror::Error;

/// Coarse classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Rejected before any network call.
    Input,
    /// Infrastructure hiccup; retry later.
    Transient,
    /// Local data does not match what was committed.
    Integrity,
    /// The ledger lost or contradicts a published commitment.
    Consistency,
    /// No such certificate.
    NotFound,
    /// Caller does not own the certificate.
    Unauthorized,
    /// Operation not allowed in the certificate's current state.
    Lifecycle,
}

/// Errors from registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Invalid upload or request data.
    #[error("invalid input: {0}")]
    Input(String),

    /// No record with this id.
    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    /// The session address does not own the record.
    #[error("address {address} does not own certificate {id}")]
    Unauthorized {
        /// Certificate id.
        id: CertificateId,
        /// Address that attempted the operation.
        address: OwnerAddress,
    },

    /// The record has not been published yet.
    #[error("certificate {id} is {state}; publish it first")]
    NotPublished {
        /// Certificate id.
        id: CertificateId,
        /// Current state.
        state: CertificateState,
    },

    /// Invalid lifecycle transition.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Stored data failed an integrity check.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The ledger contradicts a published record.
    #[error("ledger inconsistency for certificate {id}: {reason}")]
    Consistency {
        /// Certificate id.
        id: CertificateId,
        /// What the ledger reported.
        reason: String,
    },

    /// Confirmation did not arrive before the deadline.
    #[error("certificate {id} unresolvable: {reason}")]
    Unresolvable {
        /// Certificate id.
        id: CertificateId,
        /// Why resolution stopped.
        reason: String,
    },

    /// Record or object storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    /// Classification of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Input(_) => ErrorClass::Input,
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Unauthorized { .. } => ErrorClass::Unauthorized,
            Self::NotPublished { .. } | Self::Lifecycle(_) => ErrorClass::Lifecycle,
            Self::Ledger(e) if e.is_retryable() => ErrorClass::Transient,
            Self::Ledger(LedgerError::Rejected { .. }) => ErrorClass::Input,
            Self::Ledger(_) => ErrorClass::Integrity,
            Self::Integrity(_) => ErrorClass::Integrity,
            Self::Consistency { .. } => ErrorClass::Consistency,
            Self::Unresolvable { .. } | Self::Storage(_) => ErrorClass::Transient,
        }
    }

    /// Whether a caller may retry.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Message suitable for an end user.
    pub fn user_message(&self) -> String {
        match self.class() {
            ErrorClass::Integrity | ErrorClass::Consistency => "could not verify".into(),
            ErrorClass::Transient => "try again later".into(),
            ErrorClass::Input => self.to_string(),
            ErrorClass::NotFound => "certificate not found".into(),
            ErrorClass::Unauthorized => "you do not own this certificate".into(),
            ErrorClass::Lifecycle => self.to_string(),
        }
    }
}

impl From<CoreError> for RegistryError {
    fn from(e: CoreError) -> Self {
        Self::Input(e.to_string())
    }
}

impl From<CommitmentError> for RegistryError {
    fn from(e: CommitmentError) -> Self {
        match e {
            CommitmentError::Encoding(msg) => Self::Input(msg),
            other => Self::Integrity(other.to_string()),
        }
    }
}

impl From<CryptoError> for RegistryError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::EmptyInput | CryptoError::InvalidContentId { .. } => {
                Self::Input(e.to_string())
            }
            CryptoError::IntegrityViolation { .. } => Self::Integrity(e.to_string()),
            CryptoError::Io(io) => Self::Storage(io.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_ledger_error_is_retryable() {
        let err = RegistryError::from(LedgerError::Unavailable {
            ledger: "l".into(),
            reason: "timeout".into(),
        });
        assert_eq!(err.class(), ErrorClass::Transient);
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), "try again later");
    }

    #[test]
    fn integrity_and_consistency_say_could_not_verify() {
        let integrity = RegistryError::Integrity("digest mismatch".into());
        let consistency = RegistryError::Consistency {
            id: CertificateId::new(),
            reason: "reference not found".into(),
        };
        assert_eq!(integrity.user_message(), "could not verify");
        assert_eq!(consistency.user_message(), "could not verify");
        assert!(!integrity.is_retryable());
        assert!(!consistency.is_retryable());
    }

    #[test]
    fn empty_content_is_input_error() {
        let err = RegistryError::from(CryptoError::EmptyInput);
        assert_eq!(err.class(), ErrorClass::Input);
    }

    #[test]
    fn encoding_error_is_input_error() {
        let err = RegistryError::from(CommitmentError::Encoding("bad date".into()));
        assert_eq!(err.class(), ErrorClass::Input);
        assert!(err.user_message().contains("bad date"));
    }

    #[test]
    fn ledger_rejection_is_not_retryable() {
        let err = RegistryError::from(LedgerError::Rejected {
            ledger: "l".into(),
            reason: "nope".into(),
        });
        assert_eq!(err.class(), ErrorClass::Input);
        assert!(!err.is_retryable());
    }
}
