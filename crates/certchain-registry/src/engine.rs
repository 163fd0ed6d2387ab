//! # Verification Engine
//!
//! Recomputes a record's commitment from its stored content and metadata,
//! compares it with the committed value, and asks the ledger to confirm
//! the anchored entry.
//!
//! ```text
//! ObjectStore.get ─▶ address_of ─▶ backend.compress ─▶ ct_eq(commitment)
//!                                                        │
//!                                         LedgerAnchor.verify(reference)
//! ```
//!
//! A record is `Verified` only when the local recomputation and the ledger
//! both agree. Local disagreement is a [`VerificationOutcome::Mismatch`];
//! a ledger that stays unreachable past the retry budget is
//! [`VerificationOutcome::Unresolvable`].
//!
//! The backend is chosen from the commitment's own scheme, so records
//! committed under a different backend than the one currently configured
//! still verify.

use std::fmt;
use std::sync::Arc;

use certchain_crypto::address_of;
use certchain_ledger::{retry_transient, LedgerAnchor, RetryPolicy};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{ErrorClass, RegistryError};
use crate::objects::ObjectStore;
use crate::record::CertificateRecord;

/// Why a record failed local or ledger verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    /// The stored file is gone.
    ContentMissing,
    /// The stored file no longer hashes to the committed content id.
    ContentChanged,
    /// Stored metadata cannot be encoded any more.
    MetadataUnencodable,
    /// Recomputed commitment differs from the stored one.
    CommitmentDiffers,
    /// The ledger entry does not match the commitment.
    LedgerDisagrees,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ContentMissing => "certificate file is missing",
            Self::ContentChanged => "certificate file has changed",
            Self::MetadataUnencodable => "certificate metadata cannot be encoded",
            Self::CommitmentDiffers => "commitment does not match certificate data",
            Self::LedgerDisagrees => "ledger entry does not match commitment",
        })
    }
}

/// Result of verifying a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    Mismatch { reason: MismatchReason },
    Unresolvable { reason: String },
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.write_str("VERIFIED"),
            Self::Mismatch { reason } => write!(f, "MISMATCH ({reason})"),
            Self::Unresolvable { reason } => write!(f, "UNRESOLVABLE ({reason})"),
        }
    }
}

/// Recomputes and cross-checks commitments.
#[derive(Debug, Clone)]
pub struct VerificationEngine {
    objects: Arc<dyn ObjectStore>,
    ledger: Arc<dyn LedgerAnchor>,
    retry: RetryPolicy,
}

impl VerificationEngine {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        ledger: Arc<dyn LedgerAnchor>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            objects,
            ledger,
            retry,
        }
    }

    /// Verify `record` against its stored content and the ledger.
    ///
    /// Fails with `NotPublished` for records without a ledger reference.
    /// Non-retryable ledger errors are returned as errors.
    pub async fn verify(
        &self,
        record: &CertificateRecord,
    ) -> Result<VerificationOutcome, RegistryError> {
        let Some(reference) = &record.ledger_reference else {
            return Err(RegistryError::NotPublished {
                id: record.id,
                state: record.state(),
            });
        };

        if let Some(reason) = self.local_mismatch(record).await? {
            tracing::error!(id = %record.id, %reason, "local verification failed");
            return Ok(VerificationOutcome::Mismatch { reason });
        }

        let result = retry_transient(&self.retry, "verify", || {
            self.ledger.verify(reference, &record.commitment)
        })
        .await;
        match result {
            Ok(true) => {
                tracing::info!(id = %record.id, reference = %reference, "certificate verified");
                Ok(VerificationOutcome::Verified)
            }
            Ok(false) => {
                tracing::error!(
                    id = %record.id,
                    reference = %reference,
                    ledger = self.ledger.ledger_id(),
                    "ledger entry does not match commitment"
                );
                Ok(VerificationOutcome::Mismatch {
                    reason: MismatchReason::LedgerDisagrees,
                })
            }
            Err(e) if e.is_retryable() => Ok(VerificationOutcome::Unresolvable {
                reason: e.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Recompute content id and commitment. `Some` on the first disagreement.
    async fn local_mismatch(
        &self,
        record: &CertificateRecord,
    ) -> Result<Option<MismatchReason>, RegistryError> {
        let bytes = match self.objects.get(&record.locator).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(Some(MismatchReason::ContentMissing)),
            Err(e) if e.class() == ErrorClass::Integrity => {
                tracing::warn!(id = %record.id, "stored object failed integrity check: {e}");
                return Ok(Some(MismatchReason::ContentChanged));
            }
            Err(e) => return Err(e),
        };

        let content_id = match address_of(&bytes) {
            Ok(id) => id,
            Err(_) => return Ok(Some(MismatchReason::ContentChanged)),
        };
        if content_id != record.content_id {
            return Ok(Some(MismatchReason::ContentChanged));
        }

        let backend = record.commitment.scheme.build();
        let recomputed =
            match backend.compress(&record.metadata, &content_id, &record.committed_at) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(id = %record.id, "recompute failed: {e}");
                    return Ok(Some(MismatchReason::MetadataUnencodable));
                }
            };
        let same = bool::from(
            recomputed.as_bytes()[..].ct_eq(&record.commitment.as_bytes()[..]),
        );
        if same {
            Ok(None)
        } else {
            Ok(Some(MismatchReason::CommitmentDiffers))
        }
    }
}
