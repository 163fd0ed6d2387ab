//! # Commitment Backend Interface
//!
//! A backend exposes `compress` and `verify` over the canonical commitment
//! input. The backend in use is chosen by configuration via
//! [`BackendKind::build()`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use certchain_core::{CertificateMetadata, Timestamp};
use certchain_crypto::ContentId;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::commitment::Commitment;
use crate::error::CommitmentError;
use crate::hash::HashBackend;
use crate::succinct::SuccinctProofBackend;

/// Capability interface for commitment compression.
///
/// Implementations must be deterministic and collision-resistant over the
/// full commitment input.
pub trait CommitmentBackend: Send + Sync + fmt::Debug {
    /// Which scheme this backend produces.
    fn kind(&self) -> BackendKind;

    /// Fold metadata, content id and timestamp into a commitment.
    fn compress(
        &self,
        metadata: &CertificateMetadata,
        content_id: &ContentId,
        timestamp: &Timestamp,
    ) -> Result<Commitment, CommitmentError>;

    /// Whether `commitment` is the commitment for these inputs.
    ///
    /// The default recomputes and compares in constant time.
    fn verify(
        &self,
        metadata: &CertificateMetadata,
        content_id: &ContentId,
        timestamp: &Timestamp,
        commitment: &Commitment,
    ) -> Result<bool, CommitmentError> {
        if commitment.scheme != self.kind() {
            return Err(CommitmentError::SchemeMismatch {
                backend: self.kind().to_string(),
                commitment: commitment.scheme.to_string(),
            });
        }
        let recomputed = self.compress(metadata, content_id, timestamp)?;
        Ok(bool::from(
            recomputed.as_bytes()[..].ct_eq(&commitment.as_bytes()[..]),
        ))
    }
}

/// Selects a commitment backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Domain-separated SHA-256 over the canonical input.
    #[default]
    PlainHash,
    /// Proof-system backed commitment.
    SuccinctProof,
}

impl BackendKind {
    /// Configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainHash => "plain-hash",
            Self::SuccinctProof => "succinct-proof",
        }
    }

    /// Instantiate the backend.
    pub fn build(self) -> Arc<dyn CommitmentBackend> {
        match self {
            Self::PlainHash => Arc::new(HashBackend::new()),
            Self::SuccinctProof => Arc::new(SuccinctProofBackend::new()),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CommitmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain-hash" => Ok(Self::PlainHash),
            "succinct-proof" => Ok(Self::SuccinctProof),
            other => Err(CommitmentError::Encoding(format!(
                "unknown commitment backend {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certchain_core::IssuerId;
    use certchain_crypto::address_of;

    fn inputs() -> (CertificateMetadata, ContentId, Timestamp) {
        (
            CertificateMetadata {
                name: "X".into(),
                description: String::new(),
                issued_to: "Y".into(),
                issuer_id: IssuerId::new("issuer-1").unwrap(),
                issuer_name: "Acme".into(),
                issue_date: "2025-01-01".into(),
                expiry_date: None,
            },
            address_of(b"file").unwrap(),
            Timestamp::parse("2025-01-01T00:00:00Z").unwrap(),
        )
    }

    #[test]
    fn build_matches_kind() {
        for kind in [BackendKind::PlainHash, BackendKind::SuccinctProof] {
            assert_eq!(kind.build().kind(), kind);
        }
    }

    #[test]
    fn from_str_roundtrip() {
        for kind in [BackendKind::PlainHash, BackendKind::SuccinctProof] {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
        assert!("sha3".parse::<BackendKind>().is_err());
    }

    #[test]
    fn serde_is_kebab_case() {
        let json = serde_json::to_string(&BackendKind::SuccinctProof).unwrap();
        assert_eq!(json, "\"succinct-proof\"");
    }

    #[test]
    fn backends_disagree_and_refuse_each_other() {
        let (m, id, ts) = inputs();
        let plain = BackendKind::PlainHash.build();
        let succinct = BackendKind::SuccinctProof.build();
        let a = plain.compress(&m, &id, &ts).unwrap();
        let b = succinct.compress(&m, &id, &ts).unwrap();
        assert_ne!(a.digest, b.digest);
        assert!(matches!(
            plain.verify(&m, &id, &ts, &b),
            Err(CommitmentError::SchemeMismatch { .. })
        ));
    }

    #[test]
    fn verify_accepts_own_commitment() {
        let (m, id, ts) = inputs();
        for kind in [BackendKind::PlainHash, BackendKind::SuccinctProof] {
            let backend = kind.build();
            let c = backend.compress(&m, &id, &ts).unwrap();
            assert!(backend.verify(&m, &id, &ts, &c).unwrap());
        }
    }

    #[test]
    fn verify_rejects_changed_timestamp() {
        let (m, id, ts) = inputs();
        for kind in [BackendKind::PlainHash, BackendKind::SuccinctProof] {
            let backend = kind.build();
            let c = backend.compress(&m, &id, &ts).unwrap();
            let later = Timestamp::parse("2025-01-01T00:00:01Z").unwrap();
            assert!(!backend.verify(&m, &id, &later, &c).unwrap());
        }
    }
}
