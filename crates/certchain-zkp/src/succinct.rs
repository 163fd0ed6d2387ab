//! # Succinct-Proof Backend
//!
//! Builds a statement from the canonical commitment input and the content
//! id, attests it, and anchors the proof bytes as the commitment.
//! Verification rebuilds the statement and checks the anchored proof
//! against it.

use certchain_core::{CertificateMetadata, ContentDigest, Timestamp};
use certchain_crypto::ContentId;

use crate::backend::{BackendKind, CommitmentBackend};
use crate::commitment::Commitment;
use crate::encoding::commitment_input;
use crate::error::CommitmentError;
use crate::mock::{CertificateStatement, MockKey, MockProof, MockProofSystem};
use crate::traits::ProofSystem;

/// Commitment backend driven by a [`ProofSystem`].
#[derive(Debug, Clone, Default)]
pub struct SuccinctProofBackend {
    system: MockProofSystem,
    key: MockKey,
}

impl SuccinctProofBackend {
    /// Backend over the mock proof system.
    pub fn new() -> Self {
        Self::default()
    }

    fn statement(
        metadata: &CertificateMetadata,
        content_id: &ContentId,
        timestamp: &Timestamp,
    ) -> Result<CertificateStatement, CommitmentError> {
        Ok(CertificateStatement {
            input: commitment_input(metadata, content_id, timestamp)?,
            content_digest: *content_id.digest().as_bytes(),
        })
    }
}

impl CommitmentBackend for SuccinctProofBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SuccinctProof
    }

    fn compress(
        &self,
        metadata: &CertificateMetadata,
        content_id: &ContentId,
        timestamp: &Timestamp,
    ) -> Result<Commitment, CommitmentError> {
        let statement = Self::statement(metadata, content_id, timestamp)?;
        let proof = self.system.attest(&self.key, &statement)?;
        Ok(Commitment::new(
            BackendKind::SuccinctProof,
            ContentDigest::sha256(proof.0),
        ))
    }

    fn verify(
        &self,
        metadata: &CertificateMetadata,
        content_id: &ContentId,
        timestamp: &Timestamp,
        commitment: &Commitment,
    ) -> Result<bool, CommitmentError> {
        if commitment.scheme != BackendKind::SuccinctProof {
            return Err(CommitmentError::SchemeMismatch {
                backend: self.kind().to_string(),
                commitment: commitment.scheme.to_string(),
            });
        }
        let statement = Self::statement(metadata, content_id, timestamp)?;
        let proof = MockProof(*commitment.as_bytes());
        let ok = self.system.check(&self.key, &proof, &statement)?;
        if !ok {
            tracing::debug!(commitment = %commitment, "succinct proof did not verify");
        }
        Ok(ok)
    }
}
