//! # Plain-Hash Backend
//!
//! `commitment = SHA256(DOMAIN_TAG || canonical_input)`.
//!
//! The domain tag keeps a commitment digest from ever colliding with a
//! plain content digest of the same bytes.

use certchain_core::{CertificateMetadata, Sha256Accumulator, Timestamp};
use certchain_crypto::ContentId;

use crate::backend::{BackendKind, CommitmentBackend};
use crate::commitment::Commitment;
use crate::encoding::encode_commitment_input;
use crate::error::CommitmentError;

/// Domain separation prefix for plain-hash commitments.
pub const DOMAIN_TAG: &[u8] = b"certchain.commitment.v1\x00";

/// Domain-separated SHA-256 commitment backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashBackend;

impl HashBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl CommitmentBackend for HashBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PlainHash
    }

    fn compress(
        &self,
        metadata: &CertificateMetadata,
        content_id: &ContentId,
        timestamp: &Timestamp,
    ) -> Result<Commitment, CommitmentError> {
        let canonical = encode_commitment_input(metadata, content_id, timestamp)?;
        let mut acc = Sha256Accumulator::new();
        acc.update(DOMAIN_TAG).update(canonical.as_bytes());
        Ok(Commitment::new(BackendKind::PlainHash, acc.finalize()))
    }
}
