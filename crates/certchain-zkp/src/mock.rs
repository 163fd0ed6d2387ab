//! # Transparent Mock Prover
//!
//! Stands in for a real succinct prover. A "proof" is
//! `SHA256(JCS(statement) || content digest)`, recomputable by anyone from
//! the statement alone. **No zero-knowledge guarantees.**
//!
//! It pins the shape of the succinct path (attest at issue time, check at
//! verify time, proof bytes anchored as the commitment) so a real prover
//! can replace it without touching [`SuccinctProofBackend`](crate::SuccinctProofBackend).

use certchain_core::{CanonicalBytes, Sha256Accumulator};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::traits::{ProofError, ProofSystem};

/// 32-byte transparent proof.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MockProof(pub [u8; 32]);

/// Empty key; the mock prover has no setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockKey;

/// A certificate statement: the commitment input as a JSON value and the
/// content digest it is bound to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateStatement {
    pub input: serde_json::Value,
    pub content_digest: [u8; 32],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockProofSystem;

impl MockProofSystem {
    fn transcript(statement: &CertificateStatement) -> Result<[u8; 32], String> {
        let canonical =
            CanonicalBytes::from_value(statement.input.clone()).map_err(|e| e.to_string())?;
        let mut acc = Sha256Accumulator::new();
        acc.update(canonical.as_bytes())
            .update(&statement.content_digest);
        Ok(*acc.finalize().as_bytes())
    }
}

impl ProofSystem for MockProofSystem {
    type Proof = MockProof;
    type ProverKey = MockKey;
    type VerifierKey = MockKey;
    type Statement = CertificateStatement;

    fn attest(&self, _key: &MockKey, statement: &CertificateStatement) -> Result<MockProof, ProofError> {
        Self::transcript(statement)
            .map(MockProof)
            .map_err(ProofError::Statement)
    }

    fn check(
        &self,
        _key: &MockKey,
        proof: &MockProof,
        statement: &CertificateStatement,
    ) -> Result<bool, ProofError> {
        let expected = Self::transcript(statement).map_err(ProofError::Statement)?;
        Ok(bool::from(expected[..].ct_eq(&proof.0[..])))
    }
}
