//! # Proof Systems
//!
//! A proof system attests that a certificate statement (the canonical
//! commitment input plus the public content id) was fixed at issue time.
//! The set of proof systems is closed: a commitment anchored on a public
//! ledger must be checkable by every verifier with the same code, so the
//! trait is sealed to this crate.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Failure to attest or check a statement.
///
/// A well-formed proof that does not match its statement is `Ok(false)`
/// from [`ProofSystem::check`], not an error.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The statement cannot be put into canonical form.
    #[error("unprovable statement: {0}")]
    Statement(String),

    /// The prover failed internally.
    #[error("proof generation failed: {0}")]
    Generation(String),

    /// The proof bytes are structurally unusable.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
}

mod private {
    pub trait Sealed {}
}

/// Sealed interface over a succinct proof system.
pub trait ProofSystem: private::Sealed + Send + Sync {
    /// Anchorable proof artifact.
    type Proof: Serialize + DeserializeOwned + Clone + std::fmt::Debug;
    /// Key material held by the issuer.
    type ProverKey;
    /// Key material distributed to verifiers.
    type VerifierKey: Clone;
    /// What is being attested.
    type Statement: Clone;

    /// Produce a proof for `statement`.
    fn attest(
        &self,
        key: &Self::ProverKey,
        statement: &Self::Statement,
    ) -> Result<Self::Proof, ProofError>;

    /// `Ok(true)` iff `proof` attests `statement`.
    fn check(
        &self,
        key: &Self::VerifierKey,
        proof: &Self::Proof,
        statement: &Self::Statement,
    ) -> Result<bool, ProofError>;
}

impl private::Sealed for crate::mock::MockProofSystem {}
