//! # Ledger Anchor Interface
//!
//! The [`LedgerAnchor`] trait is **sealed**: only the ledgers in this crate
//! can implement it. `publish` returning `Ok` is taken by callers as proof
//! that the commitment was durably submitted, so the set of implementations
//! is closed.

use std::fmt;

use async_trait::async_trait;
use certchain_zkp::Commitment;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Opaque handle returned by a ledger for a published commitment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerReference(String);

impl LedgerReference {
    /// Wrap a ledger-issued reference.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger-side status of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    /// Submitted, not yet at the required confirmation depth.
    Pending,
    /// At or beyond the required confirmation depth.
    Confirmed,
    /// The ledger has no entry for this reference.
    NotFound,
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::NotFound => "not_found",
        })
    }
}

/// An append-only public commitment log.
#[async_trait]
pub trait LedgerAnchor: private::Sealed + Send + Sync + fmt::Debug {
    /// Identifier of this ledger, used in logs and errors.
    fn ledger_id(&self) -> &str;

    /// Reference of an existing entry for `commitment`, if any.
    async fn lookup(&self, commitment: &Commitment) -> Result<Option<LedgerReference>, LedgerError>;

    /// Publish `commitment`. Idempotent: republishing returns the existing
    /// reference without creating a second entry.
    async fn publish(&self, commitment: &Commitment) -> Result<LedgerReference, LedgerError>;

    /// Status of a previously returned reference.
    async fn resolve(&self, reference: &LedgerReference) -> Result<LedgerStatus, LedgerError>;

    /// Whether the entry at `reference` holds exactly `commitment`.
    /// A missing entry is `Ok(false)`.
    async fn verify(
        &self,
        reference: &LedgerReference,
        commitment: &Commitment,
    ) -> Result<bool, LedgerError>;
}

mod private {
    pub trait Sealed {}
    impl Sealed for crate::mock::MockLedger {}
    impl Sealed for crate::rpc::RpcLedger {}
}
