//! The compact value anchored on the ledger.

use std::fmt;

use certchain_core::ContentDigest;
use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// A commitment: the scheme that produced it and a 32-byte digest.
///
/// Two commitments are equal only if both scheme and digest match. The
/// ledger is keyed by the digest alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment {
    /// Backend that produced the commitment.
    pub scheme: BackendKind,
    /// Commitment digest.
    pub digest: ContentDigest,
}

impl Commitment {
    /// Build a commitment.
    pub fn new(scheme: BackendKind, digest: ContentDigest) -> Self {
        Self { scheme, digest }
    }

    /// Raw digest bytes, for byte-for-byte comparison.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.digest.as_bytes()
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scheme, self.digest)
    }
}
