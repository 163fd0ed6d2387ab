//! # Content Identifiers
//!
//! `address_of(bytes) -> ContentId`. Deterministic, collision-resistant,
//! no I/O.

use std::fmt;

use certchain_core::{ContentDigest, Sha256Accumulator};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Fixed-width identifier of a certificate file's bytes.
///
/// Renders as `sha256:<hex>`, the same form the commitment encoding binds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(ContentDigest);

impl ContentId {
    /// Wrap an existing digest.
    pub fn from_digest(digest: ContentDigest) -> Self {
        Self(digest)
    }

    /// Parse `sha256:<hex>` or bare hex.
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        ContentDigest::parse(s)
            .map(Self)
            .map_err(|e| CryptoError::InvalidContentId {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// The underlying digest.
    pub fn digest(&self) -> &ContentDigest {
        &self.0
    }

    /// Lowercase hex of the digest bytes, without the algorithm prefix.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Compute the content identifier of `bytes`.
///
/// # Errors
///
/// [`CryptoError::EmptyInput`] for zero-length content. An empty upload is
/// always a client mistake and must never reach the ledger.
pub fn address_of(bytes: &[u8]) -> Result<ContentId, CryptoError> {
    if bytes.is_empty() {
        return Err(CryptoError::EmptyInput);
    }
    let mut acc = Sha256Accumulator::new();
    acc.update(bytes);
    Ok(ContentId(acc.finalize()))
}
