//! # Content Digests
//!
//! Defines [`ContentDigest`] and [`DigestAlgorithm`]. Every digest carries
//! its algorithm tag so that a stored commitment stays self-describing if
//! the hash function is ever migrated.
//!
//! Two construction paths exist:
//!
//! - [`sha256_digest()`] over [`CanonicalBytes`] for structured data.
//! - [`Sha256Accumulator`] for composites that mix canonical bytes with raw
//!   binary (file content, domain-separation tags).
//!
//! Digests render as `sha256:<64 lowercase hex>` and serialize as that string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::CoreError;

/// The hash algorithm that produced a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 32-byte digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    algorithm: DigestAlgorithm,
    bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a SHA-256 digest from raw bytes.
    pub fn sha256(bytes: [u8; 32]) -> Self {
        Self {
            algorithm: DigestAlgorithm::Sha256,
            bytes,
        }
    }

    /// The algorithm that produced this digest.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse either `sha256:<hex>` or bare 64-char hex.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let hex = match s.split_once(':') {
            Some(("sha256", rest)) => rest,
            Some((alg, _)) => {
                return Err(CoreError::InvalidDigest {
                    value: s.to_string(),
                    reason: format!("unsupported algorithm {alg:?}"),
                })
            }
            None => s,
        };
        if hex.len() != 64 {
            return Err(CoreError::InvalidDigest {
                value: s.to_string(),
                reason: format!("expected 64 hex chars, got {}", hex.len()),
            });
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| CoreError::InvalidDigest {
                value: s.to_string(),
                reason: "non-ascii characters".into(),
            })?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| CoreError::InvalidDigest {
                value: s.to_string(),
                reason: format!("invalid hex pair {pair:?}"),
            })?;
        }
        Ok(Self::sha256(bytes))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute a SHA-256 digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut acc = Sha256Accumulator::new();
    acc.update(data.as_bytes());
    acc.finalize()
}

/// Compute a SHA-256 hex string from canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

/// Incremental SHA-256 over a sequence of byte slices.
///
/// Used where a digest binds canonical bytes together with raw binary,
/// e.g. a domain-separation tag followed by the canonical commitment input,
/// or the content of an uploaded file.
#[derive(Debug, Clone, Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Start an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes into the digest.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.hasher.update(data);
        self
    }

    /// Finish and return the tagged digest.
    pub fn finalize(self) -> ContentDigest {
        let hash = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        ContentDigest::sha256(bytes)
    }

    /// Finish and return the digest as lowercase hex.
    pub fn finalize_hex(self) -> String {
        self.finalize().to_hex()
    }
}
