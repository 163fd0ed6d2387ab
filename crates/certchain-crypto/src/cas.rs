//! # Content-Addressed Blob Store
//!
//! Stores certificate files on the filesystem under their content id:
//! `{base_dir}/sha256/{hex[0..2]}/{hex}`. The two-character fan-out keeps
//! directories small once a registry holds many files.
//!
//! Locators are opaque URIs of the form `cas://sha256/<hex>`. Callers hand
//! them back to [`BlobStore::get()`] and never interpret them.
//!
//! ## Integrity Invariant
//!
//! Every blob's path encodes its content id. On retrieval the id is
//! recomputed from the stored bytes and compared in constant time. A
//! mismatch is reported as [`CryptoError::IntegrityViolation`], never as
//! a successful read.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use subtle::ConstantTimeEq;

use crate::content::{address_of, ContentId};
use crate::error::CryptoError;

const SCHEME: &str = "cas://";

/// Opaque handle to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobLocator {
    id: ContentId,
}

impl BlobLocator {
    /// Locator for a known content id.
    pub fn for_content(id: ContentId) -> Self {
        Self { id }
    }

    /// Parse a `cas://sha256/<hex>` URI.
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        let rest = s
            .strip_prefix(SCHEME)
            .ok_or_else(|| CryptoError::InvalidContentId {
                value: s.to_string(),
                reason: format!("locator must start with {SCHEME}"),
            })?;
        let (alg, hex) = rest
            .split_once('/')
            .ok_or_else(|| CryptoError::InvalidContentId {
                value: s.to_string(),
                reason: "expected cas://<algorithm>/<hex>".into(),
            })?;
        let id = ContentId::parse(&format!("{alg}:{hex}"))?;
        Ok(Self { id })
    }

    /// The content id this locator points at.
    pub fn content_id(&self) -> &ContentId {
        &self.id
    }
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}{}/{}",
            self.id.digest().algorithm(),
            self.id.to_hex()
        )
    }
}

/// A content-addressed blob store backed by the filesystem.
#[derive(Debug, Clone)]
pub struct BlobStore {
    base_dir: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `base_dir`. The directory is created lazily.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Root directory of the store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Filesystem path at which the blob for `locator` lives.
    pub fn path_of(&self, locator: &BlobLocator) -> PathBuf {
        let hex = locator.id.to_hex();
        self.base_dir
            .join(locator.id.digest().algorithm().as_str())
            .join(&hex[..2])
            .join(hex)
    }

    /// Store `bytes`, returning their locator.
    ///
    /// Idempotent: storing identical bytes twice returns the same locator
    /// and leaves the existing file untouched.
    pub fn put(&self, bytes: &[u8]) -> Result<BlobLocator, CryptoError> {
        let locator = BlobLocator::for_content(address_of(bytes)?);
        let path = self.path_of(&locator);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        // create_new fails with AlreadyExists instead of racing an exists() check.
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut f) => {
                f.write_all(bytes)?;
                f.sync_all()?;
                tracing::debug!(locator = %locator, size = bytes.len(), "stored blob");
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(locator = %locator, "blob already present");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(locator)
    }

    /// Fetch and integrity-check a blob. `Ok(None)` if absent.
    pub fn get(&self, locator: &BlobLocator) -> Result<Option<Vec<u8>>, CryptoError> {
        let path = self.path_of(locator);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let actual = match address_of(&bytes) {
            Ok(id) => id,
            Err(CryptoError::EmptyInput) => {
                return Err(CryptoError::IntegrityViolation {
                    path: path.display().to_string(),
                    expected: locator.id.to_string(),
                    actual: "<empty>".into(),
                })
            }
            Err(e) => return Err(e),
        };
        if !bool::from(
            actual
                .digest()
                .as_bytes()
                .ct_eq(locator.id.digest().as_bytes()),
        ) {
            tracing::warn!(locator = %locator, actual = %actual, "blob failed integrity check");
            return Err(CryptoError::IntegrityViolation {
                path: path.display().to_string(),
                expected: locator.id.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(Some(bytes))
    }

    /// Whether a blob exists for `locator`.
    pub fn contains(&self, locator: &BlobLocator) -> bool {
        self.path_of(locator).is_file()
    }

    /// All stored locators, sorted.
    pub fn list(&self) -> Result<Vec<BlobLocator>, CryptoError> {
        let root = self.base_dir.join("sha256");
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for shard in fs::read_dir(&root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                if let Some(name) = entry.file_name().to_str() {
                    if let Ok(id) = ContentId::parse(name) {
                        out.push(BlobLocator::for_content(id));
                    }
                }
            }
        }
        out.sort_by_key(|l| l.id.to_hex());
        Ok(out)
    }
}
