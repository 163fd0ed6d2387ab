//! # Object Storage
//!
//! Certificate files are stored by content. [`ObjectStore::put`] returns an
//! opaque [`ObjectLocator`]; [`ObjectStore::get`] returns the bytes stored
//! under it, or `None` when nothing is stored there.
//!
//! [`CasObjectStore`] checks integrity on read. A blob whose bytes no longer
//! hash to its locator surfaces as [`RegistryError::Integrity`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use certchain_crypto::{address_of, BlobLocator, BlobStore};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Opaque handle to a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectLocator(String);

impl ObjectLocator {
    /// Wrap a store-issued locator.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content storage for certificate files.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Store `bytes` and return their locator.
    async fn put(&self, bytes: Vec<u8>) -> Result<ObjectLocator, RegistryError>;

    /// Fetch the bytes stored under `locator`.
    async fn get(&self, locator: &ObjectLocator) -> Result<Option<Vec<u8>>, RegistryError>;
}

// ─── In-memory ───────────────────────────────────────────────────────

/// In-memory object store. Locators have the form `mem://sha256/<hex>`.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<DashMap<ObjectLocator, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bytes under `locator` without re-addressing them.
    /// Returns whether anything was stored there.
    pub fn overwrite(&self, locator: &ObjectLocator, bytes: Vec<u8>) -> bool {
        match self.objects.get_mut(locator) {
            Some(mut slot) => {
                *slot = bytes;
                true
            }
            None => false,
        }
    }

    /// Remove an object. Returns whether it existed.
    pub fn remove(&self, locator: &ObjectLocator) -> bool {
        self.objects.remove(locator).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ObjectLocator, RegistryError> {
        let id = address_of(&bytes)?;
        let locator = ObjectLocator::new(format!("mem://sha256/{}", id.to_hex()));
        self.objects.entry(locator.clone()).or_insert(bytes);
        Ok(locator)
    }

    async fn get(&self, locator: &ObjectLocator) -> Result<Option<Vec<u8>>, RegistryError> {
        Ok(self.objects.get(locator).map(|b| b.value().clone()))
    }
}

// ─── Filesystem CAS ──────────────────────────────────────────────────

/// Object store backed by the filesystem blob CAS.
#[derive(Debug, Clone)]
pub struct CasObjectStore {
    blobs: Arc<BlobStore>,
}

impl CasObjectStore {
    pub fn new(blobs: BlobStore) -> Self {
        Self {
            blobs: Arc::new(blobs),
        }
    }

    /// Underlying blob store.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }
}

#[async_trait]
impl ObjectStore for CasObjectStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ObjectLocator, RegistryError> {
        let blobs = Arc::clone(&self.blobs);
        let locator = tokio::task::spawn_blocking(move || blobs.put(&bytes))
            .await
            .map_err(|e| RegistryError::Storage(format!("blob write task failed: {e}")))??;
        Ok(ObjectLocator::new(locator.to_string()))
    }

    async fn get(&self, locator: &ObjectLocator) -> Result<Option<Vec<u8>>, RegistryError> {
        let blob = BlobLocator::parse(locator.as_str())
            .map_err(|e| RegistryError::Integrity(format!("bad locator {locator}: {e}")))?;
        let blobs = Arc::clone(&self.blobs);
        let bytes = tokio::task::spawn_blocking(move || blobs.get(&blob))
            .await
            .map_err(|e| RegistryError::Storage(format!("blob read task failed: {e}")))??;
        Ok(bytes)
    }
}
