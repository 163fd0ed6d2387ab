//! # Record Storage
//!
//! [`RecordStore`] is the persistence seam for [`CertificateRecord`]s.
//!
//! - [`MemoryRecordStore`]: `Arc<RwLock<HashMap>>`, never held across `.await`.
//! - [`JsonFileRecordStore`]: the in-memory map mirrored to a JSON file.
//!   A mutation is written to disk first and reaches memory only once the
//!   write succeeded, so a failed write leaves no trace. Writes go to a
//!   sibling temp file and are renamed into place, so a crash leaves either
//!   the old or the new file.
//!
//! Owner lookups return newest records first.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use certchain_core::{CertificateId, OwnerAddress};
use parking_lot::RwLock;

use crate::error::RegistryError;
use crate::record::CertificateRecord;

/// Persistence for certificate records.
#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Insert a new record. Fails if the id is already taken.
    async fn insert(&self, record: CertificateRecord) -> Result<(), RegistryError>;

    /// Look up a record by id.
    async fn find_by_id(&self, id: &CertificateId)
        -> Result<Option<CertificateRecord>, RegistryError>;

    /// All records owned by `owner`, newest first.
    async fn find_by_owner(&self, owner: &OwnerAddress)
        -> Result<Vec<CertificateRecord>, RegistryError>;

    /// Replace an existing record. Fails with `NotFound` if absent.
    async fn update(&self, record: CertificateRecord) -> Result<(), RegistryError>;
}

// ─── In-memory ───────────────────────────────────────────────────────

/// Thread-safe, cloneable in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    data: Arc<RwLock<HashMap<CertificateId, CertificateRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_records(records: Vec<CertificateRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            data: Arc::new(RwLock::new(map)),
        }
    }

    fn insert_sync(&self, record: CertificateRecord) -> Result<(), RegistryError> {
        let mut guard = self.data.write();
        if guard.contains_key(&record.id) {
            return Err(RegistryError::Consistency {
                id: record.id,
                reason: "record id already exists".into(),
            });
        }
        guard.insert(record.id, record);
        Ok(())
    }

    fn get_sync(&self, id: &CertificateId) -> Option<CertificateRecord> {
        self.data.read().get(id).cloned()
    }

    fn by_owner_sync(&self, owner: &OwnerAddress) -> Vec<CertificateRecord> {
        let mut out: Vec<_> = self
            .data
            .read()
            .values()
            .filter(|r| r.is_owned_by(owner))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        out
    }

    fn update_sync(&self, record: CertificateRecord) -> Result<(), RegistryError> {
        match self.data.write().get_mut(&record.id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RegistryError::NotFound(record.id)),
        }
    }

    /// All records, ordered by id.
    pub fn list(&self) -> Vec<CertificateRecord> {
        let mut out: Vec<_> = self.data.read().values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: CertificateRecord) -> Result<(), RegistryError> {
        self.insert_sync(record)
    }

    async fn find_by_id(
        &self,
        id: &CertificateId,
    ) -> Result<Option<CertificateRecord>, RegistryError> {
        Ok(self.get_sync(id))
    }

    async fn find_by_owner(
        &self,
        owner: &OwnerAddress,
    ) -> Result<Vec<CertificateRecord>, RegistryError> {
        Ok(self.by_owner_sync(owner))
    }

    async fn update(&self, record: CertificateRecord) -> Result<(), RegistryError> {
        self.update_sync(record)
    }
}

// ─── JSON file ───────────────────────────────────────────────────────

/// Record store persisted as a single JSON file.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    memory: MemoryRecordStore,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileRecordStore {
    /// Open the store at `path`, loading existing records. A missing file
    /// is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let records: Vec<CertificateRecord> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                RegistryError::Storage(format!("corrupt record file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(RegistryError::Storage(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        tracing::debug!(path = %path.display(), count = records.len(), "loaded record store");
        Ok(Self {
            path,
            memory: MemoryRecordStore::from_records(records),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents with `record` put in place of any entry with its id.
    fn candidate(&self, record: &CertificateRecord) -> Vec<CertificateRecord> {
        let mut records = self.memory.list();
        match records.binary_search_by(|r| r.id.cmp(&record.id)) {
            Ok(i) => records[i] = record.clone(),
            Err(i) => records.insert(i, record.clone()),
        }
        records
    }

    /// Write `records` to disk.
    async fn flush(&self, records: &[CertificateRecord]) -> Result<(), RegistryError> {
        let storage = |e: std::io::Error| {
            RegistryError::Storage(format!("failed to write {}: {e}", self.path.display()))
        };
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| RegistryError::Storage(format!("failed to encode records: {e}")))?;
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(storage)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(storage)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn insert(&self, record: CertificateRecord) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().await;
        if self.memory.get_sync(&record.id).is_some() {
            return Err(RegistryError::Consistency {
                id: record.id,
                reason: "record id already exists".into(),
            });
        }
        self.flush(&self.candidate(&record)).await?;
        self.memory.insert_sync(record)
    }

    async fn find_by_id(
        &self,
        id: &CertificateId,
    ) -> Result<Option<CertificateRecord>, RegistryError> {
        Ok(self.memory.get_sync(id))
    }

    async fn find_by_owner(
        &self,
        owner: &OwnerAddress,
    ) -> Result<Vec<CertificateRecord>, RegistryError> {
        Ok(self.memory.by_owner_sync(owner))
    }

    async fn update(&self, record: CertificateRecord) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().await;
        if self.memory.get_sync(&record.id).is_none() {
            return Err(RegistryError::NotFound(record.id));
        }
        self.flush(&self.candidate(&record)).await?;
        self.memory.update_sync(record)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::objects::ObjectLocator;
    use crate::record::FileKind;
    use certchain_core::{MetadataDraft, Timestamp};
    use certchain_crypto::address_of;
    use certchain_state::CertificateLifecycle;
    use certchain_zkp::{BackendKind, CommitmentBackend, HashBackend};

    pub(crate) fn record(owner: &str, created: i64) -> CertificateRecord {
        let at = Timestamp::from_epoch_secs(created).unwrap();
        let metadata = MetadataDraft::default().complete(at.date()).unwrap();
        let content_id = address_of(format!("file-{owner}-{created}").as_bytes()).unwrap();
        let commitment = HashBackend::new()
            .compress(&metadata, &content_id, &at)
            .unwrap();
        assert_eq!(commitment.scheme, BackendKind::PlainHash);
        CertificateRecord {
            id: CertificateId::new(),
            metadata,
            locator: ObjectLocator::new(format!("mem://sha256/{}", content_id.to_hex())),
            content_id,
            file_kind: FileKind::Pdf,
            committed_at: at,
            commitment,
            ledger_reference: None,
            lifecycle: CertificateLifecycle::new(None),
            owner: OwnerAddress::new(owner).unwrap(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let store = MemoryRecordStore::new();
        let r = record("0xabc", 1_700_000_000);
        store.insert(r.clone()).await.unwrap();
        let err = store.insert(r).await.unwrap_err();
        assert!(matches!(err, RegistryError::Consistency { .. }));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = store.update(record("0xabc", 1)).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn owner_lookup_is_case_insensitive_and_newest_first() {
        let store = MemoryRecordStore::new();
        let old = record("0xABCDEF", 1_700_000_000);
        let new = record("0xabcdef", 1_700_000_100);
        let other = record("0x1234", 1_700_000_200);
        for r in [old.clone(), new.clone(), other] {
            store.insert(r).await.unwrap();
        }
        let owner = OwnerAddress::new("0xAbCdEf").unwrap();
        let found = store.find_by_owner(&owner).await.unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let mut r = record("0xabc", 1_700_000_000);
        {
            let store = JsonFileRecordStore::open(&path).await.unwrap();
            store.insert(r.clone()).await.unwrap();
            r.lifecycle
                .publish(Timestamp::from_epoch_secs(1_700_000_050).unwrap())
                .unwrap();
            store.update(r.clone()).await.unwrap();
        }

        let reopened = JsonFileRecordStore::open(&path).await.unwrap();
        assert_eq!(reopened.find_by_id(&r.id).await.unwrap(), Some(r));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = JsonFileRecordStore::open(&path).await.unwrap();
        let mut kept = record("0xabc", 1_700_000_000);
        store.insert(kept.clone()).await.unwrap();

        // A directory in place of the file makes the rename fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let lost = record("0xabc", 1_700_000_100);
        let err = store.insert(lost.clone()).await.unwrap_err();
        assert!(matches!(err, RegistryError::Storage(_)));
        assert_eq!(store.find_by_id(&lost.id).await.unwrap(), None);
        assert_eq!(store.find_by_owner(&kept.owner).await.unwrap(), vec![kept.clone()]);

        let before = kept.clone();
        kept.lifecycle
            .publish(Timestamp::from_epoch_secs(1_700_000_050).unwrap())
            .unwrap();
        let err = store.update(kept).await.unwrap_err();
        assert!(matches!(err, RegistryError::Storage(_)));
        assert_eq!(store.find_by_id(&before.id).await.unwrap(), Some(before));
    }

    #[tokio::test]
    async fn json_store_checks_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = JsonFileRecordStore::open(&path).await.unwrap();

        let err = store.update(record("0xabc", 1)).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
        assert!(!path.exists());

        let r = record("0xabc", 2);
        store.insert(r.clone()).await.unwrap();
        let err = store.insert(r).await.unwrap_err();
        assert!(matches!(err, RegistryError::Consistency { .. }));
    }

    #[tokio::test]
    async fn json_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = JsonFileRecordStore::open(&path).await.unwrap_err();
        assert!(matches!(err, RegistryError::Storage(_)));
    }
}
