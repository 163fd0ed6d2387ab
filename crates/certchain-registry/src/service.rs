//! # Certificate Service
//!
//! Orchestrates the certificate lifecycle over the storage, commitment and
//! ledger collaborators.
//!
//! ## Operations
//!
//! | Operation | Gate | Transition |
//! |-----------|------|------------|
//! | [`upload`](CertificateService::upload) | session | creates `DRAFT` |
//! | [`publish`](CertificateService::publish) | owner | `DRAFT → PUBLISHED` |
//! | [`confirm`](CertificateService::confirm) | owner | `PUBLISHED → VERIFIED \| INVALID` |
//! | [`verify`](CertificateService::verify) | public | `PUBLISHED → INVALID` on ledger disagreement |
//! | [`get`](CertificateService::get) | public | persists lazy expiry |
//! | [`list_by_owner`](CertificateService::list_by_owner) | session | none |
//! | [`verify_ownership`](CertificateService::verify_ownership) | public | none |
//!
//! ## Concurrency
//!
//! Mutations of one record are serialized through a per-record async
//! mutex. A second concurrent `publish` of the same record waits, then
//! observes the reference the first one attached and returns it.
//!
//! ## Idempotent Publish
//!
//! Each publish attempt asks the ledger for an existing entry before
//! writing. A publish that reached the ledger but whose record update was
//! lost is therefore recovered, not duplicated.

use std::fmt;
use std::sync::Arc;

use certchain_core::{CertificateId, MetadataDraft, OwnerAddress, Timestamp};
use certchain_crypto::address_of;
use certchain_ledger::{
    await_confirmation, retry_transient, LedgerAnchor, PollOutcome, PollPolicy, RetryPolicy,
};
use certchain_state::{CertificateLifecycle, CertificateState, LifecycleError};
use certchain_zkp::CommitmentBackend;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::engine::{MismatchReason, VerificationEngine, VerificationOutcome};
use crate::error::RegistryError;
use crate::objects::ObjectStore;
use crate::record::{CertificateRecord, FileKind};
use crate::records::RecordStore;
use crate::session::WalletSession;

type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// A certificate file plus the metadata entered for it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub metadata: MetadataDraft,
}

/// Result of [`CertificateService::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub record: CertificateRecord,
    /// Effective status at the time of verification.
    pub status: CertificateState,
    pub outcome: VerificationOutcome,
}

/// Certificate lifecycle orchestration.
pub struct CertificateService {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    ledger: Arc<dyn LedgerAnchor>,
    backend: Arc<dyn CommitmentBackend>,
    engine: VerificationEngine,
    retry: RetryPolicy,
    poll: PollPolicy,
    locks: DashMap<CertificateId, Arc<Mutex<()>>>,
    clock: Clock,
}

impl fmt::Debug for CertificateService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateService")
            .field("records", &self.records)
            .field("objects", &self.objects)
            .field("ledger", &self.ledger.ledger_id())
            .field("backend", &self.backend.kind())
            .field("retry", &self.retry)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

/// Held while mutating one record. Releases the per-record mutex entry
/// once nobody else is waiting on it.
struct RecordLock<'a> {
    locks: &'a DashMap<CertificateId, Arc<Mutex<()>>>,
    id: CertificateId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.id, |_, m| Arc::strong_count(m) == 1);
    }
}

impl CertificateService {
    /// Build a service with default retry and poll policies.
    pub fn new(
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        ledger: Arc<dyn LedgerAnchor>,
        backend: Arc<dyn CommitmentBackend>,
    ) -> Self {
        let retry = RetryPolicy::default();
        Self {
            engine: VerificationEngine::new(Arc::clone(&objects), Arc::clone(&ledger), retry),
            records,
            objects,
            ledger,
            backend,
            retry,
            poll: PollPolicy::default(),
            locks: DashMap::new(),
            clock: Arc::new(Timestamp::now),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self.engine =
            VerificationEngine::new(Arc::clone(&self.objects), Arc::clone(&self.ledger), retry);
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn now(&self) -> Timestamp {
        (self.clock)()
    }

    async fn lock_record(&self, id: CertificateId) -> RecordLock<'_> {
        let mutex = Arc::clone(self.locks.entry(id).or_default().value());
        let guard = mutex.lock_owned().await;
        RecordLock {
            locks: &self.locks,
            id,
            guard: Some(guard),
        }
    }

    async fn load(&self, id: &CertificateId) -> Result<CertificateRecord, RegistryError> {
        self.records
            .find_by_id(id)
            .await?
            .ok_or(RegistryError::NotFound(*id))
    }

    async fn load_owned(
        &self,
        session: &WalletSession,
        id: &CertificateId,
    ) -> Result<CertificateRecord, RegistryError> {
        let record = self.load(id).await?;
        if !record.is_owned_by(&session.address) {
            tracing::warn!(id = %id, address = %session.address, "ownership check failed");
            return Err(RegistryError::Unauthorized {
                id: *id,
                address: session.address.clone(),
            });
        }
        Ok(record)
    }

    async fn save(&self, record: &mut CertificateRecord) -> Result<(), RegistryError> {
        record.touch(self.now());
        self.records.update(record.clone()).await
    }

    // ── upload ───────────────────────────────────────────────────────

    /// Store a certificate file and create its `DRAFT` record.
    ///
    /// Every input check runs before anything is written: unsupported file
    /// type, empty file, bad dates or unencodable metadata fail here.
    pub async fn upload(
        &self,
        session: &WalletSession,
        request: UploadRequest,
    ) -> Result<CertificateRecord, RegistryError> {
        let file_kind = FileKind::from_mime(&request.mime_type)?;
        let content_id = address_of(&request.bytes)?;
        let now = self.now();
        let metadata = request.metadata.complete(now.date())?;
        let commitment = self.backend.compress(&metadata, &content_id, &now)?;
        let expires_at = metadata.expiry_date()?.map(|d| d.end_of_day());

        let locator = self.objects.put(request.bytes).await?;
        let record = CertificateRecord {
            id: CertificateId::new(),
            metadata,
            content_id,
            locator,
            file_kind,
            committed_at: now,
            commitment,
            ledger_reference: None,
            lifecycle: CertificateLifecycle::new(expires_at),
            owner: session.address.clone(),
            created_at: now,
            updated_at: now,
        };
        self.records.insert(record.clone()).await?;

        tracing::info!(
            id = %record.id,
            owner = %record.owner,
            content_id = %record.content_id,
            commitment = %record.commitment,
            "certificate uploaded"
        );
        Ok(record)
    }

    // ── publish ──────────────────────────────────────────────────────

    /// Anchor a record's commitment on the ledger (DRAFT → PUBLISHED).
    ///
    /// Idempotent: publishing an already published record returns it
    /// unchanged without contacting the ledger.
    pub async fn publish(
        &self,
        session: &WalletSession,
        id: CertificateId,
    ) -> Result<CertificateRecord, RegistryError> {
        let _lock = self.lock_record(id).await;
        let mut record = self.load_owned(session, &id).await?;

        if let Some(reference) = &record.ledger_reference {
            tracing::debug!(id = %id, reference = %reference, "already published");
            return Ok(record);
        }
        if record.state() != CertificateState::Draft {
            return Err(LifecycleError::InvalidTransition {
                from: record.state(),
                to: CertificateState::Published,
            }
            .into());
        }

        let ledger = &self.ledger;
        let commitment = &record.commitment;
        let reference = retry_transient(&self.retry, "publish", || async move {
            match ledger.lookup(commitment).await {
                Ok(Some(existing)) => {
                    tracing::info!(reference = %existing, "commitment already anchored");
                    Ok(existing)
                }
                Ok(None) => ledger.publish(commitment).await,
                Err(e) => Err(e),
            }
        })
        .await?;

        record.attach_reference(reference.clone())?;
        record.lifecycle.publish(self.now())?;
        self.save(&mut record).await?;

        tracing::info!(
            id = %id,
            reference = %reference,
            ledger = self.ledger.ledger_id(),
            "certificate published"
        );
        Ok(record)
    }

    // ── confirm ──────────────────────────────────────────────────────

    /// Wait for ledger confirmation and check the anchored entry
    /// (PUBLISHED → VERIFIED, or INVALID if the ledger lost or contradicts
    /// the commitment).
    ///
    /// An `INVALID` outcome is persisted and then reported as
    /// [`RegistryError::Consistency`]. A poll that hits its deadline leaves
    /// the record `PUBLISHED` and reports [`RegistryError::Unresolvable`].
    pub async fn confirm(
        &self,
        session: &WalletSession,
        id: CertificateId,
    ) -> Result<CertificateRecord, RegistryError> {
        let _lock = self.lock_record(id).await;
        let mut record = self.load_owned(session, &id).await?;

        if record.lifecycle.refresh(self.now()) {
            self.save(&mut record).await?;
            return Ok(record);
        }
        match record.state() {
            CertificateState::Draft => {
                return Err(RegistryError::NotPublished {
                    id,
                    state: record.state(),
                })
            }
            CertificateState::Published => {}
            _ => return Ok(record),
        }
        let reference = record
            .ledger_reference
            .clone()
            .ok_or_else(|| RegistryError::Consistency {
                id,
                reason: "published record has no ledger reference".into(),
            })?;

        match await_confirmation(self.ledger.as_ref(), &reference, &self.poll).await? {
            PollOutcome::Confirmed => {
                let commitment = &record.commitment;
                let ledger = &self.ledger;
                let reference = &reference;
                let matches = retry_transient(&self.retry, "verify", || {
                    ledger.verify(reference, commitment)
                })
                .await?;
                if !matches {
                    return self
                        .reject(record, &MismatchReason::LedgerDisagrees.to_string())
                        .await;
                }
                record.lifecycle.confirm(self.now())?;
                self.save(&mut record).await?;
                tracing::info!(id = %id, reference = %reference, "certificate confirmed");
                Ok(record)
            }
            PollOutcome::NotFound => {
                self.reject(record, "published reference not found on ledger")
                    .await
            }
            PollOutcome::TimedOut { last_error } => {
                let reason = match last_error {
                    Some(e) => format!("confirmation deadline passed: {e}"),
                    None => "confirmation deadline passed".into(),
                };
                Err(RegistryError::Unresolvable { id, reason })
            }
        }
    }

    /// Persist INVALID and report the inconsistency.
    async fn reject(
        &self,
        mut record: CertificateRecord,
        reason: &str,
    ) -> Result<CertificateRecord, RegistryError> {
        self.mark_invalid(&mut record, reason).await?;
        Err(RegistryError::Consistency {
            id: record.id,
            reason: reason.to_string(),
        })
    }

    async fn mark_invalid(
        &self,
        record: &mut CertificateRecord,
        reason: &str,
    ) -> Result<(), RegistryError> {
        record.lifecycle.invalidate(self.now(), reason)?;
        self.save(record).await?;
        tracing::error!(
            id = %record.id,
            reference = ?record.ledger_reference,
            ledger = self.ledger.ledger_id(),
            reason,
            "certificate invalidated"
        );
        Ok(())
    }

    // ── verify ───────────────────────────────────────────────────────

    /// Verify a certificate against its stored content and the ledger.
    ///
    /// Anyone may verify. A `PUBLISHED` record whose ledger entry
    /// contradicts its commitment is marked `INVALID`.
    pub async fn verify(&self, id: CertificateId) -> Result<VerificationReport, RegistryError> {
        let mut record = self.get(id).await?;
        let outcome = self.engine.verify(&record).await?;

        let contradicted = matches!(
            outcome,
            VerificationOutcome::Mismatch {
                reason: MismatchReason::LedgerDisagrees
            }
        );
        if contradicted && record.state() == CertificateState::Published {
            let _lock = self.lock_record(id).await;
            record = self.load(&id).await?;
            if record.state() == CertificateState::Published {
                self.mark_invalid(&mut record, &MismatchReason::LedgerDisagrees.to_string())
                    .await?;
            }
        }

        Ok(VerificationReport {
            status: record.effective_state(self.now()),
            record,
            outcome,
        })
    }

    // ── reads ────────────────────────────────────────────────────────

    /// Fetch a record. Expiry is applied and persisted on read.
    pub async fn get(&self, id: CertificateId) -> Result<CertificateRecord, RegistryError> {
        let record = self.load(&id).await?;
        if record.effective_state(self.now()) == record.state() {
            return Ok(record);
        }

        let _lock = self.lock_record(id).await;
        let mut record = self.load(&id).await?;
        if record.lifecycle.refresh(self.now()) {
            self.save(&mut record).await?;
            tracing::info!(id = %id, "certificate expired");
        }
        Ok(record)
    }

    /// Records owned by the session's address, newest first, with expiry
    /// applied to the returned copies.
    pub async fn list_by_owner(
        &self,
        session: &WalletSession,
    ) -> Result<Vec<CertificateRecord>, RegistryError> {
        let now = self.now();
        let mut records = self.records.find_by_owner(&session.address).await?;
        for record in &mut records {
            record.lifecycle.refresh(now);
        }
        Ok(records)
    }

    /// Whether `address` owns certificate `id`. Fails if there is no such
    /// certificate.
    pub async fn verify_ownership(
        &self,
        id: CertificateId,
        address: &OwnerAddress,
    ) -> Result<bool, RegistryError> {
        Ok(self.load(&id).await?.is_owned_by(address))
    }
}
