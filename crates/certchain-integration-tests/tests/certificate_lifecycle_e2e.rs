//! # Certificate Lifecycle End-to-End
//!
//! Drives the full pipeline over the filesystem stack the CLI uses:
//! filesystem CAS, JSON record store, and a mock ledger with a nonzero
//! confirmation depth.
//!
//! upload → DRAFT → publish → PUBLISHED → confirm → VERIFIED → verify →
//! tamper → MISMATCH

use std::sync::Arc;

use certchain_core::{CertificateId, MetadataDraft, OwnerAddress};
use certchain_crypto::{address_of, BlobLocator, BlobStore};
use certchain_ledger::{MockLedger, PollPolicy, RetryPolicy};
use certchain_registry::{
    CasObjectStore, CertificateService, ErrorClass, JsonFileRecordStore, MismatchReason,
    RecordStore, UploadRequest, VerificationOutcome, WalletSession,
};
use certchain_state::CertificateState;
use certchain_zkp::BackendKind;

const FILE: &[u8] = b"%PDF-1.7\n% certificate of completion\n";

struct Harness {
    _dir: tempfile::TempDir,
    blobs: BlobStore,
    ledger: Arc<MockLedger>,
    service: CertificateService,
}

async fn harness(backend: BackendKind) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let records = JsonFileRecordStore::open(dir.path().join("records.json"))
        .await
        .unwrap();
    let blobs = BlobStore::new(dir.path().join("objects"));
    let ledger = Arc::new(MockLedger::with_confirmations("e2e", 2));
    let service = CertificateService::new(
        Arc::new(records),
        Arc::new(CasObjectStore::new(blobs.clone())),
        ledger.clone(),
        backend.build(),
    )
    .with_retry(RetryPolicy {
        max_retries: 2,
        base_delay_ms: 1,
    })
    .with_poll(PollPolicy {
        interval_ms: 1,
        deadline_ms: 2_000,
    });
    Harness {
        _dir: dir,
        blobs,
        ledger,
        service,
    }
}

fn session() -> WalletSession {
    WalletSession::new(OwnerAddress::new("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap(), 1)
}

fn request() -> UploadRequest {
    UploadRequest {
        bytes: FILE.to_vec(),
        mime_type: "application/pdf".into(),
        metadata: MetadataDraft {
            name: Some("X".into()),
            issued_to: Some("Y".into()),
            issue_date: Some("2025-01-01".into()),
            ..MetadataDraft::default()
        },
    }
}

async fn issue(h: &Harness) -> CertificateId {
    let record = h.service.upload(&session(), request()).await.unwrap();
    assert_eq!(record.state(), CertificateState::Draft);

    let record = h.service.publish(&session(), record.id).await.unwrap();
    assert_eq!(record.state(), CertificateState::Published);

    let record = h.service.confirm(&session(), record.id).await.unwrap();
    assert_eq!(record.state(), CertificateState::Verified);
    record.id
}

#[tokio::test]
async fn upload_publish_confirm_verify_then_tamper() {
    let h = harness(BackendKind::PlainHash).await;
    let id = issue(&h).await;

    let record = h.service.get(id).await.unwrap();
    assert_eq!(record.content_id, address_of(FILE).unwrap());
    assert_eq!(record.metadata.name, "X");
    assert_eq!(record.metadata.issued_to, "Y");
    let transitions: Vec<_> = record
        .lifecycle
        .transitions()
        .iter()
        .map(|t| t.to_state)
        .collect();
    assert_eq!(
        transitions,
        vec![CertificateState::Published, CertificateState::Verified]
    );

    let report = h.service.verify(id).await.unwrap();
    assert_eq!(report.outcome, VerificationOutcome::Verified);

    // Flip one byte of the stored file.
    let blob = BlobLocator::parse(record.locator.as_str()).unwrap();
    let path = h.blobs.path_of(&blob);
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0] ^= 0x01;
    std::fs::write(&path, bytes).unwrap();

    let report = h.service.verify(id).await.unwrap();
    assert_eq!(
        report.outcome,
        VerificationOutcome::Mismatch {
            reason: MismatchReason::ContentChanged
        }
    );
    assert_eq!(
        report.status,
        CertificateState::Verified,
        "a verified record is never un-verified by tampering"
    );
}

#[tokio::test]
async fn succinct_backend_runs_the_same_pipeline() {
    let h = harness(BackendKind::SuccinctProof).await;
    let id = issue(&h).await;
    let report = h.service.verify(id).await.unwrap();
    assert_eq!(report.outcome, VerificationOutcome::Verified);
    assert_eq!(report.record.commitment.scheme, BackendKind::SuccinctProof);
}

#[tokio::test]
async fn records_written_under_one_backend_verify_under_another() {
    let dir = tempfile::tempdir().unwrap();
    let records_path = dir.path().join("records.json");
    let blobs = BlobStore::new(dir.path().join("objects"));
    let ledger = Arc::new(MockLedger::new("shared"));

    let id = {
        let service = CertificateService::new(
            Arc::new(JsonFileRecordStore::open(&records_path).await.unwrap()),
            Arc::new(CasObjectStore::new(blobs.clone())),
            ledger.clone(),
            BackendKind::PlainHash.build(),
        );
        let r = service.upload(&session(), request()).await.unwrap();
        service.publish(&session(), r.id).await.unwrap();
        r.id
    };

    let service = CertificateService::new(
        Arc::new(JsonFileRecordStore::open(&records_path).await.unwrap()),
        Arc::new(CasObjectStore::new(blobs)),
        ledger,
        BackendKind::SuccinctProof.build(),
    );
    let report = service.verify(id).await.unwrap();
    assert_eq!(report.outcome, VerificationOutcome::Verified);
}

#[tokio::test]
async fn rejected_upload_touches_neither_storage_nor_ledger() {
    let h = harness(BackendKind::PlainHash).await;
    let mut req = request();
    req.metadata.issue_date = Some("2025-02-30".into());

    let err = h.service.upload(&session(), req).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Input);
    assert!(h.blobs.list().unwrap().is_empty());
    assert_eq!(h.ledger.publish_calls(), 0);
}

#[tokio::test]
async fn records_survive_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let ledger = Arc::new(MockLedger::new("persist"));
    let objects = Arc::new(CasObjectStore::new(BlobStore::new(dir.path().join("objects"))));

    let id = {
        let service = CertificateService::new(
            Arc::new(JsonFileRecordStore::open(&path).await.unwrap()),
            objects.clone(),
            ledger.clone(),
            BackendKind::PlainHash.build(),
        );
        let r = service.upload(&session(), request()).await.unwrap();
        service.publish(&session(), r.id).await.unwrap();
        r.id
    };

    let store = JsonFileRecordStore::open(&path).await.unwrap();
    let record = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(record.state(), CertificateState::Published);
    assert!(record.ledger_reference.is_some());
    assert!(record.updated_at >= record.created_at);
}
