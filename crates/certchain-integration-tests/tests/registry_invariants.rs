//! # Registry Invariants
//!
//! Cross-crate properties of the certificate service:
//!
//! | Property | Test |
//! |----------|------|
//! | Idempotent publish under concurrency | `concurrent_publishes_*` |
//! | Ownership gate | `ownership_*` |
//! | Expiry precedence | `expiry_*` |
//! | Ledger consistency | `ledger_*` |
//! | Wallet session switching | `account_switch_*` |

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use certchain_core::{MetadataDraft, OwnerAddress, Timestamp};
use certchain_ledger::{MockLedger, PollPolicy, RetryPolicy};
use certchain_registry::{
    CertificateService, ErrorClass, MemoryObjectStore, MemoryRecordStore, RegistryError,
    UploadRequest, VerificationOutcome, WalletEvent, WalletEvents, WalletSession,
};
use certchain_state::CertificateState;
use certchain_zkp::BackendKind;

fn service_with(ledger: Arc<MockLedger>) -> CertificateService {
    CertificateService::new(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(MemoryObjectStore::new()),
        ledger,
        BackendKind::PlainHash.build(),
    )
    .with_retry(RetryPolicy {
        max_retries: 3,
        base_delay_ms: 1,
    })
    .with_poll(PollPolicy {
        interval_ms: 1,
        deadline_ms: 500,
    })
}

fn owner() -> WalletSession {
    WalletSession::new(OwnerAddress::new("0xDEADBEEF").unwrap(), 1)
}

fn upload(bytes: &[u8], issue: &str, expiry: Option<&str>) -> UploadRequest {
    UploadRequest {
        bytes: bytes.to_vec(),
        mime_type: "image/png".into(),
        metadata: MetadataDraft {
            name: Some("Badge".into()),
            issued_to: Some("Grace".into()),
            issue_date: Some(issue.into()),
            expiry_date: expiry.map(str::to_string),
            ..MetadataDraft::default()
        },
    }
}

// ── idempotent publish ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishes_share_one_ledger_entry() {
    let ledger = Arc::new(MockLedger::new("race"));
    let service = Arc::new(service_with(ledger.clone()));
    let record = service
        .upload(&owner(), upload(b"png", "2025-01-01", None))
        .await
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&service);
            let id = record.id;
            tokio::spawn(async move { service.publish(&owner(), id).await })
        })
        .collect();

    let mut references = Vec::new();
    for h in handles {
        references.push(h.await.unwrap().unwrap().ledger_reference.unwrap());
    }
    references.dedup();
    assert_eq!(references.len(), 1);
    assert_eq!(ledger.entry_count(), 1);
    assert_eq!(ledger.publish_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishes_of_different_records_all_land() {
    let ledger = Arc::new(MockLedger::new("parallel"));
    let service = Arc::new(service_with(ledger.clone()));

    let mut ids = Vec::new();
    for i in 0..8u8 {
        let r = service
            .upload(&owner(), upload(&[b'f', i], "2025-01-01", None))
            .await
            .unwrap();
        ids.push(r.id);
    }

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.publish(&owner(), id).await })
        })
        .collect();
    for h in handles {
        assert_eq!(
            h.await.unwrap().unwrap().state(),
            CertificateState::Published
        );
    }
    assert_eq!(ledger.entry_count(), 8);
}

#[tokio::test]
async fn identical_certificates_share_a_commitment_but_not_a_record() {
    let ledger = Arc::new(MockLedger::new("dedup"));
    let service = service_with(ledger.clone());
    let clock = Timestamp::parse("2025-01-01T12:00:00Z").unwrap();
    let service = service.with_clock(move || clock);

    let a = service
        .upload(&owner(), upload(b"same", "2025-01-01", None))
        .await
        .unwrap();
    let b = service
        .upload(&owner(), upload(b"same", "2025-01-01", None))
        .await
        .unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(a.commitment, b.commitment);

    let ra = service.publish(&owner(), a.id).await.unwrap();
    let rb = service.publish(&owner(), b.id).await.unwrap();
    assert_eq!(ra.ledger_reference, rb.ledger_reference);
    assert_eq!(ledger.entry_count(), 1);
}

// ── ownership ────────────────────────────────────────────────────────

#[tokio::test]
async fn ownership_is_case_insensitive_for_hex_addresses() {
    let service = service_with(Arc::new(MockLedger::new("own")));
    let r = service
        .upload(&owner(), upload(b"x", "2025-01-01", None))
        .await
        .unwrap();

    for candidate in ["0xdeadbeef", "0XDEADBEEF", "0xDeadBeef"] {
        let addr = OwnerAddress::new(candidate).unwrap();
        assert!(service.verify_ownership(r.id, &addr).await.unwrap(), "{candidate}");
    }
    let stranger = OwnerAddress::new("0xFEEDFACE").unwrap();
    assert!(!service.verify_ownership(r.id, &stranger).await.unwrap());
}

#[tokio::test]
async fn ownership_gates_every_mutation() {
    let service = service_with(Arc::new(MockLedger::new("own")));
    let r = service
        .upload(&owner(), upload(b"x", "2025-01-01", None))
        .await
        .unwrap();
    let intruder = WalletSession::new(OwnerAddress::new("0xFEEDFACE").unwrap(), 1);

    for err in [
        service.publish(&intruder, r.id).await.unwrap_err(),
        service.confirm(&intruder, r.id).await.unwrap_err(),
    ] {
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        assert_eq!(err.class(), ErrorClass::Unauthorized);
    }
    assert_eq!(service.get(r.id).await.unwrap().state(), CertificateState::Draft);
    assert!(service.list_by_owner(&intruder).await.unwrap().is_empty());
}

#[tokio::test]
async fn account_switch_changes_who_may_mutate() {
    let service = service_with(Arc::new(MockLedger::new("switch")));
    let hub = WalletEvents::new();
    let mut events = hub.subscribe();

    let mut session = owner();
    let r = service
        .upload(&session, upload(b"x", "2025-01-01", None))
        .await
        .unwrap();

    hub.emit(WalletEvent::AccountsChanged(Some(
        OwnerAddress::new("0xFEEDFACE").unwrap(),
    )));
    let event = events.recv().await.unwrap();
    session = session.apply(&event).unwrap();
    assert!(service.publish(&session, r.id).await.is_err());

    hub.emit(WalletEvent::AccountsChanged(Some(owner().address)));
    let event = events.recv().await.unwrap();
    session = session.apply(&event).unwrap();
    service.publish(&session, r.id).await.unwrap();

    events.unsubscribe();
    assert_eq!(hub.subscriber_count(), 0);
}

// ── expiry ───────────────────────────────────────────────────────────

#[tokio::test]
async fn expiry_takes_precedence_over_verified() {
    let now = Arc::new(AtomicI64::new(
        Timestamp::parse("2025-06-01T00:00:00Z").unwrap().epoch_secs(),
    ));
    let clock = Arc::clone(&now);
    let service = service_with(Arc::new(MockLedger::new("expiry"))).with_clock(move || {
        Timestamp::from_epoch_secs(clock.load(Ordering::SeqCst)).unwrap_or_else(|_| Timestamp::now())
    });

    let r = service
        .upload(&owner(), upload(b"x", "2025-01-01", Some("2025-12-31")))
        .await
        .unwrap();
    service.publish(&owner(), r.id).await.unwrap();
    let confirmed = service.confirm(&owner(), r.id).await.unwrap();
    assert_eq!(confirmed.state(), CertificateState::Verified);

    now.store(
        Timestamp::parse("2025-12-31T23:59:59Z").unwrap().epoch_secs(),
        Ordering::SeqCst,
    );
    assert_eq!(service.get(r.id).await.unwrap().state(), CertificateState::Verified);

    now.store(
        Timestamp::parse("2026-01-01T00:00:00Z").unwrap().epoch_secs(),
        Ordering::SeqCst,
    );
    let expired = service.get(r.id).await.unwrap();
    assert_eq!(expired.state(), CertificateState::Expired);

    let report = service.verify(r.id).await.unwrap();
    assert_eq!(report.status, CertificateState::Expired);
    assert_eq!(report.outcome, VerificationOutcome::Verified);

    let republished = service.publish(&owner(), r.id).await.unwrap();
    assert_eq!(republished.ledger_reference, expired.ledger_reference);
}

// ── ledger consistency ───────────────────────────────────────────────

#[tokio::test]
async fn ledger_rollback_invalidates_published_record() {
    let ledger = Arc::new(MockLedger::new("rollback"));
    let service = service_with(ledger.clone());
    let r = service
        .upload(&owner(), upload(b"x", "2025-01-01", None))
        .await
        .unwrap();
    let published = service.publish(&owner(), r.id).await.unwrap();
    assert!(ledger.drop_entry(published.ledger_reference.as_ref().unwrap()));

    let err = service.confirm(&owner(), r.id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Consistency);

    let record = service.get(r.id).await.unwrap();
    assert_eq!(record.state(), CertificateState::Invalid);
    let last = record.lifecycle.transitions().last().unwrap();
    assert_eq!(last.to_state, CertificateState::Invalid);
    assert!(last.reason.contains("not found"));

    // Terminal.
    let again = service.confirm(&owner(), r.id).await.unwrap();
    assert_eq!(again.state(), CertificateState::Invalid);
}

#[tokio::test]
async fn ledger_outage_during_confirm_is_unresolvable_not_invalid() {
    let ledger = Arc::new(MockLedger::new("outage"));
    let service = service_with(ledger.clone());
    let r = service
        .upload(&owner(), upload(b"x", "2025-01-01", None))
        .await
        .unwrap();
    service.publish(&owner(), r.id).await.unwrap();

    ledger.set_available(false);
    let err = service.confirm(&owner(), r.id).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.user_message(), "try again later");
    assert_eq!(service.get(r.id).await.unwrap().state(), CertificateState::Published);

    ledger.set_available(true);
    let record = service.confirm(&owner(), r.id).await.unwrap();
    assert_eq!(record.state(), CertificateState::Verified);
}

#[tokio::test]
async fn verify_before_publish_is_a_lifecycle_error() {
    let service = service_with(Arc::new(MockLedger::new("draft")));
    let r = service
        .upload(&owner(), upload(b"x", "2025-01-01", None))
        .await
        .unwrap();
    let err = service.verify(r.id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Lifecycle);
}
