//! # certchain-registry: Certificate Registry
//!
//! Wires the pipeline together:
//!
//! ```text
//! upload ─▶ address_of ─▶ compress ─▶ ObjectStore.put ─▶ RecordStore.insert   (Draft)
//! publish ─▶ LedgerAnchor.lookup / publish                                   (Published)
//! confirm ─▶ await_confirmation ─▶ LedgerAnchor.verify                        (Verified | Invalid)
//! verify  ─▶ ObjectStore.get ─▶ address_of ─▶ compress ─▶ compare ─▶ LedgerAnchor.verify
//! ```
//!
//! Storage is consumed through the [`RecordStore`] and [`ObjectStore`]
//! traits. In-memory implementations back tests; [`JsonFileRecordStore`]
//! and [`CasObjectStore`] back the CLI.
//!
//! Owner-gated operations take an explicit [`WalletSession`].

pub mod engine;
pub mod error;
pub mod objects;
pub mod record;
pub mod records;
pub mod service;
pub mod session;
pub mod share;

pub use engine::{MismatchReason, VerificationEngine, VerificationOutcome};
pub use error::{ErrorClass, RegistryError};
pub use objects::{CasObjectStore, MemoryObjectStore, ObjectLocator, ObjectStore};
pub use record::{CertificateRecord, FileKind};
pub use records::{JsonFileRecordStore, MemoryRecordStore, RecordStore};
pub use service::{CertificateService, UploadRequest, VerificationReport};
pub use session::{Subscription, WalletEvent, WalletEvents, WalletSession};
pub use share::{qr_svg, share_link, QR_DIMENSION};
