//! # certchain-core: Foundational Types
//!
//! The leaf of the certchain crate graph. Every other crate depends on
//! `certchain-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `CertificateId`, `IssuerId`,
//!    `OwnerAddress` are validated newtypes. No bare strings for identities.
//!
//! 2. **`CanonicalBytes` newtype.** Every digest over structured data flows
//!    through `CanonicalBytes::new()` (RFC 8785 JCS). No raw
//!    `serde_json::to_vec()` for digests.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC with a `Z` suffix and
//!    second precision, which is exactly what commitments bind to.
//!
//! 4. **Metadata is kept verbatim.** `CertificateMetadata` stores dates as
//!    the strings the issuer supplied; validation happens when the metadata
//!    is canonically encoded, so a malformed date surfaces as an encoding
//!    error instead of being silently normalized.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `certchain-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm, Sha256Accumulator};
pub use error::{CanonicalizationError, CoreError};
pub use identity::{CertificateId, IssuerId, OwnerAddress};
pub use metadata::{CertificateMetadata, MetadataDraft};
pub use temporal::{CalendarDate, Timestamp};
