//! # certchain-crypto: Content Addressing
//!
//! - **ContentAddresser** ([`address_of()`]): a pure function from file
//!   bytes to a fixed-width [`ContentId`].
//! - **Blob CAS** ([`BlobStore`]): a filesystem store keyed by content id,
//!   verifying integrity on every read.
//!
//! Content ids are SHA-256 over the raw bytes. There is no canonicalization
//! step here: certificate files are opaque binaries (PDF or image), so two
//! uploads address the same way exactly when they are byte-identical.

pub mod cas;
pub mod content;
pub mod error;

pub use cas::{BlobLocator, BlobStore};
pub use content::{address_of, ContentId};
pub use error::CryptoError;
