//! # certchain-zkp: Commitment Compression
//!
//! Folds certificate metadata, a content id and a timestamp into a single
//! compact [`Commitment`]. The commitment is what gets anchored on the
//! ledger; the certificate itself never leaves content-addressed storage.
//!
//! ## Architecture
//!
//! - [`encoding`] produces the canonical commitment input: JCS bytes with
//!   a fixed field set, absent optionals as `null`, UTC timestamps.
//! - [`CommitmentBackend`] is the capability interface (`compress` /
//!   `verify`). Backends are selected at runtime through [`BackendKind`].
//! - [`HashBackend`] is the plain-hash backend: domain-separated SHA-256
//!   over the canonical input.
//! - [`SuccinctProofBackend`] routes the same input through a
//!   [`ProofSystem`]. Only [`MockProofSystem`] ships today; it is
//!   transparent and provides no zero-knowledge guarantees.
//!
//! Both backends are deterministic: identical logical inputs yield the
//! identical commitment, and any change to any field changes it.

pub mod backend;
pub mod commitment;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod mock;
pub mod succinct;
pub mod traits;

pub use backend::{BackendKind, CommitmentBackend};
pub use commitment::Commitment;
pub use encoding::{commitment_input, encode_commitment_input};
pub use error::CommitmentError;
pub use hash::HashBackend;
pub use mock::MockProofSystem;
pub use succinct::SuccinctProofBackend;
pub use traits::{ProofError, ProofSystem};
