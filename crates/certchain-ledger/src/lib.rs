//! # certchain-ledger: Ledger Anchoring
//!
//! The only crate in the workspace that touches network state. A
//! [`LedgerAnchor`] publishes a [`Commitment`](certchain_zkp::Commitment)
//! to an append-only public log and later resolves and validates it.
//!
//! ## Implementations
//!
//! - [`MockLedger`]: in-memory, with confirmation depth and fault
//!   injection (unavailability, rejection, rollback, tampering). Its state
//!   can be snapshotted to JSON, which the CLI uses as a local ledger.
//! - [`RpcLedger`]: JSON-RPC 2.0 over HTTPS via `reqwest`.
//!
//! ## Failure Policy
//!
//! Transport failures surface as [`LedgerError::Unavailable`] and are
//! retried by the caller through [`retry_transient()`]. Refusals and data
//! mismatches are never retried. Confirmation polling is bounded by a
//! caller-supplied deadline ([`await_confirmation()`]); running out of time
//! is reported as [`PollOutcome::TimedOut`], never as `NotFound`.

pub mod anchor;
pub mod config;
pub mod error;
pub mod mock;
pub mod poll;
pub mod retry;
pub mod rpc;

pub use anchor::{LedgerAnchor, LedgerReference, LedgerStatus};
pub use config::{ConfigError, LedgerConfig};
pub use error::LedgerError;
pub use mock::{MockLedger, MockLedgerSnapshot};
pub use poll::{await_confirmation, PollOutcome, PollPolicy};
pub use retry::{retry_transient, RetryPolicy};
pub use rpc::RpcLedger;
