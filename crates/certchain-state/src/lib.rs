//! # certchain-state: Certificate Lifecycle
//!
//! The state machine governing a certificate from upload to verification
//! or failure. Transitions are methods that consume validated preconditions
//! and append a [`TransitionRecord`]; invalid transitions are errors, not
//! silent no-ops.

pub mod lifecycle;

pub use lifecycle::{CertificateLifecycle, CertificateState, LifecycleError, TransitionRecord};
