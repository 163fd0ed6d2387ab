//! Confirmation polling with a caller-supplied deadline.
//!
//! Abandoning a poll has no side effects. Transient errors while polling are
//! logged and polling continues until the deadline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{timeout_at, Instant};

use crate::anchor::{LedgerAnchor, LedgerReference, LedgerStatus};
use crate::error::LedgerError;

/// Polling cadence and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay between `resolve` calls, in milliseconds.
    pub interval_ms: u64,
    /// Give up after this many milliseconds.
    pub deadline_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            deadline_ms: 60_000,
        }
    }
}

impl PollPolicy {
    /// Delay between polls.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Overall deadline.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// How a confirmation poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The ledger reports the reference as confirmed.
    Confirmed,
    /// The ledger has no entry for the reference.
    NotFound,
    /// The deadline passed first. `last_error` is the most recent transient
    /// failure, if the ledger was unreachable at the end.
    TimedOut {
        /// Most recent transient error observed.
        last_error: Option<LedgerError>,
    },
}

/// Poll `resolve` until the reference is confirmed or not found, or the
/// deadline passes. The deadline also bounds each `resolve` call in flight.
/// Non-retryable errors end the poll immediately.
pub async fn await_confirmation(
    anchor: &dyn LedgerAnchor,
    reference: &LedgerReference,
    policy: &PollPolicy,
) -> Result<PollOutcome, LedgerError> {
    let deadline = Instant::now() + policy.deadline();
    let mut last_error = None;
    let mut polls = 0u32;

    loop {
        polls += 1;
        let resolved = match timeout_at(deadline, anchor.resolve(reference)).await {
            Ok(resolved) => resolved,
            Err(_) => {
                tracing::warn!(
                    reference = %reference,
                    polls,
                    "confirmation deadline passed during resolve"
                );
                return Ok(PollOutcome::TimedOut { last_error });
            }
        };
        last_error = match resolved {
            Ok(LedgerStatus::Confirmed) => {
                tracing::debug!(reference = %reference, polls, "ledger confirmed");
                return Ok(PollOutcome::Confirmed);
            }
            Ok(LedgerStatus::NotFound) => return Ok(PollOutcome::NotFound),
            Ok(LedgerStatus::Pending) => None,
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    reference = %reference,
                    ledger = anchor.ledger_id(),
                    attempt = polls,
                    "resolve failed while polling: {e}"
                );
                Some(e)
            }
            Err(e) => return Err(e),
        };

        if Instant::now() + policy.interval() > deadline {
            tracing::warn!(reference = %reference, polls, "confirmation deadline passed");
            return Ok(PollOutcome::TimedOut { last_error });
        }
        tokio::time::sleep(policy.interval()).await;
    }
}
