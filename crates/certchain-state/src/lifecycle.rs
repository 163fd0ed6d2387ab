//! # Certificate Lifecycle State Machine
//!
//! ## States
//!
//! ```text
//! Draft ──▶ Published ──▶ Verified ──▶ Expired (terminal)
//!               │             ▲
//!               │             └── Confirmed & verify = true
//!               ├──▶ Invalid (terminal: NotFound or verify = false)
//!               └──▶ Expired (terminal)
//! ```
//!
//! Expiry is time-based and evaluated lazily: [`CertificateLifecycle::effective_state()`]
//! reports `Expired` as soon as `now` reaches the expiry instant, even if
//! the stored state still says `Verified`. [`CertificateLifecycle::refresh()`]
//! persists that observation.
//!
//! No transition leaves a terminal state, and nothing re-enters `Draft` or
//! `Published`. The only way out of `Verified` is expiry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use certchain_core::Timestamp;

// ─── State ───────────────────────────────────────────────────────────

/// The lifecycle state of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateState {
    /// Content addressed and commitment computed; not yet on the ledger.
    Draft,
    /// Commitment published; ledger confirmation pending.
    Published,
    /// Ledger confirmed the commitment.
    Verified,
    /// Expiry date has passed (terminal).
    Expired,
    /// Ledger lost or contradicts the commitment (terminal).
    Invalid,
}

impl CertificateState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Invalid)
    }

    /// Whether the certificate has a ledger reference in this state.
    pub fn is_published(&self) -> bool {
        !matches!(self, Self::Draft)
    }
}

impl std::fmt::Display for CertificateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Verified => "VERIFIED",
            Self::Expired => "EXPIRED",
            Self::Invalid => "INVALID",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid certificate transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: CertificateState,
        /// Attempted target state.
        to: CertificateState,
    },

    /// Certificate is in a terminal state.
    #[error("certificate is in terminal state {state}")]
    TerminalState {
        /// The terminal state.
        state: CertificateState,
    },
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: CertificateState,
    /// State after the transition.
    pub to_state: CertificateState,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Why the transition happened.
    pub reason: String,
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// A certificate's lifecycle state and transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateLifecycle {
    state: CertificateState,
    expires_at: Option<Timestamp>,
    transitions: Vec<TransitionRecord>,
}

impl CertificateLifecycle {
    /// A new lifecycle in `Draft`. `expires_at` is the first instant at
    /// which the certificate is no longer valid.
    pub fn new(expires_at: Option<Timestamp>) -> Self {
        Self {
            state: CertificateState::Draft,
            expires_at,
            transitions: Vec::new(),
        }
    }

    /// Stored state, without applying expiry.
    pub fn state(&self) -> CertificateState {
        self.state
    }

    /// Expiry instant, if any.
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Ordered transition history.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Whether the stored state is terminal.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the expiry instant has been reached at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(exp) if now >= exp)
    }

    /// State as observed at `now`. Expiry takes precedence over
    /// `Published` and `Verified`.
    pub fn effective_state(&self, now: Timestamp) -> CertificateState {
        match self.state {
            CertificateState::Published | CertificateState::Verified
                if self.is_expired_at(now) =>
            {
                CertificateState::Expired
            }
            s => s,
        }
    }

    /// Publish succeeded (DRAFT → PUBLISHED).
    pub fn publish(&mut self, at: Timestamp) -> Result<(), LifecycleError> {
        self.require_state(CertificateState::Draft, CertificateState::Published)?;
        self.do_transition(CertificateState::Published, at, "commitment published");
        Ok(())
    }

    /// Ledger confirmed and verified the commitment (PUBLISHED → VERIFIED).
    pub fn confirm(&mut self, at: Timestamp) -> Result<(), LifecycleError> {
        self.require_state(CertificateState::Published, CertificateState::Verified)?;
        self.do_transition(CertificateState::Verified, at, "ledger confirmed commitment");
        Ok(())
    }

    /// Ledger lost or contradicts the commitment (PUBLISHED → INVALID).
    pub fn invalidate(&mut self, at: Timestamp, reason: &str) -> Result<(), LifecycleError> {
        self.require_state(CertificateState::Published, CertificateState::Invalid)?;
        self.do_transition(CertificateState::Invalid, at, reason);
        Ok(())
    }

    /// Expiry passed (PUBLISHED or VERIFIED → EXPIRED).
    pub fn expire(&mut self, at: Timestamp) -> Result<(), LifecycleError> {
        if self.state.is_terminal() {
            return Err(LifecycleError::TerminalState { state: self.state });
        }
        if !matches!(
            self.state,
            CertificateState::Published | CertificateState::Verified
        ) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to: CertificateState::Expired,
            });
        }
        self.do_transition(CertificateState::Expired, at, "expiry date passed");
        Ok(())
    }

    /// Persist lazy expiry. Returns `true` if the stored state changed.
    pub fn refresh(&mut self, now: Timestamp) -> bool {
        if self.effective_state(now) == CertificateState::Expired
            && self.state != CertificateState::Expired
        {
            self.do_transition(CertificateState::Expired, now, "expiry date passed");
            return true;
        }
        false
    }

    fn require_state(
        &self,
        expected: CertificateState,
        target: CertificateState,
    ) -> Result<(), LifecycleError> {
        if self.state.is_terminal() {
            return Err(LifecycleError::TerminalState { state: self.state });
        }
        if self.state != expected {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: CertificateState, at: Timestamp, reason: &str) {
        tracing::info!(from = %self.state, to = %to, reason, "certificate transition");
        self.transitions.push(TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: at,
            reason: reason.to_string(),
        });
        self.state = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn t0() -> Timestamp {
        ts("2025-01-01T00:00:00Z")
    }

    fn published(expires_at: Option<Timestamp>) -> CertificateLifecycle {
        let mut lc = CertificateLifecycle::new(expires_at);
        lc.publish(t0()).unwrap();
        lc
    }

    // ── Happy path ───────────────────────────────────────────────────

    #[test]
    fn new_is_draft() {
        let lc = CertificateLifecycle::new(None);
        assert_eq!(lc.state(), CertificateState::Draft);
        assert!(lc.transitions().is_empty());
        assert!(!lc.is_terminal());
    }

    #[test]
    fn draft_to_published_to_verified() {
        let mut lc = published(None);
        assert_eq!(lc.state(), CertificateState::Published);
        lc.confirm(t0()).unwrap();
        assert_eq!(lc.state(), CertificateState::Verified);
        assert_eq!(lc.transitions().len(), 2);
        assert_eq!(lc.transitions()[1].from_state, CertificateState::Published);
        assert_eq!(lc.transitions()[1].to_state, CertificateState::Verified);
    }

    #[test]
    fn published_to_invalid() {
        let mut lc = published(None);
        lc.invalidate(t0(), "ledger reference not found").unwrap();
        assert_eq!(lc.state(), CertificateState::Invalid);
        assert!(lc.is_terminal());
        assert_eq!(lc.transitions()[1].reason, "ledger reference not found");
    }

    // ── Invalid transitions ──────────────────────────────────────────

    #[test]
    fn cannot_confirm_draft() {
        let mut lc = CertificateLifecycle::new(None);
        assert_eq!(
            lc.confirm(t0()),
            Err(LifecycleError::InvalidTransition {
                from: CertificateState::Draft,
                to: CertificateState::Verified,
            })
        );
    }

    #[test]
    fn cannot_publish_twice() {
        let mut lc = published(None);
        assert!(lc.publish(t0()).is_err());
    }

    #[test]
    fn verified_cannot_be_invalidated() {
        let mut lc = published(None);
        lc.confirm(t0()).unwrap();
        assert!(matches!(
            lc.invalidate(t0(), "x"),
            Err(LifecycleError::InvalidTransition { .. })
        ));
        assert_eq!(lc.state(), CertificateState::Verified);
    }

    #[test]
    fn draft_cannot_expire() {
        let mut lc = CertificateLifecycle::new(Some(t0()));
        assert!(lc.expire(t0()).is_err());
    }

    #[test]
    fn terminal_states_reject_everything() {
        let mut lc = published(None);
        lc.invalidate(t0(), "gone").unwrap();
        for result in [
            lc.clone().publish(t0()),
            lc.clone().confirm(t0()),
            lc.clone().expire(t0()),
            lc.invalidate(t0(), "again"),
        ] {
            assert_eq!(
                result,
                Err(LifecycleError::TerminalState {
                    state: CertificateState::Invalid
                })
            );
        }
    }

    // ── Expiry ───────────────────────────────────────────────────────

    #[test]
    fn verified_with_past_expiry_reads_as_expired() {
        let mut lc = published(Some(ts("2025-06-01T00:00:00Z")));
        lc.confirm(t0()).unwrap();
        assert_eq!(
            lc.effective_state(ts("2025-05-31T23:59:59Z")),
            CertificateState::Verified
        );
        assert_eq!(
            lc.effective_state(ts("2025-06-01T00:00:00Z")),
            CertificateState::Expired
        );
        assert_eq!(lc.state(), CertificateState::Verified);
    }

    #[test]
    fn published_with_past_expiry_reads_as_expired() {
        let lc = published(Some(ts("2025-02-01T00:00:00Z")));
        assert_eq!(
            lc.effective_state(ts("2026-01-01T00:00:00Z")),
            CertificateState::Expired
        );
    }

    #[test]
    fn invalid_stays_invalid_after_expiry() {
        let mut lc = published(Some(ts("2025-02-01T00:00:00Z")));
        lc.invalidate(t0(), "mismatch").unwrap();
        assert_eq!(
            lc.effective_state(ts("2026-01-01T00:00:00Z")),
            CertificateState::Invalid
        );
    }

    #[test]
    fn refresh_persists_expiry_once() {
        let mut lc = published(Some(ts("2025-02-01T00:00:00Z")));
        lc.confirm(t0()).unwrap();
        let later = ts("2026-01-01T00:00:00Z");
        assert!(lc.refresh(later));
        assert_eq!(lc.state(), CertificateState::Expired);
        assert!(!lc.refresh(later));
        assert_eq!(lc.transitions().len(), 3);
    }

    #[test]
    fn refresh_without_expiry_is_noop() {
        let mut lc = published(None);
        assert!(!lc.refresh(ts("2100-01-01T00:00:00Z")));
        assert_eq!(lc.state(), CertificateState::Published);
    }

    #[test]
    fn explicit_expire_from_verified() {
        let mut lc = published(None);
        lc.confirm(t0()).unwrap();
        lc.expire(t0()).unwrap();
        assert_eq!(lc.state(), CertificateState::Expired);
    }

    #[test]
    fn display_names() {
        assert_eq!(CertificateState::Draft.to_string(), "DRAFT");
        assert_eq!(CertificateState::Invalid.to_string(), "INVALID");
    }

    #[test]
    fn serde_roundtrip_keeps_history() {
        let mut lc = published(Some(t0()));
        lc.confirm(t0()).unwrap();
        let json = serde_json::to_string(&lc).unwrap();
        let back: CertificateLifecycle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lc);
    }
}
