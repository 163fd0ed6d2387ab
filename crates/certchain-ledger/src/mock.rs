//! # Mock Ledger
//!
//! In-memory append-only commitment log for tests and local use.
//!
//! ## Block Model
//!
//! Each `publish` of a new commitment mines one block containing it. Each
//! `resolve` also mines one block, simulating the passage of time between
//! polls, so an entry reaches `Confirmed` once `confirmations` blocks sit on
//! top of it. With the default depth of zero, entries confirm immediately.
//!
//! ## Fault Injection
//!
//! - [`MockLedger::set_available()`]: transport outage.
//! - [`MockLedger::reject_next()`]: refuse the next publish.
//! - [`MockLedger::drop_entry()`]: roll an entry back (reference becomes
//!   `NotFound`).
//! - [`MockLedger::tamper()`]: replace the commitment stored at a reference.
//!
//! This ledger provides no finality guarantees whatsoever.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use certchain_zkp::Commitment;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::anchor::{LedgerAnchor, LedgerReference, LedgerStatus};
use crate::error::LedgerError;

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockEntry {
    /// The anchored commitment.
    pub commitment: Commitment,
    /// Block that contains it.
    pub block: u64,
}

/// Serializable ledger contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockLedgerSnapshot {
    /// Current chain height.
    pub height: u64,
    /// Required confirmation depth.
    pub confirmations: u64,
    /// Entries keyed by reference.
    pub entries: BTreeMap<LedgerReference, MockEntry>,
}

#[derive(Debug)]
struct State {
    height: u64,
    entries: BTreeMap<LedgerReference, MockEntry>,
    by_digest: HashMap<String, LedgerReference>,
    available: bool,
    reject_next: Option<String>,
    publish_calls: u64,
}

impl State {
    fn index(entries: &BTreeMap<LedgerReference, MockEntry>) -> HashMap<String, LedgerReference> {
        entries
            .iter()
            .map(|(r, e)| (e.commitment.digest.to_hex(), r.clone()))
            .collect()
    }
}

/// In-memory mock ledger.
#[derive(Debug)]
pub struct MockLedger {
    ledger_id: String,
    confirmations: u64,
    state: Mutex<State>,
}

impl MockLedger {
    /// A ledger that confirms entries immediately.
    pub fn new(ledger_id: impl Into<String>) -> Self {
        Self::with_confirmations(ledger_id, 0)
    }

    /// A ledger requiring `confirmations` blocks on top of an entry.
    pub fn with_confirmations(ledger_id: impl Into<String>, confirmations: u64) -> Self {
        Self {
            ledger_id: ledger_id.into(),
            confirmations,
            state: Mutex::new(State {
                height: 0,
                entries: BTreeMap::new(),
                by_digest: HashMap::new(),
                available: true,
                reject_next: None,
                publish_calls: 0,
            }),
        }
    }

    /// Rebuild a ledger from a snapshot.
    pub fn from_snapshot(ledger_id: impl Into<String>, snapshot: MockLedgerSnapshot) -> Self {
        let ledger = Self::with_confirmations(ledger_id, snapshot.confirmations);
        {
            let mut st = ledger.state.lock();
            st.by_digest = State::index(&snapshot.entries);
            st.height = snapshot.height;
            st.entries = snapshot.entries;
        }
        ledger
    }

    /// Capture the current contents.
    pub fn snapshot(&self) -> MockLedgerSnapshot {
        let st = self.state.lock();
        MockLedgerSnapshot {
            height: st.height,
            confirmations: self.confirmations,
            entries: st.entries.clone(),
        }
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Refuse the next publish of a new commitment with `reason`.
    pub fn reject_next(&self, reason: impl Into<String>) {
        self.state.lock().reject_next = Some(reason.into());
    }

    /// Roll back an entry. Returns whether it existed.
    pub fn drop_entry(&self, reference: &LedgerReference) -> bool {
        let mut st = self.state.lock();
        match st.entries.remove(reference) {
            Some(entry) => {
                st.by_digest.remove(&entry.commitment.digest.to_hex());
                true
            }
            None => false,
        }
    }

    /// Overwrite the commitment stored at `reference`. Returns whether it existed.
    pub fn tamper(&self, reference: &LedgerReference, commitment: Commitment) -> bool {
        let mut st = self.state.lock();
        let Some(entry) = st.entries.get_mut(reference) else {
            return false;
        };
        let old = std::mem::replace(&mut entry.commitment, commitment);
        let new_hex = entry.commitment.digest.to_hex();
        st.by_digest.remove(&old.digest.to_hex());
        st.by_digest.insert(new_hex, reference.clone());
        true
    }

    /// Mine `n` empty blocks.
    pub fn mine(&self, n: u64) {
        self.state.lock().height += n;
    }

    /// Number of entries on the ledger.
    pub fn entry_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Number of `publish` calls received, including deduplicated ones.
    pub fn publish_calls(&self) -> u64 {
        self.state.lock().publish_calls
    }

    fn unavailable(&self) -> LedgerError {
        LedgerError::Unavailable {
            ledger: self.ledger_id.clone(),
            reason: "simulated outage".into(),
        }
    }
}

#[async_trait]
impl LedgerAnchor for MockLedger {
    fn ledger_id(&self) -> &str {
        &self.ledger_id
    }

    async fn lookup(&self, commitment: &Commitment) -> Result<Option<LedgerReference>, LedgerError> {
        let st = self.state.lock();
        if !st.available {
            return Err(self.unavailable());
        }
        Ok(st.by_digest.get(&commitment.digest.to_hex()).cloned())
    }

    async fn publish(&self, commitment: &Commitment) -> Result<LedgerReference, LedgerError> {
        let mut st = self.state.lock();
        st.publish_calls += 1;
        if !st.available {
            return Err(self.unavailable());
        }
        let hex = commitment.digest.to_hex();
        if let Some(existing) = st.by_digest.get(&hex) {
            tracing::debug!(ledger = %self.ledger_id, reference = %existing, "publish dedup hit");
            return Ok(existing.clone());
        }
        if let Some(reason) = st.reject_next.take() {
            return Err(LedgerError::Rejected {
                ledger: self.ledger_id.clone(),
                reason,
            });
        }

        st.height += 1;
        let block = st.height;
        let reference = LedgerReference::new(format!(
            "{}:{block}:{}",
            self.ledger_id,
            hex.get(..16).unwrap_or(&hex)
        ));
        st.entries.insert(
            reference.clone(),
            MockEntry {
                commitment: commitment.clone(),
                block,
            },
        );
        st.by_digest.insert(hex, reference.clone());
        tracing::info!(ledger = %self.ledger_id, reference = %reference, block, "commitment anchored");
        Ok(reference)
    }

    async fn resolve(&self, reference: &LedgerReference) -> Result<LedgerStatus, LedgerError> {
        let mut st = self.state.lock();
        if !st.available {
            return Err(self.unavailable());
        }
        st.height += 1;
        let height = st.height;
        Ok(match st.entries.get(reference) {
            None => LedgerStatus::NotFound,
            Some(entry) if height - entry.block >= self.confirmations => LedgerStatus::Confirmed,
            Some(_) => LedgerStatus::Pending,
        })
    }

    async fn verify(
        &self,
        reference: &LedgerReference,
        commitment: &Commitment,
    ) -> Result<bool, LedgerError> {
        let st = self.state.lock();
        if !st.available {
            return Err(self.unavailable());
        }
        Ok(st
            .entries
            .get(reference)
            .is_some_and(|e| &e.commitment == commitment))
    }
}
