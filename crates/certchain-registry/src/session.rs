//! # Wallet Sessions
//!
//! A [`WalletSession`] is the connected identity that owner-gated
//! operations act on behalf of. It is passed explicitly to each call;
//! there is no ambient "current wallet".
//!
//! Account and chain changes arrive as [`WalletEvent`]s through a
//! [`WalletEvents`] hub. Each listener holds a [`Subscription`] that is
//! released when dropped or explicitly via [`Subscription::unsubscribe`],
//! so a torn-down view never keeps receiving events.

use certchain_core::OwnerAddress;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one lags.
const EVENT_BUFFER: usize = 64;

/// A connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub address: OwnerAddress,
    pub chain_id: u64,
}

impl WalletSession {
    pub fn new(address: OwnerAddress, chain_id: u64) -> Self {
        Self { address, chain_id }
    }

    /// Session after `event`. `None` means the wallet disconnected.
    pub fn apply(&self, event: &WalletEvent) -> Option<WalletSession> {
        match event {
            WalletEvent::AccountsChanged(Some(address)) => {
                Some(Self::new(address.clone(), self.chain_id))
            }
            WalletEvent::AccountsChanged(None) | WalletEvent::Disconnected => None,
            WalletEvent::ChainChanged(chain_id) => Some(Self::new(self.address.clone(), *chain_id)),
        }
    }
}

/// Wallet-side change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Active account switched; `None` if the wallet exposes no account.
    AccountsChanged(Option<OwnerAddress>),
    /// Active chain switched.
    ChainChanged(u64),
    /// Wallet disconnected.
    Disconnected,
}

/// Fan-out hub for wallet events.
#[derive(Debug, Clone)]
pub struct WalletEvents {
    tx: broadcast::Sender<WalletEvent>,
}

impl Default for WalletEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    /// Register a listener.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Deliver `event` to every live subscriber. Returns how many received it.
    pub fn emit(&self, event: WalletEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                tracing::debug!("wallet event dropped: no subscribers");
                0
            }
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live registration on a [`WalletEvents`] hub.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<WalletEvent>,
}

impl Subscription {
    /// Next event, or `None` once the hub is gone.
    ///
    /// A subscriber that falls behind skips the events it missed.
    pub async fn recv(&mut self) -> Option<WalletEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "wallet subscriber lagged, skipping events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stop receiving events.
    pub fn unsubscribe(self) {
        drop(self);
    }
}
