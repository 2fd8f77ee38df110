//! Balance change notifications
//!
//! Every structural ledger mutation is published on a bounded broadcast
//! channel. Delivery is best effort: slow subscribers may lag and a send with
//! no subscribers is dropped.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::network::{Hash256, OutPoint};

/// Maximum number of events to buffer per subscriber
const BROADCAST_CAPACITY: usize = 100;

/// A change affecting the spendable balance
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum BalanceEvent {
    /// A confirmed unspent output was consumed
    OutputSpent { outpoint: OutPoint },
    /// An output paying the wallet was recorded
    OutputReceived { outpoint: OutPoint, value: u64 },
    /// A built spend reserved its inputs
    SpendReserved { txid: Hash256 },
    /// A built spend was rolled back
    SpendAbandoned { txid: Hash256 },
}

/// Broadcaster for balance events
#[derive(Debug, Clone)]
pub struct BalanceBroadcaster {
    sender: broadcast::Sender<BalanceEvent>,
}

impl BalanceBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    pub fn broadcast(&self, event: BalanceEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BalanceEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BalanceBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
