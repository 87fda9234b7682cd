//! Notifications emitted by the asset ledger, the exchange and the flash
//! loan orchestrator.
//!
//! Events are appended to an [`EventLog`] in the exact order their causing
//! mutations were applied. A failed call appends nothing: the runtime rolls
//! the log back together with the balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, Amount, AssetId, OrderId};

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Asset ledger balance movement.
    Transfer {
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    /// Asset ledger allowance update.
    Approval {
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    },
    TokensDeposited {
        asset: AssetId,
        owner: AccountId,
        amount: Amount,
        new_total: Amount,
    },
    TokensWithdrawn {
        asset: AssetId,
        owner: AccountId,
        amount: Amount,
        new_total: Amount,
    },
    OrderCreated {
        id: OrderId,
        owner: AccountId,
        asset_buy: AssetId,
        amount_buy: Amount,
        asset_sell: AssetId,
        amount_sell: Amount,
        timestamp: DateTime<Utc>,
    },
    OrderCancelled {
        id: OrderId,
        owner: AccountId,
        asset_buy: AssetId,
        amount_buy: Amount,
        asset_sell: AssetId,
        amount_sell: Amount,
        timestamp: DateTime<Utc>,
    },
    Trade {
        id: OrderId,
        filler: AccountId,
        owner: AccountId,
        asset_buy: AssetId,
        amount_buy: Amount,
        asset_sell: AssetId,
        amount_sell: Amount,
        fee: Amount,
        timestamp: DateTime<Utc>,
    },
    FlashLoan {
        borrower: AccountId,
        asset: AssetId,
        amount: Amount,
        premium: Amount,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// Short upper-case name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "TRANSFER",
            Self::Approval { .. } => "APPROVAL",
            Self::TokensDeposited { .. } => "TOKENS_DEPOSITED",
            Self::TokensWithdrawn { .. } => "TOKENS_WITHDRAWN",
            Self::OrderCreated { .. } => "ORDER_CREATED",
            Self::OrderCancelled { .. } => "ORDER_CANCELLED",
            Self::Trade { .. } => "TRADE",
            Self::FlashLoan { .. } => "FLASH_LOAN",
        }
    }
}

/// Append-only, ordered notification sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Number of events so far. Doubles as a cursor for [`EventLog::since`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events appended after `cursor`.
    #[must_use]
    pub fn since(&self, cursor: usize) -> &[Event] {
        self.events.get(cursor..).unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Move every event out, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Drop every event after `cursor`. No-op if the log is shorter.
    pub fn truncate(&mut self, cursor: usize) {
        self.events.truncate(cursor);
    }

    /// Digest of the full sequence. Two logs with the same events in the
    /// same order share a root.
    #[must_use]
    pub fn root(&self) -> [u8; 32] {
        compute_event_root(&self.events)
    }
}

/// SHA-256 over the canonical JSON of each event, length-prefixed.
#[must_use]
pub fn compute_event_root(events: &[Event]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"vaultex:event_root:v1:");
    hasher.update((events.len() as u64).to_le_bytes());

    for event in events {
        // Serializing a plain enum of ids, integers and timestamps cannot fail.
        let bytes = serde_json::to_vec(event).unwrap_or_default();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(amount: Amount) -> Event {
        Event::Transfer {
            asset: AssetId([3u8; 20]),
            from: AccountId::derive("a"),
            to: AccountId::derive("b"),
            amount,
        }
    }

    #[test]
    fn log_preserves_order() {
        let mut log = EventLog::new();
        log.emit(transfer(1));
        log.emit(transfer(2));
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0], transfer(1));
        assert_eq!(log.last(), Some(&transfer(2)));
    }

    #[test]
    fn since_returns_suffix() {
        let mut log = EventLog::new();
        log.emit(transfer(1));
        let cursor = log.len();
        log.emit(transfer(2));
        assert_eq!(log.since(cursor), &[transfer(2)]);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn truncate_restores_earlier_root() {
        let mut log = EventLog::new();
        log.emit(transfer(1));
        let (cursor, root) = (log.len(), log.root());
        log.emit(transfer(2));
        log.emit(transfer(3));

        log.truncate(cursor);
        assert_eq!(log.root(), root);
        log.truncate(10);
        assert_eq!(log.len(), 1);

        assert_eq!(log.drain(), vec![transfer(1)]);
        assert!(log.is_empty());
        assert_eq!(log.root(), EventLog::new().root());
    }

    #[test]
    fn root_is_order_sensitive() {
        let a = compute_event_root(&[transfer(1), transfer(2)]);
        let b = compute_event_root(&[transfer(1), transfer(2)]);
        let c = compute_event_root(&[transfer(2), transfer(1)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(compute_event_root(&[]), a);
    }

    #[test]
    fn event_json_is_keyed_by_variant() {
        let json = serde_json::to_string(&transfer(5)).unwrap();
        assert!(json.starts_with("{\"Transfer\":"));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, transfer(5));
        assert_eq!(back.name(), "TRANSFER");
    }
}
