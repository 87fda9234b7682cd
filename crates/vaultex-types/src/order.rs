//! Order types for the Vaultex order book.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  fill    ┌────────┐
//!   │ OPEN ├─────────▶│ FILLED │
//!   └──┬───┘          └────────┘
//!      │ cancel
//!      ▼
//!   ┌───────────┐
//!   │ CANCELLED │
//!   └───────────┘
//! ```
//!
//! An order is immutable except for its status, which leaves `Open` once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AssetId, OrderId, Result, VaultexError};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Funds for `amount_sell` are locked; anyone may fill.
    Open,
    /// Filled in full. **Irreversible.**
    Filled,
    /// Withdrawn by the maker. Reservation released.
    Cancelled,
}

impl OrderStatus {
    /// Can an order in this status move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Open, Self::Filled | Self::Cancelled))
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A limit order: the maker offers `amount_sell` of `asset_sell` in exchange
/// for `amount_buy` of `asset_buy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// The maker.
    pub owner: AccountId,
    pub asset_buy: AssetId,
    pub amount_buy: Amount,
    pub asset_sell: AssetId,
    pub amount_sell: Amount,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Error to report when this order cannot be cancelled or filled.
    #[must_use]
    pub fn not_open_error(&self) -> VaultexError {
        VaultexError::OrderNotOpen {
            id: self.id,
            status: self.status,
        }
    }

    /// Transition to `Filled`.
    ///
    /// # Errors
    /// Returns `OrderNotOpen` if the order already left `Open`.
    pub fn mark_filled(&mut self) -> Result<()> {
        self.transition(OrderStatus::Filled)
    }

    /// Transition to `Cancelled`.
    ///
    /// # Errors
    /// Returns `OrderNotOpen` if the order already left `Open`.
    pub fn mark_cancelled(&mut self) -> Result<()> {
        self.transition(OrderStatus::Cancelled)
    }

    fn transition(&mut self, target: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(self.not_open_error());
        }
        self.status = target;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(id: u64, owner: AccountId, amount_buy: Amount, amount_sell: Amount) -> Self {
        Self {
            id: OrderId(id),
            owner,
            asset_buy: AssetId([1u8; crate::ADDRESS_LEN]),
            amount_buy,
            asset_sell: AssetId([2u8; crate::ADDRESS_LEN]),
            amount_sell,
            created_at: Utc::now(),
            status: OrderStatus::Open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_order() -> Order {
        Order::dummy(1, AccountId::random(), 10, 10)
    }

    #[test]
    fn status_transitions_valid() {
        assert!(OrderStatus::Open.can_transition_to(OrderStatus::Filled));
        assert!(OrderStatus::Open.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn status_transitions_invalid() {
        assert!(!OrderStatus::Filled.can_transition_to(OrderStatus::Open));
        assert!(!OrderStatus::Filled.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Filled));
        assert!(!OrderStatus::Open.can_transition_to(OrderStatus::Open));
    }

    #[test]
    fn cancelled_cannot_be_filled() {
        let mut order = make_order();
        order.mark_cancelled().unwrap();
        let err = order.mark_filled().unwrap_err();
        assert_eq!(
            err,
            VaultexError::OrderNotOpen {
                id: OrderId(1),
                status: OrderStatus::Cancelled
            }
        );
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn double_fill_blocked() {
        let mut order = make_order();
        order.mark_filled().unwrap();
        assert!(!order.is_open());
        assert!(order.mark_filled().is_err(), "FILLED → FILLED must fail");
    }

    #[test]
    fn status_display() {
        assert_eq!(OrderStatus::Open.to_string(), "OPEN");
        assert_eq!(OrderStatus::Filled.to_string(), "FILLED");
    }

    #[test]
    fn serde_roundtrip() {
        let order = make_order();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
