//! Order table.
//!
//! Orders are keyed by a monotonic [`OrderId`] starting at 1. Ids are only
//! consumed by [`OrderBook::insert`], so a rejected `make_order` never burns
//! one. Orders are never removed; filled and cancelled orders stay queryable.
//!
//! The book also keeps the running sum of `amount_sell` over open orders per
//! (owner, asset), so reservation lookups do not scan the order history.

use std::collections::{BTreeMap, HashMap};

use vaultex_types::{AccountId, Amount, AssetId, Order, OrderId, Result, VaultexError};

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: BTreeMap<OrderId, Order>,
    /// Id of the most recently inserted order (`OrderId(0)` when empty).
    last_id: OrderId,
    /// Open `amount_sell` per (owner, asset sold). Zero entries are dropped.
    reserved: HashMap<(AccountId, AssetId), Amount>,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted order will receive.
    #[must_use]
    pub fn next_id(&self) -> OrderId {
        self.last_id.next()
    }

    /// Store a new order. Its id must be [`Self::next_id`].
    ///
    /// # Errors
    /// Returns `InvalidOrder` if the id is out of sequence and
    /// `ArithmeticOverflow` if the owner's reservation would overflow.
    pub fn insert(&mut self, order: Order) -> Result<()> {
        let expected = self.next_id();
        if order.id != expected {
            return Err(VaultexError::InvalidOrder {
                reason: format!("expected id {expected}, got {}", order.id),
            });
        }
        if order.is_open() {
            let key = (order.owner, order.asset_sell);
            let reserved = self
                .locked_by(order.owner, order.asset_sell)
                .checked_add(order.amount_sell)
                .ok_or(VaultexError::ArithmeticOverflow)?;
            if reserved > 0 {
                self.reserved.insert(key, reserved);
            }
        }
        self.last_id = order.id;
        self.orders.insert(order.id, order);
        Ok(())
    }

    /// Look up an order.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if the id was never allocated.
    pub fn get(&self, id: OrderId) -> Result<&Order> {
        self.orders.get(&id).ok_or(VaultexError::OrderNotFound(id))
    }

    /// Overwrite an existing order with its updated copy.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if the id was never allocated.
    pub fn replace(&mut self, order: Order) -> Result<()> {
        let slot = self
            .orders
            .get_mut(&order.id)
            .ok_or(VaultexError::OrderNotFound(order.id))?;
        let reserve = order
            .is_open()
            .then_some((order.owner, order.asset_sell, order.amount_sell));
        let previous = std::mem::replace(slot, order);
        if previous.is_open() {
            self.release(previous.owner, previous.asset_sell, previous.amount_sell);
        }
        if let Some((owner, asset, amount)) = reserve {
            let entry = self.reserved.entry((owner, asset)).or_default();
            // Bounded by the reservation just released.
            *entry = entry.saturating_add(amount);
            if *entry == 0 {
                self.reserved.remove(&(owner, asset));
            }
        }
        Ok(())
    }

    fn release(&mut self, owner: AccountId, asset: AssetId, amount: Amount) {
        let key = (owner, asset);
        if let Some(entry) = self.reserved.get_mut(&key) {
            *entry = entry.saturating_sub(amount);
            if *entry == 0 {
                self.reserved.remove(&key);
            }
        }
    }

    /// Number of orders ever created (the last allocated id).
    #[must_use]
    pub fn count(&self) -> u64 {
        self.last_id.0
    }

    /// Open orders, ascending by id.
    pub fn open_orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.values().filter(|o| o.is_open())
    }

    /// Every order made by `owner`, ascending by id.
    pub fn orders_by(&self, owner: AccountId) -> impl Iterator<Item = &Order> + '_ {
        self.orders.values().filter(move |o| o.owner == owner)
    }

    /// Sum of `amount_sell` over `owner`'s open orders selling `asset`.
    /// Always equals that owner's `locked` balance in `asset`.
    #[must_use]
    pub fn locked_by(&self, owner: AccountId, asset: AssetId) -> Amount {
        self.reserved.get(&(owner, asset)).copied().unwrap_or(0)
    }

    /// Every (owner, asset) pair with a non-zero reservation.
    pub fn reservations(&self) -> impl Iterator<Item = (AccountId, AssetId, Amount)> + '_ {
        self.reserved
            .iter()
            .map(|(&(owner, asset), &amount)| (owner, asset, amount))
    }
}
