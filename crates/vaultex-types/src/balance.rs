//! Custodial balance records.
//!
//! Every (asset, owner) pair has a `total` credited to the owner and a
//! `locked` portion reserved by the owner's open orders selling that asset.
//! `locked <= total` always holds; `available = total - locked`.

use serde::{Deserialize, Serialize};

use crate::{Result, VaultexError};

/// Token amount in base units.
pub type Amount = u128;

/// A single custodial balance entry for an (asset, owner) pair.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceEntry {
    /// Funds held in custody for the owner.
    pub total: Amount,
    /// Part of `total` backing open orders.
    pub locked: Amount,
}

impl BalanceEntry {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Withdrawable / pledgeable amount. Zero for an entry whose `locked`
    /// exceeds `total`, which the mutators never produce.
    #[must_use]
    pub fn available(&self) -> Amount {
        self.total.saturating_sub(self.locked)
    }

    /// Whether this entry has no balance at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total == 0 && self.locked == 0
    }

    /// Increase `total`.
    pub fn credit(&mut self, amount: Amount) -> Result<()> {
        self.total = self
            .total
            .checked_add(amount)
            .ok_or(VaultexError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Decrease `total` out of the available part.
    ///
    /// # Errors
    /// Returns `InsufficientAvailableBalance` if available < amount.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        self.ensure_available(amount)?;
        self.total -= amount;
        Ok(())
    }

    /// Reserve part of the available balance (available -> locked).
    pub fn lock(&mut self, amount: Amount) -> Result<()> {
        self.ensure_available(amount)?;
        self.locked += amount;
        Ok(())
    }

    /// Release a reservation (locked -> available).
    pub fn unlock(&mut self, amount: Amount) -> Result<()> {
        self.ensure_locked(amount)?;
        self.locked -= amount;
        Ok(())
    }

    /// Spend reserved funds: both `locked` and `total` decrease.
    pub fn consume_locked(&mut self, amount: Amount) -> Result<()> {
        self.ensure_locked(amount)?;
        self.locked -= amount;
        self.total -= amount;
        Ok(())
    }

    fn ensure_available(&self, needed: Amount) -> Result<()> {
        let available = self.available();
        if available < needed {
            return Err(VaultexError::InsufficientAvailableBalance { needed, available });
        }
        Ok(())
    }

    fn ensure_locked(&self, needed: Amount) -> Result<()> {
        if self.locked < needed {
            return Err(VaultexError::InsufficientLocked {
                needed,
                locked: self.locked,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_entry_default_is_zero() {
        let entry = BalanceEntry::default();
        assert_eq!(entry.total, 0);
        assert_eq!(entry.locked, 0);
        assert!(entry.is_zero());
    }

    #[test]
    fn lock_reduces_available_only() {
        let mut entry = BalanceEntry::new();
        entry.credit(100).unwrap();
        entry.lock(40).unwrap();
        assert_eq!(entry.total, 100);
        assert_eq!(entry.locked, 40);
        assert_eq!(entry.available(), 60);
    }

    #[test]
    fn over_locked_entry_has_nothing_available() {
        let mut entry = BalanceEntry { total: 1, locked: 5 };
        assert_eq!(entry.available(), 0);
        assert_eq!(
            entry.debit(1),
            Err(VaultexError::InsufficientAvailableBalance {
                needed: 1,
                available: 0
            })
        );
        assert_eq!(entry, BalanceEntry { total: 1, locked: 5 });
    }

    #[test]
    fn debit_cannot_touch_locked_funds() {
        let mut entry = BalanceEntry { total: 100, locked: 80 };
        let err = entry.debit(30).unwrap_err();
        assert_eq!(
            err,
            VaultexError::InsufficientAvailableBalance {
                needed: 30,
                available: 20
            }
        );
        assert_eq!(entry, BalanceEntry { total: 100, locked: 80 });
    }

    #[test]
    fn consume_locked_reduces_both() {
        let mut entry = BalanceEntry { total: 100, locked: 10 };
        entry.consume_locked(10).unwrap();
        assert_eq!(entry, BalanceEntry { total: 90, locked: 0 });
    }

    #[test]
    fn unlock_more_than_locked_fails() {
        let mut entry = BalanceEntry { total: 100, locked: 10 };
        assert!(matches!(
            entry.unlock(11),
            Err(VaultexError::InsufficientLocked { .. })
        ));
    }

    #[test]
    fn credit_overflow_is_reported() {
        let mut entry = BalanceEntry {
            total: Amount::MAX,
            locked: 0,
        };
        assert_eq!(entry.credit(1), Err(VaultexError::ArithmeticOverflow));
    }

    #[test]
    fn balance_entry_serde_roundtrip() {
        let entry = BalanceEntry { total: 12_345, locked: 678 };
        let json = serde_json::to_string(&entry).unwrap();
        let back: BalanceEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
