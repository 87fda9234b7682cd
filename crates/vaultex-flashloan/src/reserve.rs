//! The lending-reserve seam.
//!
//! A reserve is one ledger account that may also hold funds on behalf of
//! others (the exchange's custody account holds every depositor's balance).
//! Only the reserve's *net* position, ledger holdings minus what it owes,
//! counts when checking repayment.

use vaultex_types::{AccountId, Amount, AssetId, Event, Result};

/// Snapshot of a reserve account in one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservePosition {
    /// Ledger balance of the reserve account.
    pub held: Amount,
    /// Liabilities to depositors, included in `held`.
    pub owed: Amount,
}

impl ReservePosition {
    #[must_use]
    pub fn new(held: Amount, owed: Amount) -> Self {
        Self { held, owed }
    }

    /// How much of a `lent` amount came back between `before` and `self`,
    /// measured on `held - owed`:
    ///
    /// ```text
    /// returned = lent + Δheld - Δowed
    /// ```
    ///
    /// Stays in `Amount` so custody anywhere in its range is handled. A
    /// result that would be negative is zero, and sums past `Amount::MAX`
    /// saturate, which can only understate repayment.
    #[must_use]
    pub fn returned_since(&self, before: &Self, lent: Amount) -> Amount {
        let inflow = lent
            .saturating_add(self.held.saturating_sub(before.held))
            .saturating_add(before.owed.saturating_sub(self.owed));
        let outflow = before
            .held
            .saturating_sub(self.held)
            .saturating_add(self.owed.saturating_sub(before.owed));
        inflow.saturating_sub(outflow)
    }
}

/// What the orchestrator needs from the world it lends out of.
pub trait LendingReserve {
    /// Ledger account loans are paid from and repaid to.
    fn reserve_account(&self) -> AccountId;

    /// Current position of the reserve in `asset`, read fresh on each call.
    fn reserve_position(&self, asset: AssetId) -> Result<ReservePosition>;

    /// Move `amount` of `asset` from the reserve account to `to`.
    fn disburse(&mut self, asset: AssetId, to: AccountId, amount: Amount) -> Result<()>;

    /// Append a `FlashLoan` notification.
    fn record_loan(&mut self, event: Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returned_counts_holdings_net_of_liabilities() {
        let before = ReservePosition::new(100, 40);
        // 30 lent out, 30 paid back plus a premium of 2.
        assert_eq!(ReservePosition::new(102, 40).returned_since(&before, 30), 32);
        // Nothing came back.
        assert_eq!(ReservePosition::new(70, 40).returned_since(&before, 30), 0);
        // Paid back as a deposit: holdings and liabilities both grow.
        assert_eq!(ReservePosition::new(100, 70).returned_since(&before, 30), 0);
        // Borrower withdrew their own deposit of 10 and repaid in full.
        assert_eq!(ReservePosition::new(90, 30).returned_since(&before, 30), 30);
    }

    #[test]
    fn returned_handles_full_range_custody() {
        let max = Amount::MAX;
        let before = ReservePosition::new(max, max - 5);
        assert_eq!(ReservePosition::new(max, max - 5).returned_since(&before, max), max);
        assert_eq!(ReservePosition::new(max - 1, max - 5).returned_since(&before, max), max - 1);
        assert_eq!(ReservePosition::new(0, max - 5).returned_since(&before, max), 0);
        assert_eq!(ReservePosition::new(max, 0).returned_since(&before, 1), max - 4);
    }
}
