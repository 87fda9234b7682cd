//! Custodial balance table.
//!
//! Tracks per-(asset, owner) balances with total/locked accounting. Changes
//! are expressed as [`Posting`]s and applied in two phases: [`BalanceBook::stage`]
//! validates a whole batch against scratch copies, and
//! [`BalanceBook::commit`] writes the result back. Between the two the book is
//! untouched, so an operation can run external steps (ledger transfers) after
//! validation and still leave no trace if those fail.

use std::collections::HashMap;

use vaultex_types::{AccountId, Amount, AssetId, BalanceEntry, Result, VaultexError};

/// What a posting does to a balance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingKind {
    /// `total += amount`.
    Credit,
    /// `total -= amount`, out of the available part.
    Debit,
    /// available -> locked.
    Lock,
    /// locked -> available.
    Unlock,
    /// `locked -= amount` and `total -= amount`.
    ConsumeLocked,
}

/// One balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub asset: AssetId,
    pub owner: AccountId,
    pub kind: PostingKind,
    pub amount: Amount,
}

impl Posting {
    #[must_use]
    pub fn credit(asset: AssetId, owner: AccountId, amount: Amount) -> Self {
        Self::new(asset, owner, PostingKind::Credit, amount)
    }

    #[must_use]
    pub fn debit(asset: AssetId, owner: AccountId, amount: Amount) -> Self {
        Self::new(asset, owner, PostingKind::Debit, amount)
    }

    #[must_use]
    pub fn lock(asset: AssetId, owner: AccountId, amount: Amount) -> Self {
        Self::new(asset, owner, PostingKind::Lock, amount)
    }

    #[must_use]
    pub fn unlock(asset: AssetId, owner: AccountId, amount: Amount) -> Self {
        Self::new(asset, owner, PostingKind::Unlock, amount)
    }

    #[must_use]
    pub fn consume_locked(asset: AssetId, owner: AccountId, amount: Amount) -> Self {
        Self::new(asset, owner, PostingKind::ConsumeLocked, amount)
    }

    fn new(asset: AssetId, owner: AccountId, kind: PostingKind, amount: Amount) -> Self {
        Self {
            asset,
            owner,
            kind,
            amount,
        }
    }

    fn apply_to(&self, entry: &mut BalanceEntry) -> Result<()> {
        match self.kind {
            PostingKind::Credit => entry.credit(self.amount),
            PostingKind::Debit => entry.debit(self.amount),
            PostingKind::Lock => entry.lock(self.amount),
            PostingKind::Unlock => entry.unlock(self.amount),
            PostingKind::ConsumeLocked => entry.consume_locked(self.amount),
        }
    }
}

/// Validated result of a posting batch, ready to [`BalanceBook::commit`].
#[derive(Debug, Clone)]
#[must_use = "staged balances do nothing until committed"]
pub struct StagedBalances {
    entries: HashMap<(AssetId, AccountId), BalanceEntry>,
    /// Post-commit sum of `total` for every asset the batch touched.
    supply: HashMap<AssetId, Amount>,
}

impl StagedBalances {
    /// Post-commit balance of an (asset, owner) pair touched by the batch.
    #[must_use]
    pub fn get(&self, asset: AssetId, owner: AccountId) -> Option<BalanceEntry> {
        self.entries.get(&(asset, owner)).copied()
    }
}

/// The exchange's custodial balance table.
///
/// Source of truth for what each depositor owns inside the exchange. Zero
/// entries are dropped, so iteration only sees live balances.
#[derive(Debug, Clone, Default)]
pub struct BalanceBook {
    balances: HashMap<(AssetId, AccountId), BalanceEntry>,
    /// Running `Σ total` per asset.
    supply: HashMap<AssetId, Amount>,
}

impl BalanceBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `postings` in order against scratch copies of the affected
    /// entries. The book itself is not modified.
    ///
    /// # Errors
    /// The first posting that would break `locked <= total` (or overflow)
    /// rejects the whole batch, as does an asset total past `Amount::MAX`.
    pub fn stage(&self, postings: &[Posting]) -> Result<StagedBalances> {
        let mut entries: HashMap<(AssetId, AccountId), BalanceEntry> = HashMap::new();
        for posting in postings {
            let entry = entries
                .entry((posting.asset, posting.owner))
                .or_insert_with(|| self.balance(posting.asset, posting.owner));
            posting.apply_to(entry)?;
        }

        // Per asset: (old totals of touched entries, their new totals).
        let mut touched: HashMap<AssetId, (Amount, Amount)> = HashMap::new();
        for (&(asset, owner), entry) in &entries {
            let (removed, added) = touched.entry(asset).or_default();
            *removed += self.balance(asset, owner).total;
            *added = added
                .checked_add(entry.total)
                .ok_or(VaultexError::ArithmeticOverflow)?;
        }
        let mut supply = HashMap::with_capacity(touched.len());
        for (asset, (removed, added)) in touched {
            let sum = self
                .total_supply(asset)
                .checked_sub(removed)
                .and_then(|rest| rest.checked_add(added))
                .ok_or(VaultexError::ArithmeticOverflow)?;
            supply.insert(asset, sum);
        }
        Ok(StagedBalances { entries, supply })
    }

    /// Write a staged batch back. Infallible.
    pub fn commit(&mut self, staged: StagedBalances) {
        for (asset, sum) in staged.supply {
            if sum == 0 {
                self.supply.remove(&asset);
            } else {
                self.supply.insert(asset, sum);
            }
        }
        for (key, entry) in staged.entries {
            if entry.is_zero() {
                self.balances.remove(&key);
            } else {
                self.balances.insert(key, entry);
            }
        }
    }

    /// Stage and commit in one step.
    pub fn apply(&mut self, postings: &[Posting]) -> Result<()> {
        let staged = self.stage(postings)?;
        self.commit(staged);
        Ok(())
    }

    /// Balance of an (asset, owner) pair; zero if never touched.
    #[must_use]
    pub fn balance(&self, asset: AssetId, owner: AccountId) -> BalanceEntry {
        self.balances
            .get(&(asset, owner))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of `total` over all owners of `asset`: what the exchange owes its
    /// depositors.
    #[must_use]
    pub fn total_supply(&self, asset: AssetId) -> Amount {
        self.supply.get(&asset).copied().unwrap_or(0)
    }

    /// Live `(asset, owner, entry)` triples, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (AssetId, AccountId, BalanceEntry)> + '_ {
        self.balances
            .iter()
            .map(|(&(asset, owner), &entry)| (asset, owner, entry))
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (AssetId, AccountId) {
        (AssetId::random(), AccountId::random())
    }

    #[test]
    fn credit_increases_total() {
        let mut book = BalanceBook::new();
        let (asset, user) = ids();
        book.apply(&[Posting::credit(asset, user, 1000)]).unwrap();
        let bal = book.balance(asset, user);
        assert_eq!(bal.total, 1000);
        assert_eq!(bal.locked, 0);
    }

    #[test]
    fn lock_keeps_total() {
        let mut book = BalanceBook::new();
        let (asset, user) = ids();
        book.apply(&[Posting::credit(asset, user, 1000), Posting::lock(asset, user, 400)])
            .unwrap();
        let bal = book.balance(asset, user);
        assert_eq!(bal.total, 1000);
        assert_eq!(bal.locked, 400);
        assert_eq!(bal.available(), 600);
    }

    #[test]
    fn failed_batch_changes_nothing() {
        let mut book = BalanceBook::new();
        let (asset, user) = ids();
        let other = AccountId::random();
        book.apply(&[Posting::credit(asset, user, 100)]).unwrap();

        // The credit to `other` comes first but must not survive the failing debit.
        let err = book
            .apply(&[Posting::credit(asset, other, 50), Posting::debit(asset, user, 200)])
            .unwrap_err();
        assert!(matches!(err, VaultexError::InsufficientAvailableBalance { .. }));
        assert_eq!(book.balance(asset, user).total, 100);
        assert!(book.balance(asset, other).is_zero());
    }

    #[test]
    fn postings_see_earlier_postings_in_batch() {
        let book = BalanceBook::new();
        let (asset, user) = ids();
        let staged = book
            .stage(&[Posting::credit(asset, user, 10), Posting::debit(asset, user, 10)])
            .unwrap();
        assert_eq!(staged.get(asset, user), Some(BalanceEntry::default()));
    }

    #[test]
    fn stage_does_not_mutate_until_commit() {
        let mut book = BalanceBook::new();
        let (asset, user) = ids();
        let staged = book.stage(&[Posting::credit(asset, user, 5)]).unwrap();
        assert!(book.balance(asset, user).is_zero());
        book.commit(staged);
        assert_eq!(book.balance(asset, user).total, 5);
    }

    #[test]
    fn consume_locked_reduces_both() {
        let mut book = BalanceBook::new();
        let (asset, user) = ids();
        book.apply(&[Posting::credit(asset, user, 1000), Posting::lock(asset, user, 500)])
            .unwrap();
        book.apply(&[Posting::consume_locked(asset, user, 500)]).unwrap();
        let bal = book.balance(asset, user);
        assert_eq!(bal.total, 500);
        assert_eq!(bal.locked, 0);
    }

    #[test]
    fn unlock_restores_available() {
        let mut book = BalanceBook::new();
        let (asset, user) = ids();
        book.apply(&[Posting::credit(asset, user, 10), Posting::lock(asset, user, 10)])
            .unwrap();
        book.apply(&[Posting::unlock(asset, user, 10)]).unwrap();
        assert_eq!(book.balance(asset, user).available(), 10);
    }

    #[test]
    fn zero_entries_are_dropped() {
        let mut book = BalanceBook::new();
        let (asset, user) = ids();
        book.apply(&[Posting::credit(asset, user, 10)]).unwrap();
        book.apply(&[Posting::debit(asset, user, 10)]).unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn total_supply_sums_all_owners() {
        let mut book = BalanceBook::new();
        let asset = AssetId::random();
        let (u1, u2) = (AccountId::random(), AccountId::random());
        book.apply(&[
            Posting::credit(asset, u1, 1000),
            Posting::credit(asset, u2, 500),
            Posting::lock(asset, u1, 300),
        ])
        .unwrap();
        assert_eq!(book.total_supply(asset), 1500);
        assert_eq!(book.total_supply(AssetId::random()), 0);

        book.apply(&[Posting::consume_locked(asset, u1, 300), Posting::credit(asset, u2, 300)])
            .unwrap();
        assert_eq!(book.total_supply(asset), 1500);
        book.apply(&[Posting::debit(asset, u1, 700), Posting::debit(asset, u2, 800)])
            .unwrap();
        assert_eq!(book.total_supply(asset), 0);
        assert!(book.is_empty());
    }

    #[test]
    fn supply_past_max_rejected_across_owners() {
        let mut book = BalanceBook::new();
        let asset = AssetId::random();
        let (u1, u2) = (AccountId::random(), AccountId::random());
        book.apply(&[Posting::credit(asset, u1, Amount::MAX)]).unwrap();

        let err = book.stage(&[Posting::credit(asset, u2, 1)]).unwrap_err();
        assert_eq!(err, VaultexError::ArithmeticOverflow);
        assert_eq!(book.total_supply(asset), Amount::MAX);

        // Moving the whole supply between owners stays in range.
        book.apply(&[Posting::debit(asset, u1, Amount::MAX), Posting::credit(asset, u2, Amount::MAX)])
            .unwrap();
        assert_eq!(book.total_supply(asset), Amount::MAX);
        assert_eq!(book.balance(asset, u2).total, Amount::MAX);
    }
}
