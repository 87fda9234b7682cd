//! The asset-ledger seam.
//!
//! The exchange and the flash-loan orchestrator only ever talk to assets
//! through this trait. [`crate::TokenRegistry`] is the in-process
//! implementation.

use vaultex_types::{AccountId, Amount, AssetId, Result};

/// Named fungible assets with transfer and transfer-on-behalf.
///
/// Every mutating method is all-or-nothing: on `Err` no balance or allowance
/// has changed.
pub trait AssetLedger {
    /// Ledger balance of `owner` in `asset`.
    fn balance_of(&self, asset: AssetId, owner: AccountId) -> Result<Amount>;

    /// Remaining amount `spender` may move out of `owner`'s balance.
    fn allowance(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> Result<Amount>;

    /// `from` pushes `amount` to `to`.
    fn transfer(&mut self, asset: AssetId, from: AccountId, to: AccountId, amount: Amount) -> Result<()>;

    /// `owner` authorizes `spender` to move up to `amount`.
    fn approve(&mut self, asset: AssetId, owner: AccountId, spender: AccountId, amount: Amount) -> Result<()>;

    /// `spender` pulls `amount` from `from` to `to` against its allowance.
    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()>;
}
