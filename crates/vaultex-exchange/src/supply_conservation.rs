//! Custodial supply conservation.
//!
//! Invariant checked after every balance-changing operation:
//! ```text
//! ∀ asset: Σ total == Σ deposits - Σ withdrawals
//! ```
//!
//! Only the net amount in custody is tracked. It is bounded by what the
//! custody account holds on the ledger, so it never outgrows an `Amount`
//! no matter how many deposit/withdraw cycles an asset sees.
//!
//! Fills and cancellations move funds between owners (and the fee account)
//! but never create or destroy custodial supply.

use std::collections::{BTreeMap, HashMap};

use vaultex_types::{Amount, AssetId, Result, VaultexError};

/// Net custody of one asset after a deposit or withdrawal, not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a staged supply change does nothing until committed"]
pub struct StagedSupply {
    asset: AssetId,
    expected: Amount,
}

impl StagedSupply {
    /// Expected custodial supply once committed.
    pub fn expected(&self) -> Amount {
        self.expected
    }
}

/// Per-asset running net of what entered and left custody.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    custody: HashMap<AssetId, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `ArithmeticOverflow` if custody would exceed `Amount::MAX`.
    pub fn stage_deposit(&self, asset: AssetId, amount: Amount) -> Result<StagedSupply> {
        let expected = self
            .expected_supply(asset)
            .checked_add(amount)
            .ok_or(VaultexError::ArithmeticOverflow)?;
        Ok(StagedSupply { asset, expected })
    }

    /// # Errors
    /// Returns `InvariantViolation` if more would leave custody than ever
    /// entered it.
    pub fn stage_withdrawal(&self, asset: AssetId, amount: Amount) -> Result<StagedSupply> {
        let current = self.expected_supply(asset);
        let expected = current
            .checked_sub(amount)
            .ok_or_else(|| VaultexError::InvariantViolation {
                reason: format!("withdrawal of {amount} of {asset} exceeds custody {current}"),
            })?;
        Ok(StagedSupply { asset, expected })
    }

    /// Apply a staged change. Infallible.
    pub fn commit(&mut self, staged: StagedSupply) {
        self.custody.insert(staged.asset, staged.expected);
    }

    pub fn record_deposit(&mut self, asset: AssetId, amount: Amount) -> Result<()> {
        let staged = self.stage_deposit(asset, amount)?;
        self.commit(staged);
        Ok(())
    }

    pub fn record_withdrawal(&mut self, asset: AssetId, amount: Amount) -> Result<()> {
        let staged = self.stage_withdrawal(asset, amount)?;
        self.commit(staged);
        Ok(())
    }

    /// Expected custodial supply: deposits - withdrawals.
    #[must_use]
    pub fn expected_supply(&self, asset: AssetId) -> Amount {
        self.custody.get(&asset).copied().unwrap_or(0)
    }

    /// Compare the actual custodial supply with the expected one.
    ///
    /// # Errors
    /// Returns [`VaultexError::InvariantViolation`] if they differ.
    pub fn verify(&self, asset: AssetId, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(VaultexError::InvariantViolation {
                reason: format!(
                    "asset {asset}: custodial supply {actual_supply} != expected {expected}"
                ),
            });
        }
        Ok(())
    }

    /// Every asset that was ever deposited or withdrawn with its expected
    /// supply, in address order.
    #[must_use]
    pub fn tracked_assets(&self) -> BTreeMap<AssetId, Amount> {
        self.custody.iter().map(|(&asset, &amount)| (asset, amount)).collect()
    }
}
