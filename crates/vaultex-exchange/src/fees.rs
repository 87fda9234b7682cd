//! Fill fee computation.

use vaultex_types::{AccountId, Amount, ExchangeConfig, Result, VaultexError, constants};

/// Percentage fee charged to the filler, paid in the asset the filler gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    account: AccountId,
    percent: u32,
}

impl FeeSchedule {
    #[must_use]
    pub fn new(config: &ExchangeConfig) -> Self {
        Self {
            account: config.fee_account,
            percent: config.fee_percent,
        }
    }

    /// `amount * percent / 100`, truncated toward zero.
    pub fn fee_for(&self, amount: Amount) -> Result<Amount> {
        let scaled = amount
            .checked_mul(Amount::from(self.percent))
            .ok_or(VaultexError::ArithmeticOverflow)?;
        Ok(scaled / constants::FEE_DENOMINATOR)
    }

    /// Amount plus fee: what the filler must have available.
    pub fn gross(&self, amount: Amount) -> Result<(Amount, Amount)> {
        let fee = self.fee_for(amount)?;
        let gross = amount
            .checked_add(fee)
            .ok_or(VaultexError::ArithmeticOverflow)?;
        Ok((gross, fee))
    }

    #[must_use]
    pub fn account(&self) -> AccountId {
        self.account
    }

    #[must_use]
    pub fn percent(&self) -> u32 {
        self.percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(percent: u32) -> FeeSchedule {
        FeeSchedule::new(&ExchangeConfig::new(AccountId::derive("fees"), percent))
    }

    #[test]
    fn ten_percent_of_one_hundred() {
        assert_eq!(schedule(10).fee_for(100).unwrap(), 10);
        assert_eq!(schedule(10).gross(100).unwrap(), (110, 10));
    }

    #[test]
    fn fee_truncates() {
        // 9 * 10 / 100 = 0.9
        assert_eq!(schedule(10).fee_for(9).unwrap(), 0);
        assert_eq!(schedule(10).fee_for(19).unwrap(), 1);
    }

    #[test]
    fn zero_percent_is_free() {
        assert_eq!(schedule(0).gross(1_000).unwrap(), (1_000, 0));
    }

    #[test]
    fn overflow_is_an_error() {
        assert_eq!(
            schedule(10).fee_for(Amount::MAX),
            Err(VaultexError::ArithmeticOverflow)
        );
    }
}
