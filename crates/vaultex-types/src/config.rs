//! Configuration types for the exchange, flash loans and asset ledgers.
//!
//! All configuration is fixed at construction. Loaded from JSON with
//! [`WorldConfig::from_json_str`] and checked with `validate()`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, Result, VaultexError, constants, units};

/// Exchange fee policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Receives the fee of every fill.
    pub fee_account: AccountId,
    /// Percent of the filler's outgoing amount, integer.
    pub fee_percent: u32,
}

impl ExchangeConfig {
    #[must_use]
    pub fn new(fee_account: AccountId, fee_percent: u32) -> Self {
        Self {
            fee_account,
            fee_percent,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fee_percent > constants::MAX_FEE_PERCENT {
            return Err(VaultexError::Configuration(format!(
                "fee_percent {} exceeds {}",
                self.fee_percent,
                constants::MAX_FEE_PERCENT
            )));
        }
        if self.fee_account.is_zero() {
            return Err(VaultexError::Configuration(
                "fee_account must not be the zero account".into(),
            ));
        }
        Ok(())
    }
}

/// How much a flash-loan borrower pays on top of the principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumPolicy {
    /// Fixed amount per loan, in base units.
    Absolute(Amount),
    /// Fraction of the principal in basis points, rounded up.
    BasisPoints(u32),
}

impl PremiumPolicy {
    /// Premium owed for a loan of `principal`.
    pub fn premium_for(&self, principal: Amount) -> Result<Amount> {
        match *self {
            Self::Absolute(amount) => Ok(amount),
            Self::BasisPoints(bps) => {
                let scaled = principal
                    .checked_mul(Amount::from(bps))
                    .ok_or(VaultexError::ArithmeticOverflow)?;
                Ok(scaled.div_ceil(constants::BASIS_POINTS_DENOMINATOR))
            }
        }
    }
}

impl Default for PremiumPolicy {
    fn default() -> Self {
        Self::Absolute(0)
    }
}

/// Flash-loan policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashLoanConfig {
    #[serde(default)]
    pub premium: PremiumPolicy,
}

impl FlashLoanConfig {
    pub fn validate(&self) -> Result<()> {
        if let PremiumPolicy::BasisPoints(bps) = self.premium {
            if bps > constants::MAX_PREMIUM_BPS {
                return Err(VaultexError::Configuration(format!(
                    "premium {bps} bps exceeds {}",
                    constants::MAX_PREMIUM_BPS
                )));
            }
        }
        Ok(())
    }
}

/// One fungible asset to deploy. `total_supply` is in human units and is
/// minted to the deployer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    pub total_supply: Decimal,
}

fn default_decimals() -> u32 {
    constants::DEFAULT_DECIMALS
}

impl TokenConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, total_supply: Decimal) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: constants::DEFAULT_DECIMALS,
            total_supply,
        }
    }

    /// Total supply scaled to base units.
    pub fn supply_in_base_units(&self) -> Result<Amount> {
        units::parse_units(self.total_supply, self.decimals)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(VaultexError::Configuration("token symbol is empty".into()));
        }
        self.supply_in_base_units().map(|_| ())
    }
}

/// Everything needed to bootstrap a world: who deploys, which assets exist,
/// and the exchange / flash-loan policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub deployer: AccountId,
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub flash_loan: FlashLoanConfig,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

impl WorldConfig {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.deployer.is_zero() {
            return Err(VaultexError::Configuration(
                "deployer must not be the zero account".into(),
            ));
        }
        self.exchange.validate()?;
        self.flash_loan.validate()?;
        for token in &self.tokens {
            token.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_percent_bound() {
        let cfg = ExchangeConfig::new(AccountId::derive("fee"), 101);
        assert!(matches!(cfg.validate(), Err(VaultexError::Configuration(_))));
        let cfg = ExchangeConfig::new(AccountId::derive("fee"), 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_fee_account_rejected() {
        let cfg = ExchangeConfig::new(AccountId::ZERO, 10);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn premium_policies() {
        assert_eq!(PremiumPolicy::default().premium_for(1_000).unwrap(), 0);
        assert_eq!(PremiumPolicy::Absolute(7).premium_for(1_000).unwrap(), 7);
        // 9 bps of 1000 = 0.9, rounded up.
        assert_eq!(PremiumPolicy::BasisPoints(9).premium_for(1_000).unwrap(), 1);
        assert_eq!(
            PremiumPolicy::BasisPoints(30).premium_for(1_000_000).unwrap(),
            3_000
        );
        assert_eq!(
            PremiumPolicy::BasisPoints(1).premium_for(Amount::MAX),
            Err(VaultexError::ArithmeticOverflow)
        );
    }

    #[test]
    fn token_supply_scaling() {
        let cfg = TokenConfig::new("Dapp University", "DAPP", Decimal::new(1_000_000, 0));
        assert_eq!(
            cfg.supply_in_base_units().unwrap(),
            1_000_000 * 10u128.pow(18)
        );
    }

    #[test]
    fn world_config_from_json() {
        let json = format!(
            r#"{{
                "deployer": "{}",
                "exchange": {{ "fee_account": "{}", "fee_percent": 10 }},
                "flash_loan": {{ "premium": {{ "basis_points": 9 }} }},
                "tokens": [
                    {{ "name": "Mock Dai", "symbol": "mDAI", "total_supply": "1000000" }}
                ]
            }}"#,
            AccountId::derive("deployer"),
            AccountId::derive("feeAccount"),
        );
        let cfg = WorldConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg.exchange.fee_percent, 10);
        assert_eq!(cfg.flash_loan.premium, PremiumPolicy::BasisPoints(9));
        assert_eq!(cfg.tokens[0].decimals, 18);
    }

    #[test]
    fn world_config_rejects_bad_json() {
        let err = WorldConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, VaultexError::Serialization(_)));
    }
}
