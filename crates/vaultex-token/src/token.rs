//! A single fungible asset ledger.
//!
//! Fixed supply minted to the deployer at creation. Balances move through
//! `transfer` (owner acts) or `transfer_from` (an approved spender acts on
//! the owner's behalf, consuming allowance). Every check runs before any
//! mutation, so a rejected call leaves the ledger untouched.

use std::collections::HashMap;

use vaultex_types::{AccountId, Amount, AssetId, Event, Result, TokenConfig, VaultexError};

/// One deployed token.
#[derive(Debug, Clone)]
pub struct Token {
    address: AssetId,
    name: String,
    symbol: String,
    decimals: u32,
    total_supply: Amount,
    balances: HashMap<AccountId, Amount>,
    /// `(owner, spender) -> remaining allowance`.
    allowances: HashMap<(AccountId, AccountId), Amount>,
}

impl Token {
    /// Create the token and mint the whole supply to `deployer`.
    ///
    /// Returns the token and the mint `Transfer` event (from the zero
    /// account).
    pub fn deploy(address: AssetId, config: &TokenConfig, deployer: AccountId) -> Result<(Self, Event)> {
        config.validate()?;
        if deployer.is_zero() {
            return Err(VaultexError::InvalidRecipient);
        }
        let total_supply = config.supply_in_base_units()?;

        let mut balances = HashMap::new();
        balances.insert(deployer, total_supply);

        let token = Self {
            address,
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            total_supply,
            balances,
            allowances: HashMap::new(),
        };
        let event = Event::Transfer {
            asset: address,
            from: AccountId::ZERO,
            to: deployer,
            amount: total_supply,
        };
        Ok((token, event))
    }

    #[must_use]
    pub fn address(&self) -> AssetId {
        self.address
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    #[must_use]
    pub fn balance_of(&self, owner: AccountId) -> Amount {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// - `InvalidRecipient` if `to` is the zero account
    /// - `InsufficientBalance` if `from` holds less than `amount`
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<Event> {
        if to.is_zero() {
            return Err(VaultexError::InvalidRecipient);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(VaultexError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        // Supply is fixed, so the recipient's balance cannot exceed it.
        *self.balances.entry(from).or_default() -= amount;
        *self.balances.entry(to).or_default() += amount;

        Ok(Event::Transfer {
            asset: self.address,
            from,
            to,
            amount,
        })
    }

    /// Set `spender`'s allowance over `owner`'s funds (overwrites).
    ///
    /// # Errors
    /// Returns `InvalidRecipient` if `spender` is the zero account.
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount) -> Result<Event> {
        if spender.is_zero() {
            return Err(VaultexError::InvalidRecipient);
        }
        self.allowances.insert((owner, spender), amount);
        Ok(Event::Approval {
            asset: self.address,
            owner,
            spender,
            amount,
        })
    }

    /// `spender` moves `amount` of `from`'s funds to `to`, consuming
    /// allowance.
    ///
    /// # Errors
    /// - `InsufficientBalance` if `from` holds less than `amount`
    /// - `InsufficientAllowance` if `spender` is approved for less
    /// - `InvalidRecipient` if `to` is the zero account
    pub fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<Event> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(VaultexError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(VaultexError::InsufficientAllowance {
                needed: amount,
                approved,
            });
        }

        let event = self.transfer(from, to, amount)?;
        self.allowances.insert((from, spender), approved - amount);
        Ok(event)
    }

    /// Sum of all balances. Equals `total_supply` at all times.
    #[must_use]
    pub fn circulating(&self) -> Amount {
        self.balances.values().sum()
    }
}
