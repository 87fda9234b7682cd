//! Registry of deployed tokens, addressed by [`AssetId`].

use std::collections::{BTreeMap, HashMap};

use vaultex_types::{AccountId, Amount, AssetId, Event, EventLog, Result, TokenConfig, VaultexError};

use crate::{ledger::AssetLedger, token::Token};

/// All deployed tokens plus their shared notification log.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: BTreeMap<AssetId, Token>,
    /// Deployments per deployer, used to derive the next address.
    deploy_sequence: HashMap<AccountId, u64>,
    events: EventLog,
}

impl TokenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a new token; the full supply goes to `deployer`.
    pub fn deploy(&mut self, config: &TokenConfig, deployer: AccountId) -> Result<AssetId> {
        let sequence = self.deploy_sequence.get(&deployer).copied().unwrap_or(0);
        let address = AssetId::derive(deployer, sequence);
        let (token, event) = Token::deploy(address, config, deployer)?;

        tracing::info!(
            asset = %address,
            symbol = %token.symbol(),
            supply = token.total_supply(),
            deployer = %deployer,
            "Token deployed"
        );

        self.tokens.insert(address, token);
        self.deploy_sequence.insert(deployer, sequence + 1);
        self.events.emit(event);
        Ok(address)
    }

    /// Look up a token.
    ///
    /// # Errors
    /// Returns `UnknownAsset` if nothing is deployed at `asset`.
    pub fn token(&self, asset: AssetId) -> Result<&Token> {
        self.tokens.get(&asset).ok_or(VaultexError::UnknownAsset(asset))
    }

    fn token_mut(&mut self, asset: AssetId) -> Result<&mut Token> {
        self.tokens
            .get_mut(&asset)
            .ok_or(VaultexError::UnknownAsset(asset))
    }

    /// Find a token by ticker symbol.
    #[must_use]
    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.tokens.values().find(|t| t.symbol() == symbol)
    }

    /// Deployed asset addresses, in address order.
    pub fn assets(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.tokens.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `Transfer` / `Approval` notifications in emission order.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Hand over pending notifications to an outer journal.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}

impl AssetLedger for TokenRegistry {
    fn balance_of(&self, asset: AssetId, owner: AccountId) -> Result<Amount> {
        Ok(self.token(asset)?.balance_of(owner))
    }

    fn allowance(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> Result<Amount> {
        Ok(self.token(asset)?.allowance(owner, spender))
    }

    fn transfer(&mut self, asset: AssetId, from: AccountId, to: AccountId, amount: Amount) -> Result<()> {
        let event = self.token_mut(asset)?.transfer(from, to, amount)?;
        tracing::debug!(asset = %asset, from = %from, to = %to, amount, "Transfer");
        self.events.emit(event);
        Ok(())
    }

    fn approve(&mut self, asset: AssetId, owner: AccountId, spender: AccountId, amount: Amount) -> Result<()> {
        let event = self.token_mut(asset)?.approve(owner, spender, amount)?;
        tracing::debug!(asset = %asset, owner = %owner, spender = %spender, amount, "Approval");
        self.events.emit(event);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        let event = self
            .token_mut(asset)?
            .transfer_from(spender, from, to, amount)?;
        tracing::debug!(
            asset = %asset,
            spender = %spender,
            from = %from,
            to = %to,
            amount,
            "Transfer on behalf"
        );
        self.events.emit(event);
        Ok(())
    }
}
