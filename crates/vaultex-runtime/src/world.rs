//! World state: asset ledgers, the exchange and the flash-loan orchestrator.
//!
//! Every mutating method takes the acting party from a [`CallContext`].
//! Flash-loan callbacks receive `&mut World` and drive it through the same
//! methods, so nested operations are indistinguishable from top-level ones
//! apart from running inside the outer unit.
//!
//! The runtime checkpoints the world per unit with [`World::checkpoint`].
//! The journal is not copied: a checkpoint remembers its length and
//! [`World::restore`] cuts it back, so the cost of a checkpoint tracks the
//! live balances and orders rather than the event history.

use vaultex_exchange::Exchange;
use vaultex_flashloan::{
    FlashBorrower, FlashLoan, FlashLoanOrchestrator, LendingReserve, ReservePosition,
};
use vaultex_token::{AssetLedger, TokenRegistry};
use vaultex_types::{
    AccountId, Amount, AssetId, BalanceEntry, CallContext, Event, EventLog, Order, OrderId,
    Result, TokenConfig, VaultexError, WorldConfig,
};

/// All state touched by an atomic unit.
#[derive(Debug, Clone)]
pub struct World {
    tokens: TokenRegistry,
    exchange: Exchange,
    flash: FlashLoanOrchestrator,
    /// Every notification in mutation order, across all emitters.
    journal: EventLog,
}

/// Saved state of a [`World`] at the start of a unit.
#[derive(Debug)]
pub struct Checkpoint {
    tokens: TokenRegistry,
    exchange: Exchange,
    flash: FlashLoanOrchestrator,
    journal_len: usize,
}

impl World {
    /// World with no tokens deployed yet.
    pub fn new(exchange: Exchange, flash: FlashLoanOrchestrator) -> Self {
        Self {
            tokens: TokenRegistry::new(),
            exchange,
            flash,
            journal: EventLog::new(),
        }
    }

    /// Snapshot everything but the journal, which only ever grows inside a
    /// unit.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            tokens: self.tokens.clone(),
            exchange: self.exchange.clone(),
            flash: self.flash,
            journal_len: self.journal.len(),
        }
    }

    /// Roll back to `checkpoint`, dropping every notification after it.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.tokens = checkpoint.tokens;
        self.exchange = checkpoint.exchange;
        self.flash = checkpoint.flash;
        self.journal.truncate(checkpoint.journal_len);
    }

    /// Build a world from configuration: create the exchange, deploy every
    /// configured token to the deployer. Returns the token addresses in
    /// configuration order.
    ///
    /// # Errors
    /// Returns `Configuration` if the configuration does not validate.
    pub fn from_config(config: &WorldConfig) -> Result<(Self, Vec<AssetId>)> {
        config.validate()?;
        let exchange = Exchange::new(Self::exchange_account_for(config.deployer), config.exchange)?;
        let flash = FlashLoanOrchestrator::new(config.flash_loan)?;
        let mut world = Self::new(exchange, flash);

        let assets = config
            .tokens
            .iter()
            .map(|token| world.deploy_token(config.deployer, token))
            .collect::<Result<Vec<_>>>()?;
        Ok((world, assets))
    }

    /// Custody account of the exchange created by `deployer`.
    #[must_use]
    pub fn exchange_account_for(deployer: AccountId) -> AccountId {
        AccountId::derive(&format!("exchange:{deployer}"))
    }

    // =================================================================
    // Asset ledger
    // =================================================================

    /// Deploy a token whose full supply goes to `deployer`.
    pub fn deploy_token(&mut self, deployer: AccountId, config: &TokenConfig) -> Result<AssetId> {
        let asset = self.tokens.deploy(config, deployer)?;
        self.sync_journal();
        Ok(asset)
    }

    pub fn transfer(&mut self, ctx: &CallContext, asset: AssetId, to: AccountId, amount: Amount) -> Result<()> {
        self.tokens.transfer(asset, ctx.caller, to, amount)?;
        self.sync_journal();
        Ok(())
    }

    pub fn approve(
        &mut self,
        ctx: &CallContext,
        asset: AssetId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.tokens.approve(asset, ctx.caller, spender, amount)?;
        self.sync_journal();
        Ok(())
    }

    /// The caller moves `from`'s funds against its allowance.
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.tokens.transfer_from(asset, ctx.caller, from, to, amount)?;
        self.sync_journal();
        Ok(())
    }

    // =================================================================
    // Exchange
    // =================================================================

    pub fn deposit(&mut self, ctx: &CallContext, asset: AssetId, amount: Amount) -> Result<()> {
        self.exchange.deposit(&mut self.tokens, ctx, asset, amount)?;
        self.sync_journal();
        Ok(())
    }

    pub fn withdraw(&mut self, ctx: &CallContext, asset: AssetId, amount: Amount) -> Result<()> {
        self.exchange.withdraw(&mut self.tokens, ctx, asset, amount)?;
        self.sync_journal();
        Ok(())
    }

    pub fn make_order(
        &mut self,
        ctx: &CallContext,
        asset_buy: AssetId,
        amount_buy: Amount,
        asset_sell: AssetId,
        amount_sell: Amount,
    ) -> Result<OrderId> {
        let id = self
            .exchange
            .make_order(ctx, asset_buy, amount_buy, asset_sell, amount_sell)?;
        self.sync_journal();
        Ok(id)
    }

    pub fn cancel_order(&mut self, ctx: &CallContext, id: OrderId) -> Result<()> {
        self.exchange.cancel_order(ctx, id)?;
        self.sync_journal();
        Ok(())
    }

    pub fn fill_order(&mut self, ctx: &CallContext, id: OrderId) -> Result<()> {
        self.exchange.fill_order(ctx, id)?;
        self.sync_journal();
        Ok(())
    }

    // =================================================================
    // Flash loans
    // =================================================================

    /// Borrow `amount` of `asset` from the exchange's custody for the
    /// duration of `borrower`. May be called again from inside a callback.
    pub fn request_loan<B>(
        &mut self,
        ctx: &CallContext,
        asset: AssetId,
        amount: Amount,
        borrower: &mut B,
    ) -> Result<FlashLoan>
    where
        B: FlashBorrower<Self> + ?Sized,
    {
        let flash = self.flash;
        flash.request_loan(self, ctx, asset, amount, borrower)
    }

    // =================================================================
    // Reads
    // =================================================================

    #[must_use]
    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    #[must_use]
    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    #[must_use]
    pub fn flash(&self) -> &FlashLoanOrchestrator {
        &self.flash
    }

    /// Ledger balance.
    pub fn balance_of(&self, asset: AssetId, owner: AccountId) -> Result<Amount> {
        self.tokens.balance_of(asset, owner)
    }

    /// Custodial balance inside the exchange.
    #[must_use]
    pub fn custodial_balance(&self, asset: AssetId, owner: AccountId) -> BalanceEntry {
        self.exchange.balance(asset, owner)
    }

    pub fn order(&self, id: OrderId) -> Result<&Order> {
        self.exchange.order(id)
    }

    /// Every notification, in mutation order.
    #[must_use]
    pub fn journal(&self) -> &EventLog {
        &self.journal
    }

    // =================================================================
    // Invariants
    // =================================================================

    /// Checked at the end of every unit, before commit.
    ///
    /// - every token's balances sum to its supply
    /// - custodial supply equals deposits minus withdrawals
    /// - every locked balance is backed by open orders
    /// - custody holds at least what the exchange owes, per asset
    pub fn check_invariants(&self) -> Result<()> {
        for asset in self.tokens.assets() {
            let token = self.tokens.token(asset)?;
            if token.circulating() != token.total_supply() {
                return Err(VaultexError::InvariantViolation {
                    reason: format!(
                        "{} circulating {} != supply {}",
                        token.symbol(),
                        token.circulating(),
                        token.total_supply()
                    ),
                });
            }
            self.exchange.verify_custody(&self.tokens, asset)?;
        }
        self.exchange.verify_supply()?;
        self.exchange.verify_reservations()
    }

    /// Append the emitters' new notifications to the journal. Each world
    /// method touches the ledger before the exchange, so this preserves
    /// mutation order.
    fn sync_journal(&mut self) {
        for event in self.tokens.drain_events() {
            self.journal.emit(event);
        }
        for event in self.exchange.drain_events() {
            self.journal.emit(event);
        }
    }
}

impl LendingReserve for World {
    fn reserve_account(&self) -> AccountId {
        self.exchange.account()
    }

    fn reserve_position(&self, asset: AssetId) -> Result<ReservePosition> {
        let held = self.tokens.balance_of(asset, self.exchange.account())?;
        Ok(ReservePosition::new(held, self.exchange.custodial_supply(asset)))
    }

    fn disburse(&mut self, asset: AssetId, to: AccountId, amount: Amount) -> Result<()> {
        self.tokens
            .transfer(asset, self.exchange.account(), to, amount)?;
        self.sync_journal();
        Ok(())
    }

    fn record_loan(&mut self, event: Event) {
        self.sync_journal();
        self.journal.emit(event);
    }
}
