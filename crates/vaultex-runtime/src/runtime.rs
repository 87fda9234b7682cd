//! Atomic-unit execution.
//!
//! [`Runtime::execute`] runs one closure against the world as a single unit:
//!
//! ```text
//! checkpoint ─▶ op(&mut world, ctx) ─▶ check_invariants ─▶ commit
//!      ▲                 │ Err                │ Err
//!      └──── restore ◀───┴────────────────────┘
//! ```
//!
//! `&mut self` makes the runtime single-writer; only one unit is ever in
//! flight. A restored unit leaves no balance change, order, id or
//! notification behind.

use vaultex_exchange::Exchange;
use vaultex_flashloan::{FlashBorrower, FlashLoan};
use vaultex_token::TokenRegistry;
use vaultex_types::{
    AccountId, Amount, AssetId, CallContext, Event, EventLog, OrderId, Result, TokenConfig,
    WorldConfig,
};

use crate::{
    clock::{Clock, SystemClock},
    world::World,
};

pub struct Runtime<C: Clock = SystemClock> {
    world: World,
    clock: C,
    committed: u64,
    rolled_back: u64,
}

impl Runtime<SystemClock> {
    #[must_use]
    pub fn new(world: World) -> Self {
        Self::with_clock(world, SystemClock)
    }
}

impl<C: Clock> Runtime<C> {
    #[must_use]
    pub fn with_clock(world: World, clock: C) -> Self {
        Self {
            world,
            clock,
            committed: 0,
            rolled_back: 0,
        }
    }

    /// Build the world from configuration. Returns the deployed token
    /// addresses in configuration order.
    pub fn bootstrap(config: &WorldConfig, clock: C) -> Result<(Self, Vec<AssetId>)> {
        let (world, assets) = World::from_config(config)?;
        tracing::info!(
            deployer = %config.deployer,
            exchange = %world.exchange().account(),
            tokens = assets.len(),
            clock = clock.name(),
            "Runtime bootstrapped"
        );
        Ok((Self::with_clock(world, clock), assets))
    }

    /// Run `op` as one atomic unit with `caller` as the acting party.
    ///
    /// # Errors
    /// Whatever `op` returns, or `InvariantViolation` if the unit would
    /// leave the world inconsistent. Either way the world is restored.
    pub fn execute<T, F>(&mut self, caller: AccountId, op: F) -> Result<T>
    where
        F: FnOnce(&mut World, &CallContext) -> Result<T>,
    {
        let ctx = CallContext::new(caller, self.clock.now());
        let cursor = self.world.journal().len();
        let checkpoint = self.world.checkpoint();

        let outcome = op(&mut self.world, &ctx).and_then(|value| {
            self.world.check_invariants()?;
            Ok(value)
        });

        match outcome {
            Ok(value) => {
                self.committed += 1;
                tracing::debug!(
                    caller = %caller,
                    unit = self.committed,
                    events = self.world.journal().len() - cursor,
                    "Unit committed"
                );
                Ok(value)
            }
            Err(err) => {
                self.world.restore(checkpoint);
                self.rolled_back += 1;
                tracing::warn!(caller = %caller, error = %err, "Unit rolled back");
                Err(err)
            }
        }
    }

    // =================================================================
    // Operations, one unit each
    // =================================================================

    pub fn deploy_token(&mut self, deployer: AccountId, config: &TokenConfig) -> Result<AssetId> {
        self.execute(deployer, |world, ctx| world.deploy_token(ctx.caller, config))
    }

    pub fn transfer(&mut self, caller: AccountId, asset: AssetId, to: AccountId, amount: Amount) -> Result<()> {
        self.execute(caller, |world, ctx| world.transfer(ctx, asset, to, amount))
    }

    pub fn approve(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.execute(caller, |world, ctx| world.approve(ctx, asset, spender, amount))
    }

    pub fn transfer_from(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.execute(caller, |world, ctx| {
            world.transfer_from(ctx, asset, from, to, amount)
        })
    }

    pub fn deposit(&mut self, caller: AccountId, asset: AssetId, amount: Amount) -> Result<()> {
        self.execute(caller, |world, ctx| world.deposit(ctx, asset, amount))
    }

    pub fn withdraw(&mut self, caller: AccountId, asset: AssetId, amount: Amount) -> Result<()> {
        self.execute(caller, |world, ctx| world.withdraw(ctx, asset, amount))
    }

    pub fn make_order(
        &mut self,
        caller: AccountId,
        asset_buy: AssetId,
        amount_buy: Amount,
        asset_sell: AssetId,
        amount_sell: Amount,
    ) -> Result<OrderId> {
        self.execute(caller, |world, ctx| {
            world.make_order(ctx, asset_buy, amount_buy, asset_sell, amount_sell)
        })
    }

    pub fn cancel_order(&mut self, caller: AccountId, id: OrderId) -> Result<()> {
        self.execute(caller, |world, ctx| world.cancel_order(ctx, id))
    }

    pub fn fill_order(&mut self, caller: AccountId, id: OrderId) -> Result<()> {
        self.execute(caller, |world, ctx| world.fill_order(ctx, id))
    }

    pub fn request_loan<B>(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        amount: Amount,
        borrower: &mut B,
    ) -> Result<FlashLoan>
    where
        B: FlashBorrower<World> + ?Sized,
    {
        self.execute(caller, |world, ctx| {
            world.request_loan(ctx, asset, amount, borrower)
        })
    }

    // =================================================================
    // Reads
    // =================================================================

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub fn exchange(&self) -> &Exchange {
        self.world.exchange()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenRegistry {
        self.world.tokens()
    }

    #[must_use]
    pub fn journal(&self) -> &EventLog {
        self.world.journal()
    }

    /// Notifications committed after `cursor` (a previous `journal().len()`).
    #[must_use]
    pub fn events_since(&self, cursor: usize) -> &[Event] {
        self.world.journal().since(cursor)
    }

    /// Hex SHA-256 digest over every committed notification.
    #[must_use]
    pub fn event_root(&self) -> String {
        hex::encode(self.world.journal().root())
    }

    #[must_use]
    pub fn committed_units(&self) -> u64 {
        self.committed
    }

    #[must_use]
    pub fn rolled_back_units(&self) -> u64 {
        self.rolled_back
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Give back the world, e.g. after the service loop stops.
    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};
    use rust_decimal::Decimal;
    use vaultex_types::{ExchangeConfig, FlashLoanConfig, VaultexError};

    use super::*;
    use crate::clock::ManualClock;

    fn config() -> WorldConfig {
        WorldConfig {
            deployer: AccountId::derive("deployer"),
            exchange: ExchangeConfig::new(AccountId::derive("fee_account"), 10),
            flash_loan: FlashLoanConfig::default(),
            tokens: vec![
                TokenConfig::new("Dapp University", "DAPP", Decimal::new(1_000_000, 0)),
                TokenConfig::new("Mock USDC", "mUSDC", Decimal::new(1_000_000, 0)),
            ],
        }
    }

    fn start() -> DateTime<chrono::Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn bootstrap_deploys_configured_tokens() {
        let (rt, assets) = Runtime::bootstrap(&config(), ManualClock::new(start())).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(rt.tokens().len(), 2);
        // One mint per token.
        assert_eq!(rt.journal().len(), 2);
        assert_eq!(rt.committed_units(), 0);
    }

    #[test]
    fn failed_unit_is_rolled_back() {
        let cfg = config();
        let (mut rt, assets) = Runtime::bootstrap(&cfg, ManualClock::new(start())).unwrap();
        let dapp = assets[0];
        let user = AccountId::derive("user1");
        let root_before = rt.event_root();

        // First step succeeds, second fails; neither survives.
        let err = rt
            .execute(cfg.deployer, |world, ctx| {
                world.transfer(ctx, dapp, user, 10)?;
                world.deposit(&ctx.as_caller(user), dapp, 10)
            })
            .unwrap_err();

        assert!(matches!(err, VaultexError::TransferFailed { .. }));
        assert_eq!(rt.world().balance_of(dapp, user).unwrap(), 0);
        assert_eq!(rt.event_root(), root_before);
        assert_eq!(rt.rolled_back_units(), 1);
    }

    #[test]
    fn unit_timestamp_comes_from_clock() {
        let cfg = config();
        let (mut rt, assets) = Runtime::bootstrap(&cfg, ManualClock::new(start())).unwrap();
        let (dapp, musdc) = (assets[0], assets[1]);
        let custody = rt.exchange().account();

        rt.approve(cfg.deployer, dapp, custody, 100).unwrap();
        rt.deposit(cfg.deployer, dapp, 100).unwrap();
        rt.clock().advance(Duration::seconds(5));
        rt.make_order(cfg.deployer, musdc, 1, dapp, 1).unwrap();

        let created = rt.exchange().order(OrderId(1)).unwrap().created_at;
        assert_eq!(created, start() + Duration::seconds(5));
        assert!(matches!(
            rt.journal().last(),
            Some(Event::OrderCreated { timestamp, .. }) if *timestamp == created
        ));
    }

    #[test]
    fn operations_commit_in_order() {
        let cfg = config();
        let (mut rt, assets) = Runtime::bootstrap(&cfg, ManualClock::new(start())).unwrap();
        let dapp = assets[0];
        let custody = rt.exchange().account();
        let cursor = rt.journal().len();

        rt.approve(cfg.deployer, dapp, custody, 50).unwrap();
        rt.deposit(cfg.deployer, dapp, 50).unwrap();
        rt.withdraw(cfg.deployer, dapp, 20).unwrap();

        let names: Vec<&str> = rt.events_since(cursor).iter().map(Event::name).collect();
        assert_eq!(
            names,
            vec!["APPROVAL", "TRANSFER", "TOKENS_DEPOSITED", "TRANSFER", "TOKENS_WITHDRAWN"]
        );
        assert_eq!(rt.committed_units(), 3);
    }

    #[test]
    fn rollback_cuts_journal_back_to_unit_start() {
        let cfg = config();
        let (mut rt, assets) = Runtime::bootstrap(&cfg, ManualClock::new(start())).unwrap();
        let dapp = assets[0];
        let custody = rt.exchange().account();
        rt.approve(cfg.deployer, dapp, custody, 1_000).unwrap();
        for _ in 0..50 {
            rt.deposit(cfg.deployer, dapp, 10).unwrap();
            rt.withdraw(cfg.deployer, dapp, 10).unwrap();
        }
        let (len, root) = (rt.journal().len(), rt.event_root());

        let err = rt
            .execute(cfg.deployer, |world, ctx| {
                world.deposit(ctx, dapp, 10)?;
                world.make_order(ctx, assets[1], 1, dapp, 10)?;
                world.withdraw(ctx, dapp, 10)
            })
            .unwrap_err();
        assert!(matches!(err, VaultexError::InsufficientAvailableBalance { .. }));
        assert_eq!(rt.journal().len(), len);
        assert_eq!(rt.event_root(), root);
        // Emitters hand everything to the journal as they go.
        assert!(rt.exchange().events().is_empty());
        assert!(rt.tokens().events().is_empty());

        let cursor = rt.journal().len();
        rt.deposit(cfg.deployer, dapp, 10).unwrap();
        let names: Vec<&str> = rt.events_since(cursor).iter().map(Event::name).collect();
        assert_eq!(names, vec!["TRANSFER", "TOKENS_DEPOSITED"]);
        rt.world().check_invariants().unwrap();
    }
}
