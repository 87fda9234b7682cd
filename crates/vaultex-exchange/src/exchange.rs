//! The custodial exchange.
//!
//! ## Operation shape
//!
//! Every mutating operation follows the same three steps:
//!
//! 1. **Validate**: order checks, then stage all balance postings
//!    ([`BalanceBook::stage`]) and, for deposit / withdraw, the custody
//!    total. Nothing is written yet.
//! 2. **External**: ledger transfers (deposit / withdraw only). A ledger
//!    rejection aborts before anything was committed.
//! 3. **Commit**: write the staged balances, update the order, append the
//!    notification. Infallible.
//!
//! An `Err` from any operation therefore leaves the exchange exactly as it
//! was. Effects on the *ledger* that happened before a later failure in the
//! same atomic unit are undone by the runtime's checkpoint.

use vaultex_token::AssetLedger;
use vaultex_types::{
    AccountId, Amount, AssetId, BalanceEntry, CallContext, Event, EventLog, ExchangeConfig, Order,
    OrderId, OrderStatus, Result, VaultexError,
};

use crate::{
    balance_book::{BalanceBook, Posting},
    fees::FeeSchedule,
    order_book::OrderBook,
    supply_conservation::SupplyConservation,
};

/// Custodial balance table, order book and fee policy behind one ledger
/// account.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Ledger account holding every depositor's funds.
    account: AccountId,
    fees: FeeSchedule,
    balances: BalanceBook,
    orders: OrderBook,
    supply: SupplyConservation,
    events: EventLog,
}

impl Exchange {
    /// Create an exchange whose custody lives at `account` on the asset
    /// ledger.
    ///
    /// # Errors
    /// Returns `Configuration` if the fee policy is out of range or either
    /// account is the zero account.
    pub fn new(account: AccountId, config: ExchangeConfig) -> Result<Self> {
        config.validate()?;
        if account.is_zero() {
            return Err(VaultexError::Configuration(
                "exchange account must not be the zero account".into(),
            ));
        }
        tracing::info!(
            account = %account,
            fee_account = %config.fee_account,
            fee_percent = config.fee_percent,
            "Exchange created"
        );
        Ok(Self {
            account,
            fees: FeeSchedule::new(&config),
            balances: BalanceBook::new(),
            orders: OrderBook::new(),
            supply: SupplyConservation::new(),
            events: EventLog::new(),
        })
    }

    // =================================================================
    // Balance ledger
    // =================================================================

    /// Pull `amount` of `asset` from the caller into custody and credit it.
    ///
    /// The caller must have approved [`Self::account`] on the ledger.
    ///
    /// # Errors
    /// Returns `TransferFailed` if the ledger rejects the pull (missing
    /// allowance, insufficient ledger balance, unknown asset).
    pub fn deposit<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        ctx: &CallContext,
        asset: AssetId,
        amount: Amount,
    ) -> Result<()> {
        let owner = ctx.caller;
        let staged = self
            .balances
            .stage(&[Posting::credit(asset, owner, amount)])?;
        let supply = self.supply.stage_deposit(asset, amount)?;

        ledger
            .transfer_from(asset, self.account, owner, self.account, amount)
            .map_err(|err| transfer_failed(asset, &err))
            .inspect_err(|err| {
                tracing::warn!(owner = %owner, asset = %asset, amount, error = %err, "Deposit rejected");
            })?;

        let new_total = staged.get(asset, owner).map_or(0, |entry| entry.total);
        self.balances.commit(staged);
        self.supply.commit(supply);
        self.events.emit(Event::TokensDeposited {
            asset,
            owner,
            amount,
            new_total,
        });

        tracing::info!(owner = %owner, asset = %asset, amount, new_total, "Deposit");
        Ok(())
    }

    /// Debit `amount` from the caller's available balance and push it back
    /// to the caller on the ledger.
    ///
    /// # Errors
    /// - `InsufficientAvailableBalance` if `amount > total - locked`
    /// - `TransferFailed` if the ledger rejects the push
    pub fn withdraw<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        ctx: &CallContext,
        asset: AssetId,
        amount: Amount,
    ) -> Result<()> {
        let owner = ctx.caller;
        let staged = self
            .balances
            .stage(&[Posting::debit(asset, owner, amount)])
            .inspect_err(|err| {
                tracing::warn!(owner = %owner, asset = %asset, amount, error = %err, "Withdraw rejected");
            })?;
        let supply = self.supply.stage_withdrawal(asset, amount)?;

        ledger
            .transfer(asset, self.account, owner, amount)
            .map_err(|err| transfer_failed(asset, &err))
            .inspect_err(|err| {
                tracing::warn!(owner = %owner, asset = %asset, amount, error = %err, "Withdraw push failed");
            })?;

        let new_total = staged.get(asset, owner).map_or(0, |entry| entry.total);
        self.balances.commit(staged);
        self.supply.commit(supply);
        self.events.emit(Event::TokensWithdrawn {
            asset,
            owner,
            amount,
            new_total,
        });

        tracing::info!(owner = %owner, asset = %asset, amount, new_total, "Withdraw");
        Ok(())
    }

    // =================================================================
    // Order book
    // =================================================================

    /// Offer `amount_sell` of `asset_sell` for `amount_buy` of `asset_buy`.
    /// Locks `amount_sell` of the caller's available balance.
    ///
    /// # Errors
    /// - `InvalidOrder` for zero amounts or the same asset on both sides
    /// - `InsufficientAvailableBalance` if the caller cannot cover `amount_sell`
    pub fn make_order(
        &mut self,
        ctx: &CallContext,
        asset_buy: AssetId,
        amount_buy: Amount,
        asset_sell: AssetId,
        amount_sell: Amount,
    ) -> Result<OrderId> {
        let owner = ctx.caller;
        validate_terms(asset_buy, amount_buy, asset_sell, amount_sell)?;

        let staged = self
            .balances
            .stage(&[Posting::lock(asset_sell, owner, amount_sell)])
            .inspect_err(|err| {
                tracing::warn!(owner = %owner, asset = %asset_sell, amount_sell, error = %err, "Order rejected");
            })?;

        let order = Order {
            id: self.orders.next_id(),
            owner,
            asset_buy,
            amount_buy,
            asset_sell,
            amount_sell,
            created_at: ctx.timestamp,
            status: OrderStatus::Open,
        };
        let id = order.id;
        self.orders.insert(order)?;
        self.balances.commit(staged);
        self.events.emit(Event::OrderCreated {
            id,
            owner,
            asset_buy,
            amount_buy,
            asset_sell,
            amount_sell,
            timestamp: ctx.timestamp,
        });

        tracing::info!(
            order = %id,
            owner = %owner,
            asset_buy = %asset_buy,
            amount_buy,
            asset_sell = %asset_sell,
            amount_sell,
            "Order created"
        );
        Ok(id)
    }

    /// Cancel an open order and release exactly the amount it reserved.
    ///
    /// # Errors
    /// - `OrderNotFound` if the id was never allocated
    /// - `NotOrderOwner` if the caller is not the maker
    /// - `OrderNotOpen` if the order was already filled or cancelled
    pub fn cancel_order(&mut self, ctx: &CallContext, id: OrderId) -> Result<()> {
        let order = self.orders.get(id)?;
        if order.owner != ctx.caller {
            tracing::warn!(order = %id, caller = %ctx.caller, "Cancel by non-owner rejected");
            return Err(VaultexError::NotOrderOwner {
                id,
                caller: ctx.caller,
            });
        }

        let mut updated = order.clone();
        updated.mark_cancelled()?;
        let staged = self.balances.stage(&[Posting::unlock(
            updated.asset_sell,
            updated.owner,
            updated.amount_sell,
        )])?;

        self.balances.commit(staged);
        self.events.emit(Event::OrderCancelled {
            id,
            owner: updated.owner,
            asset_buy: updated.asset_buy,
            amount_buy: updated.amount_buy,
            asset_sell: updated.asset_sell,
            amount_sell: updated.amount_sell,
            timestamp: ctx.timestamp,
        });
        self.orders.replace(updated)?;

        tracing::info!(order = %id, owner = %ctx.caller, "Order cancelled");
        Ok(())
    }

    /// Accept an open order's terms in full. The caller pays `amount_buy`
    /// plus the fee in `asset_buy` and receives `amount_sell` of
    /// `asset_sell` out of the maker's reservation.
    ///
    /// # Errors
    /// - `OrderNotFound` if the id was never allocated
    /// - `OrderNotOpen` if the order was already filled or cancelled
    /// - `InsufficientAvailableBalance` if the caller cannot cover
    ///   `amount_buy + fee`
    pub fn fill_order(&mut self, ctx: &CallContext, id: OrderId) -> Result<()> {
        let filler = ctx.caller;
        let mut updated = self.orders.get(id)?.clone();
        updated.mark_filled()?;

        let (gross, fee) = self.fees.gross(updated.amount_buy)?;
        let maker = updated.owner;
        let staged = self
            .balances
            .stage(&[
                Posting::debit(updated.asset_buy, filler, gross),
                Posting::credit(updated.asset_buy, maker, updated.amount_buy),
                Posting::credit(updated.asset_buy, self.fees.account(), fee),
                Posting::consume_locked(updated.asset_sell, maker, updated.amount_sell),
                Posting::credit(updated.asset_sell, filler, updated.amount_sell),
            ])
            .inspect_err(|err| {
                tracing::warn!(order = %id, filler = %filler, gross, error = %err, "Fill rejected");
            })?;

        self.balances.commit(staged);
        self.events.emit(Event::Trade {
            id,
            filler,
            owner: maker,
            asset_buy: updated.asset_buy,
            amount_buy: updated.amount_buy,
            asset_sell: updated.asset_sell,
            amount_sell: updated.amount_sell,
            fee,
            timestamp: ctx.timestamp,
        });
        self.orders.replace(updated)?;

        tracing::info!(order = %id, filler = %filler, maker = %maker, fee, "Order filled");
        Ok(())
    }

    // =================================================================
    // Reads
    // =================================================================

    /// Ledger account holding custody.
    #[must_use]
    pub fn account(&self) -> AccountId {
        self.account
    }

    #[must_use]
    pub fn total_balance_of(&self, asset: AssetId, owner: AccountId) -> Amount {
        self.balances.balance(asset, owner).total
    }

    /// Amount reserved by `owner`'s open orders selling `asset`.
    #[must_use]
    pub fn active_balance_of(&self, asset: AssetId, owner: AccountId) -> Amount {
        self.balances.balance(asset, owner).locked
    }

    #[must_use]
    pub fn available_balance_of(&self, asset: AssetId, owner: AccountId) -> Amount {
        self.balances.balance(asset, owner).available()
    }

    #[must_use]
    pub fn balance(&self, asset: AssetId, owner: AccountId) -> BalanceEntry {
        self.balances.balance(asset, owner)
    }

    /// What the exchange owes its depositors in `asset`.
    #[must_use]
    pub fn custodial_supply(&self, asset: AssetId) -> Amount {
        self.balances.total_supply(asset)
    }

    /// # Errors
    /// Returns `OrderNotFound` if the id was never allocated.
    pub fn order(&self, id: OrderId) -> Result<&Order> {
        self.orders.get(id)
    }

    /// Number of orders ever created; also the id of the latest one.
    #[must_use]
    pub fn order_count(&self) -> u64 {
        self.orders.count()
    }

    #[must_use]
    pub fn fee_account(&self) -> AccountId {
        self.fees.account()
    }

    #[must_use]
    pub fn fee_percent(&self) -> u32 {
        self.fees.percent()
    }

    /// Open orders, ascending by id.
    pub fn open_orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.open_orders()
    }

    pub fn orders_by(&self, owner: AccountId) -> impl Iterator<Item = &Order> + '_ {
        self.orders.orders_by(owner)
    }

    /// `TokensDeposited` / `TokensWithdrawn` / order notifications.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Hand over pending notifications to an outer journal.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // =================================================================
    // Invariant checks
    // =================================================================

    /// Custodial supply per asset equals deposits minus withdrawals.
    ///
    /// # Errors
    /// Returns `InvariantViolation` naming the first asset that disagrees.
    pub fn verify_supply(&self) -> Result<()> {
        for asset in self.supply.tracked_assets().into_keys() {
            self.supply.verify(asset, self.balances.total_supply(asset))?;
        }
        Ok(())
    }

    /// Every `locked` balance equals the sum of its owner's open orders
    /// selling that asset.
    ///
    /// # Errors
    /// Returns `InvariantViolation` on the first mismatch.
    pub fn verify_reservations(&self) -> Result<()> {
        let from_balances = self
            .balances
            .entries()
            .filter(|(_, _, entry)| entry.locked > 0)
            .map(|(asset, owner, _)| (asset, owner));
        let from_orders = self
            .orders
            .reservations()
            .map(|(owner, asset, _)| (asset, owner));

        for (asset, owner) in from_balances.chain(from_orders) {
            let locked = self.balances.balance(asset, owner).locked;
            let reserved = self.orders.locked_by(owner, asset);
            if locked != reserved {
                return Err(VaultexError::InvariantViolation {
                    reason: format!(
                        "{owner} locked {locked} of {asset} but open orders reserve {reserved}"
                    ),
                });
            }
        }
        Ok(())
    }

    /// The custody account holds at least what the exchange owes in `asset`.
    ///
    /// Only meaningful at unit boundaries: inside a flash loan the reserve is
    /// lent out.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if custody is short.
    pub fn verify_custody<L: AssetLedger + ?Sized>(&self, ledger: &L, asset: AssetId) -> Result<()> {
        let held = ledger.balance_of(asset, self.account)?;
        let owed = self.custodial_supply(asset);
        if held < owed {
            return Err(VaultexError::InvariantViolation {
                reason: format!("custody holds {held} of {asset} but owes {owed}"),
            });
        }
        Ok(())
    }
}

fn validate_terms(
    asset_buy: AssetId,
    amount_buy: Amount,
    asset_sell: AssetId,
    amount_sell: Amount,
) -> Result<()> {
    if amount_buy == 0 || amount_sell == 0 {
        return Err(VaultexError::InvalidOrder {
            reason: "amounts must be non-zero".into(),
        });
    }
    if asset_buy == asset_sell {
        return Err(VaultexError::InvalidOrder {
            reason: format!("cannot trade {asset_buy} for itself"),
        });
    }
    Ok(())
}

fn transfer_failed(asset: AssetId, err: &VaultexError) -> VaultexError {
    VaultexError::TransferFailed {
        asset,
        reason: err.to_string(),
    }
}
