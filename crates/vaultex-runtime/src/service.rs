//! Async service wrapper around a [`Runtime`].
//!
//! The runtime lives on its own tokio task and is fed through an `mpsc`
//! command queue; each command carries a `oneshot` for its reply. Any number
//! of cloned [`RuntimeHandle`]s can submit work, but the task applies it one
//! unit at a time. Notifications of committed units are published on a
//! `broadcast` channel.

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use vaultex_flashloan::{FlashBorrower, FlashLoan};
use vaultex_types::{
    AccountId, Amount, AssetId, BalanceEntry, Event, Order, OrderId, Result, VaultexError,
    constants,
};

use crate::{clock::Clock, runtime::Runtime, world::World};

/// Borrower callback that can be shipped to the runtime task.
pub type BoxedBorrower = Box<dyn FlashBorrower<World> + Send>;

/// One state-changing request.
pub enum Operation {
    Transfer { asset: AssetId, to: AccountId, amount: Amount },
    Approve { asset: AssetId, spender: AccountId, amount: Amount },
    Deposit { asset: AssetId, amount: Amount },
    Withdraw { asset: AssetId, amount: Amount },
    MakeOrder {
        asset_buy: AssetId,
        amount_buy: Amount,
        asset_sell: AssetId,
        amount_sell: Amount,
    },
    CancelOrder { id: OrderId },
    FillOrder { id: OrderId },
    FlashLoan {
        asset: AssetId,
        amount: Amount,
        borrower: BoxedBorrower,
    },
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::Approve { .. } => "approve",
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::MakeOrder { .. } => "make_order",
            Self::CancelOrder { .. } => "cancel_order",
            Self::FillOrder { .. } => "fill_order",
            Self::FlashLoan { .. } => "flash_loan",
        }
    }
}

/// Result of a committed [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    OrderCreated(OrderId),
    LoanRepaid(FlashLoan),
}

enum Command {
    Execute {
        caller: AccountId,
        op: Operation,
        reply: oneshot::Sender<Result<Outcome>>,
    },
    Balance {
        asset: AssetId,
        owner: AccountId,
        reply: oneshot::Sender<BalanceEntry>,
    },
    Order {
        id: OrderId,
        reply: oneshot::Sender<Result<Order>>,
    },
    EventRoot {
        reply: oneshot::Sender<String>,
    },
}

/// Cloneable client of a runtime task.
#[derive(Clone)]
pub struct RuntimeHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl RuntimeHandle {
    /// Move `runtime` onto a new task. The task ends, returning the
    /// runtime, once every handle has been dropped.
    pub fn spawn<C>(runtime: Runtime<C>) -> (Self, JoinHandle<Runtime<C>>)
    where
        C: Clock + 'static,
    {
        Self::spawn_with_capacity(
            runtime,
            constants::DEFAULT_COMMAND_QUEUE,
            constants::DEFAULT_EVENT_BROADCAST,
        )
    }

    pub fn spawn_with_capacity<C>(
        runtime: Runtime<C>,
        command_queue: usize,
        event_buffer: usize,
    ) -> (Self, JoinHandle<Runtime<C>>)
    where
        C: Clock + 'static,
    {
        let (commands, rx) = mpsc::channel(command_queue);
        let (events, _) = broadcast::channel(event_buffer);
        let task = tokio::spawn(run(runtime, rx, events.clone()));
        (Self { commands, events }, task)
    }

    /// Receive notifications of every unit committed from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn execute(&self, caller: AccountId, op: Operation) -> Result<Outcome> {
        self.request(|reply| Command::Execute { caller, op, reply })
            .await?
    }

    pub async fn transfer(&self, caller: AccountId, asset: AssetId, to: AccountId, amount: Amount) -> Result<()> {
        self.execute(caller, Operation::Transfer { asset, to, amount })
            .await
            .map(drop)
    }

    pub async fn approve(
        &self,
        caller: AccountId,
        asset: AssetId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.execute(caller, Operation::Approve { asset, spender, amount })
            .await
            .map(drop)
    }

    pub async fn deposit(&self, caller: AccountId, asset: AssetId, amount: Amount) -> Result<()> {
        self.execute(caller, Operation::Deposit { asset, amount })
            .await
            .map(drop)
    }

    pub async fn withdraw(&self, caller: AccountId, asset: AssetId, amount: Amount) -> Result<()> {
        self.execute(caller, Operation::Withdraw { asset, amount })
            .await
            .map(drop)
    }

    pub async fn make_order(
        &self,
        caller: AccountId,
        asset_buy: AssetId,
        amount_buy: Amount,
        asset_sell: AssetId,
        amount_sell: Amount,
    ) -> Result<OrderId> {
        let outcome = self
            .execute(
                caller,
                Operation::MakeOrder {
                    asset_buy,
                    amount_buy,
                    asset_sell,
                    amount_sell,
                },
            )
            .await?;
        match outcome {
            Outcome::OrderCreated(id) => Ok(id),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn cancel_order(&self, caller: AccountId, id: OrderId) -> Result<()> {
        self.execute(caller, Operation::CancelOrder { id })
            .await
            .map(drop)
    }

    pub async fn fill_order(&self, caller: AccountId, id: OrderId) -> Result<()> {
        self.execute(caller, Operation::FillOrder { id })
            .await
            .map(drop)
    }

    pub async fn request_loan(
        &self,
        caller: AccountId,
        asset: AssetId,
        amount: Amount,
        borrower: BoxedBorrower,
    ) -> Result<FlashLoan> {
        let outcome = self
            .execute(
                caller,
                Operation::FlashLoan {
                    asset,
                    amount,
                    borrower,
                },
            )
            .await?;
        match outcome {
            Outcome::LoanRepaid(loan) => Ok(loan),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn balance(&self, asset: AssetId, owner: AccountId) -> Result<BalanceEntry> {
        self.request(|reply| Command::Balance { asset, owner, reply })
            .await
    }

    pub async fn order(&self, id: OrderId) -> Result<Order> {
        self.request(|reply| Command::Order { id, reply }).await?
    }

    pub async fn event_root(&self) -> Result<String> {
        self.request(|reply| Command::EventRoot { reply }).await
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| VaultexError::RuntimeUnavailable)?;
        rx.await.map_err(|_| VaultexError::RuntimeUnavailable)
    }
}

fn unexpected(outcome: &Outcome) -> VaultexError {
    VaultexError::InvariantViolation {
        reason: format!("reply does not match request: {outcome:?}"),
    }
}

async fn run<C: Clock>(
    mut runtime: Runtime<C>,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
) -> Runtime<C> {
    tracing::info!("Runtime service started");
    while let Some(command) = commands.recv().await {
        match command {
            Command::Execute { caller, op, reply } => {
                let cursor = runtime.journal().len();
                let name = op.name();
                let result = apply(&mut runtime, caller, op);
                if result.is_ok() {
                    for event in runtime.events_since(cursor) {
                        // No subscribers is fine.
                        let _ = events.send(event.clone());
                    }
                }
                tracing::debug!(caller = %caller, op = name, ok = result.is_ok(), "Command processed");
                let _ = reply.send(result);
            }
            Command::Balance { asset, owner, reply } => {
                let _ = reply.send(runtime.exchange().balance(asset, owner));
            }
            Command::Order { id, reply } => {
                let _ = reply.send(runtime.exchange().order(id).cloned());
            }
            Command::EventRoot { reply } => {
                let _ = reply.send(runtime.event_root());
            }
        }
    }
    tracing::info!(
        committed = runtime.committed_units(),
        rolled_back = runtime.rolled_back_units(),
        "Runtime service stopped"
    );
    runtime
}

fn apply<C: Clock>(runtime: &mut Runtime<C>, caller: AccountId, op: Operation) -> Result<Outcome> {
    match op {
        Operation::Transfer { asset, to, amount } => {
            runtime.transfer(caller, asset, to, amount).map(|()| Outcome::Done)
        }
        Operation::Approve {
            asset,
            spender,
            amount,
        } => runtime
            .approve(caller, asset, spender, amount)
            .map(|()| Outcome::Done),
        Operation::Deposit { asset, amount } => {
            runtime.deposit(caller, asset, amount).map(|()| Outcome::Done)
        }
        Operation::Withdraw { asset, amount } => {
            runtime.withdraw(caller, asset, amount).map(|()| Outcome::Done)
        }
        Operation::MakeOrder {
            asset_buy,
            amount_buy,
            asset_sell,
            amount_sell,
        } => runtime
            .make_order(caller, asset_buy, amount_buy, asset_sell, amount_sell)
            .map(Outcome::OrderCreated),
        Operation::CancelOrder { id } => runtime.cancel_order(caller, id).map(|()| Outcome::Done),
        Operation::FillOrder { id } => runtime.fill_order(caller, id).map(|()| Outcome::Done),
        Operation::FlashLoan {
            asset,
            amount,
            mut borrower,
        } => runtime
            .request_loan(caller, asset, amount, borrower.as_mut())
            .map(Outcome::LoanRepaid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_reply_is_an_invariant_violation() {
        let err = unexpected(&Outcome::OrderCreated(OrderId(3)));
        assert!(matches!(
            err,
            VaultexError::InvariantViolation { ref reason } if reason.contains("OrderCreated")
        ));
        assert!(err.to_string().starts_with("VX_ERR_203"));
    }
}
