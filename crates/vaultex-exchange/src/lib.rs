//! # vaultex-exchange
//!
//! Custodial token exchange: users deposit assets held by one ledger
//! account, place limit orders backed by locked balances, and fill each
//! other's orders in full with a percentage fee paid to the operator.
//!
//! ## Architecture
//!
//! 1. **BalanceBook**: total/locked per (asset, owner), staged then committed
//! 2. **OrderBook**: orders by monotonic id, `Open -> Filled | Cancelled`
//! 3. **FeeSchedule**: `amount * percent / 100`, truncating
//! 4. **SupplyConservation**: custodial supply == deposits - withdrawals
//! 5. **Exchange**: the public operations tying the above to an
//!    [`vaultex_token::AssetLedger`]
//!
//! ## Balance Flow
//!
//! ```text
//! deposit ─▶ total ──make_order──▶ locked ──fill_order──▶ filler.total
//!              ▲                     │
//!              └────cancel_order─────┘
//! ```

pub mod balance_book;
pub mod exchange;
pub mod fees;
pub mod order_book;
pub mod supply_conservation;

pub use balance_book::{BalanceBook, Posting, PostingKind, StagedBalances};
pub use exchange::Exchange;
pub use fees::FeeSchedule;
pub use order_book::OrderBook;
pub use supply_conservation::{StagedSupply, SupplyConservation};
