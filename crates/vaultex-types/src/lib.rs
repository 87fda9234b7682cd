//! # vaultex-types
//!
//! Shared types, errors, and configuration for **Vaultex**, a custodial
//! token exchange with operator fees and single-unit flash loans.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AssetId`], [`OrderId`]
//! - **Balance model**: [`BalanceEntry`], [`Amount`]
//! - **Order model**: [`Order`], [`OrderStatus`]
//! - **Notifications**: [`Event`], [`EventLog`]
//! - **Call context**: [`CallContext`]
//! - **Configuration**: [`ExchangeConfig`], [`FlashLoanConfig`], [`TokenConfig`], [`WorldConfig`]
//! - **Errors**: [`VaultexError`] with `VX_ERR_` prefix codes
//! - **Units**: [`parse_units`] / [`format_units`]
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod units;

// Re-export all primary types at crate root for ergonomic imports:
//   use vaultex_types::{AccountId, Order, Event, ...};

pub use balance::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use units::*;

// Constants are accessed via `vaultex_types::constants::FOO`
// (not re-exported to avoid name collisions).
