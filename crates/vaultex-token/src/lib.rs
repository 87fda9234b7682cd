//! # vaultex-token
//!
//! Fungible asset ledgers consumed by the exchange and the flash-loan
//! orchestrator.
//!
//! - [`AssetLedger`]: the trait seam (`transfer`, `approve`, `transfer_from`)
//! - [`Token`]: one fixed-supply asset with balances and allowances
//! - [`TokenRegistry`]: deployed tokens addressed by `AssetId`

pub mod ledger;
pub mod registry;
pub mod token;

pub use ledger::AssetLedger;
pub use registry::TokenRegistry;
pub use token::Token;
