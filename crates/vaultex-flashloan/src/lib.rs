//! # vaultex-flashloan
//!
//! Flash loans that live and die inside one atomic unit.
//!
//! - [`LendingReserve`]: the world a loan is taken from (reserve account,
//!   its net position, disbursal, notification sink)
//! - [`FlashBorrower`]: the borrower's use-of-funds callback; closures work
//! - [`FlashLoanOrchestrator`]: disburse, call back, verify repayment
//!
//! Repayment is verified against the reserve's net position read after the
//! callback returns, so funds the reserve merely holds for someone else
//! (a deposit routed back through custody) never count as repaid.

pub mod borrower;
pub mod orchestrator;
pub mod reserve;

pub use borrower::{FlashBorrower, FlashLoan, LoanPhase};
pub use orchestrator::FlashLoanOrchestrator;
pub use reserve::{LendingReserve, ReservePosition};
