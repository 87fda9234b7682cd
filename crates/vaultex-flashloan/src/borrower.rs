//! Borrower callbacks and the per-loan session record.

use std::fmt;

use vaultex_types::{AccountId, Amount, AssetId, CallContext, Result};

/// Phase of one loan inside its atomic unit.
///
/// ```text
/// Idle ──disburse──▶ Borrowed ──repayment verified──▶ Repaid
/// ```
///
/// A loan that never reaches `Repaid` fails the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanPhase {
    Idle,
    Borrowed,
    Repaid,
}

impl fmt::Display for LoanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Borrowed => write!(f, "BORROWED"),
            Self::Repaid => write!(f, "REPAID"),
        }
    }
}

/// One flash loan. Exists only for the duration of `request_loan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashLoan {
    pub borrower: AccountId,
    pub asset: AssetId,
    /// Principal.
    pub amount: Amount,
    pub premium: Amount,
    /// Reserve the funds came from and must return to.
    pub reserve: AccountId,
    pub phase: LoanPhase,
}

impl FlashLoan {
    /// Principal plus premium.
    #[must_use]
    pub fn repayment(&self) -> Amount {
        self.amount.saturating_add(self.premium)
    }
}

/// Use-of-funds logic run while the loan is outstanding.
///
/// `env` is the same world the loan was taken from, so the callback can
/// deposit, trade, transfer or borrow again. It must leave the reserve at
/// least `loan.repayment()` better off than right after the disbursal.
/// Returning `Err` fails the whole loan.
pub trait FlashBorrower<E: ?Sized> {
    fn on_flash_loan(&mut self, env: &mut E, ctx: &CallContext, loan: &FlashLoan) -> Result<()>;
}

impl<E, F> FlashBorrower<E> for F
where
    E: ?Sized,
    F: FnMut(&mut E, &CallContext, &FlashLoan) -> Result<()>,
{
    fn on_flash_loan(&mut self, env: &mut E, ctx: &CallContext, loan: &FlashLoan) -> Result<()> {
        self(env, ctx, loan)
    }
}
