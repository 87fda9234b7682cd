//! Flash-loan orchestration.
//!
//! `request_loan` runs the whole borrow / use / repay cycle synchronously:
//!
//! 1. Read the reserve's net position.
//! 2. Disburse the principal to the borrower.
//! 3. Invoke the borrower callback with the same world.
//! 4. Re-read the net position and require it to be at least `premium`
//!    above the first reading.
//!
//! The orchestrator never undoes anything itself. A failed loan returns
//! `Err` and the surrounding atomic unit discards the disbursal along with
//! everything the callback did.

use vaultex_types::{
    Amount, AssetId, CallContext, Event, FlashLoanConfig, PremiumPolicy, Result, VaultexError,
};

use crate::{
    borrower::{FlashBorrower, FlashLoan, LoanPhase},
    reserve::LendingReserve,
};

/// Stateless apart from its premium policy; copy it out of the world before
/// lending from that world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashLoanOrchestrator {
    config: FlashLoanConfig,
}

impl FlashLoanOrchestrator {
    /// # Errors
    /// Returns `Configuration` if the premium policy is out of range.
    pub fn new(config: FlashLoanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn premium(&self) -> PremiumPolicy {
        self.config.premium
    }

    /// Lend `amount` of `asset` to `ctx.caller` for the duration of the
    /// `borrower` callback.
    ///
    /// # Errors
    /// - `InvalidLoan` for a zero amount
    /// - `TransferFailed` if the reserve cannot disburse
    /// - whatever the callback returns, unchanged
    /// - `LoanNotRepaid` if the reserve did not get `amount + premium` back
    pub fn request_loan<E, B>(
        &self,
        env: &mut E,
        ctx: &CallContext,
        asset: AssetId,
        amount: Amount,
        borrower: &mut B,
    ) -> Result<FlashLoan>
    where
        E: LendingReserve + ?Sized,
        B: FlashBorrower<E> + ?Sized,
    {
        if amount == 0 {
            return Err(VaultexError::InvalidLoan {
                reason: "amount must be non-zero".into(),
            });
        }
        let premium = self.config.premium.premium_for(amount)?;
        let expected = amount
            .checked_add(premium)
            .ok_or(VaultexError::ArithmeticOverflow)?;

        let mut loan = FlashLoan {
            borrower: ctx.caller,
            asset,
            amount,
            premium,
            reserve: env.reserve_account(),
            phase: LoanPhase::Idle,
        };
        let before = env.reserve_position(asset)?;

        env.disburse(asset, loan.borrower, amount)
            .map_err(|err| VaultexError::TransferFailed {
                asset,
                reason: err.to_string(),
            })?;
        loan.phase = LoanPhase::Borrowed;
        tracing::debug!(
            borrower = %loan.borrower,
            asset = %asset,
            amount,
            premium,
            phase = %loan.phase,
            "Flash loan disbursed"
        );

        borrower
            .on_flash_loan(env, ctx, &loan)
            .inspect_err(|err| {
                tracing::warn!(borrower = %loan.borrower, asset = %asset, error = %err, "Flash loan callback failed");
            })?;

        // Fresh read: the callback may have moved anything, including via
        // nested loans against the same reserve.
        let returned = env
            .reserve_position(asset)?
            .returned_since(&before, amount);
        if returned < expected {
            tracing::warn!(
                borrower = %loan.borrower,
                asset = %asset,
                expected,
                returned,
                "Flash loan not repaid"
            );
            return Err(VaultexError::LoanNotRepaid { expected, returned });
        }

        loan.phase = LoanPhase::Repaid;
        env.record_loan(Event::FlashLoan {
            borrower: loan.borrower,
            asset,
            amount,
            premium,
            timestamp: ctx.timestamp,
        });
        tracing::info!(
            borrower = %loan.borrower,
            asset = %asset,
            amount,
            premium,
            returned,
            "Flash loan repaid"
        );
        Ok(loan)
    }
}
