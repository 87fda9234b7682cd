//! Error types for Vaultex.
//!
//! All errors use the `VX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Custodial balance errors
//! - 3xx: Asset ledger errors
//! - 4xx: Flash loan errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, Amount, AssetId, OrderId, OrderStatus};

/// Central error enum for all Vaultex operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultexError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// No order was ever allocated under this id.
    #[error("VX_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order is not `Open` (already filled or cancelled).
    #[error("VX_ERR_101: Order {id} is not open (status {status})")]
    OrderNotOpen { id: OrderId, status: OrderStatus },

    /// Cancellation attempted by someone other than the maker.
    #[error("VX_ERR_102: {caller} is not the owner of {id}")]
    NotOrderOwner { id: OrderId, caller: AccountId },

    /// The order terms are malformed (zero amounts, same asset both sides).
    #[error("VX_ERR_103: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    // =================================================================
    // Custodial Balance Errors (2xx)
    // =================================================================
    /// Requested amount exceeds `total - locked`.
    #[error("VX_ERR_200: Insufficient available balance: need {needed}, have {available}")]
    InsufficientAvailableBalance { needed: Amount, available: Amount },

    /// Releasing or consuming more than is locked. Indicates a broken
    /// reservation and never happens through the public operations.
    #[error("VX_ERR_201: Insufficient locked balance: need {needed}, have {locked}")]
    InsufficientLocked { needed: Amount, locked: Amount },

    /// The asset ledger rejected a pull or push transfer.
    #[error("VX_ERR_202: Transfer of {asset} failed: {reason}")]
    TransferFailed { asset: AssetId, reason: String },

    /// Custodial books disagree with deposits minus withdrawals, or with the
    /// reservations of open orders. Critical.
    #[error("VX_ERR_203: Ledger invariant violation: {reason}")]
    InvariantViolation { reason: String },

    // =================================================================
    // Asset Ledger Errors (3xx)
    // =================================================================
    /// No asset ledger is deployed at this address.
    #[error("VX_ERR_300: Unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// Sender's ledger balance is too small.
    #[error("VX_ERR_301: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// Spender's allowance is too small.
    #[error("VX_ERR_302: Insufficient allowance: need {needed}, approved {approved}")]
    InsufficientAllowance { needed: Amount, approved: Amount },

    /// Transfer or approval targeting the zero account.
    #[error("VX_ERR_303: Invalid recipient")]
    InvalidRecipient,

    // =================================================================
    // Flash Loan Errors (4xx)
    // =================================================================
    /// The reserve did not get principal + premium back before the
    /// callback returned.
    #[error("VX_ERR_400: Flash loan not repaid: expected {expected}, returned {returned}")]
    LoanNotRepaid { expected: Amount, returned: Amount },

    /// The loan request itself is malformed.
    #[error("VX_ERR_401: Invalid loan: {reason}")]
    InvalidLoan { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// An amount computation left the `u128` range.
    #[error("VX_ERR_900: Arithmetic overflow")]
    ArithmeticOverflow,

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("VX_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / parsing error.
    #[error("VX_ERR_902: Serialization error: {0}")]
    Serialization(String),

    /// The runtime task is gone (handle used after shutdown).
    #[error("VX_ERR_903: Runtime unavailable")]
    RuntimeUnavailable,
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, VaultexError>;

impl From<serde_json::Error> for VaultexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
