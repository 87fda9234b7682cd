//! Per-unit call context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Who is acting and when. Every operation inside one atomic unit (nested
/// flash-loan callbacks included) sees the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The acting party. Never a delegate.
    pub caller: AccountId,
    /// Timestamp of the enclosing atomic unit.
    pub timestamp: DateTime<Utc>,
}

impl CallContext {
    #[must_use]
    pub fn new(caller: AccountId, timestamp: DateTime<Utc>) -> Self {
        Self { caller, timestamp }
    }

    /// Same unit, different acting party. Used when a callback acts as
    /// itself inside the caller's unit.
    #[must_use]
    pub fn as_caller(&self, caller: AccountId) -> Self {
        Self {
            caller,
            timestamp: self.timestamp,
        }
    }
}
