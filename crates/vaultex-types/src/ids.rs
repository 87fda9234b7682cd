//! Identifiers used throughout Vaultex.
//!
//! Accounts and assets are 20-byte addresses rendered as `0x`-prefixed hex.
//! Orders use a per-exchange monotonic counter.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::VaultexError;

/// Length in bytes of an account or asset address.
pub const ADDRESS_LEN: usize = 20;

/// Hash `domain || label` and keep the first [`ADDRESS_LEN`] bytes.
fn derive_address(domain: &[u8], label: &str) -> [u8; ADDRESS_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(label.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&hash[..ADDRESS_LEN]);
    bytes
}

fn parse_address(s: &str) -> Result<[u8; ADDRESS_LEN], VaultexError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let raw = hex::decode(digits)
        .map_err(|e| VaultexError::Serialization(format!("invalid address {s:?}: {e}")))?;
    raw.try_into().map_err(|raw: Vec<u8>| {
        VaultexError::Serialization(format!(
            "address {s:?} has {} bytes, expected {ADDRESS_LEN}",
            raw.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of any party holding balances: users, the fee collector, the
/// exchange's own custody account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(pub [u8; ADDRESS_LEN]);

impl AccountId {
    /// The zero address. Never a valid transfer recipient.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Deterministic account id for a human label (fixtures, deployments).
    #[must_use]
    pub fn derive(label: &str) -> Self {
        Self(derive_address(b"vaultex:account:v1:", label))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// First four bytes as hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

impl FromStr for AccountId {
    type Err = VaultexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map(Self)
    }
}

impl TryFrom<String> for AccountId {
    type Error = VaultexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Address of a deployed asset ledger (one fungible token).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(pub [u8; ADDRESS_LEN]);

impl AssetId {
    /// Deterministic asset address from the deployer and its deployment
    /// sequence number, so redeploying the same world yields the same ids.
    #[must_use]
    pub fn derive(deployer: AccountId, sequence: u64) -> Self {
        let label = format!("{deployer}:{sequence}");
        Self(derive_address(b"vaultex:asset:v1:", &label))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({self})")
    }
}

impl FromStr for AssetId {
    type Err = VaultexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map(Self)
    }
}

impl TryFrom<String> for AssetId {
    type Error = VaultexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.to_string()
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Order identifier, allocated from a per-exchange counter starting at 1.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct OrderId(pub u64);

impl OrderId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", self.0)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    /// A random, non-zero account id.
    pub fn random() -> Self {
        loop {
            let id = Self(rand::random::<[u8; ADDRESS_LEN]>());
            if !id.is_zero() {
                return id;
            }
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl AssetId {
    pub fn random() -> Self {
        Self(rand::random::<[u8; ADDRESS_LEN]>())
    }
}
