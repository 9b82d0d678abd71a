//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `AccountId`, `Hash`
//! - **Amounts**: `Balance`, `NativeBalance`
//! - **Indexer facts**: `AccountEntry`, `ChannelEntry`

use serde::{Deserialize, Serialize};
use std::fmt;

pub use primitive_types::U256;

/// A 32-byte hash (keccak256 throughout this workspace).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// The all-zero hash. An on-chain secret equal to this was never set.
pub const EMPTY_HASH: Hash = [0u8; 32];

/// Render bytes as a `0x`-prefixed lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Account identifier derived from a secp256k1 public key.
///
/// The derivation itself lives in `shared-crypto`; this type only carries the
/// resulting 20 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct AccountId(pub Address);

impl AccountId {
    /// Wrap raw address bytes.
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &Address {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl From<Address> for AccountId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// =============================================================================
// AMOUNTS
// =============================================================================

/// Channel-token amount (the unit tickets and stakes are denominated in).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Balance(pub U256);

/// Native coin amount (used to pay gas).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NativeBalance(pub U256);

macro_rules! amount_impls {
    ($ty:ident, $unit:literal) => {
        impl $ty {
            /// Zero amount.
            pub const fn zero() -> Self {
                Self(U256::zero())
            }

            /// Underlying integer value.
            pub fn value(&self) -> U256 {
                self.0
            }

            /// Addition that fails instead of wrapping.
            pub fn checked_add(self, other: Self) -> Option<Self> {
                self.0.checked_add(other.0).map(Self)
            }

            /// Subtraction that fails instead of going negative.
            pub fn checked_sub(self, other: Self) -> Option<Self> {
                self.0.checked_sub(other.0).map(Self)
            }
        }

        impl From<u64> for $ty {
            fn from(value: u64) -> Self {
                Self(U256::from(value))
            }
        }

        impl From<U256> for $ty {
            fn from(value: U256) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.0, $unit)
            }
        }
    };
}

amount_impls!(Balance, "token");
amount_impls!(NativeBalance, "native");

// =============================================================================
// INDEXER FACTS
// =============================================================================

/// Per-account facts the indexer reads from the channels contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    /// Number of times the account rotated its committed secret.
    pub counter: u64,
    /// Currently committed secret (tip of the account's hash chain).
    pub hashed_secret: Hash,
}

impl AccountEntry {
    /// The committed secret, or `None` if it was never set.
    pub fn committed_secret(&self) -> Option<Hash> {
        if self.hashed_secret == EMPTY_HASH {
            None
        } else {
            Some(self.hashed_secret)
        }
    }
}

/// A payment channel as reported by the indexer: `(source, destination, stake)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Account that funded the channel.
    pub source: Address,
    /// Counterparty of the channel.
    pub destination: Address,
    /// Amount staked by the source.
    pub stake: Balance,
}
