//! Strong identifiers shared across the workspace.
//!
//! On-chain addresses and hashes are kept as lowercase hex strings rather
//! than raw bytes at the type-sharing boundary: every downstream crate
//! (db, api) speaks JSON, and normalizing once here avoids every consumer
//! re-implementing checksum/lowercasing rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EVM chain id (e.g. 1 for Ethereum mainnet, 53935 for DFK Chain).
pub type ChainId = u64;

/// Lowercase-normalized `0x`-prefixed EVM address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Transaction hash, `0x`-prefixed hex, case-preserved (hashes are not
/// checksum-sensitive but we keep the chain's own casing for display).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(txHash, logIndex)` — the idempotence key for every append-only event
/// table (spec invariant I-1: reprocessing a block range never duplicates
/// rows).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogKey {
    pub tx_hash: TxHash,
    pub log_index: i32,
}

/// Staking-contract pool slot index.
pub type Pid = i64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_normalizes_case() {
        let a = Address::from("0xABCDEF");
        assert_eq!(a.as_str(), "0xabcdef");
    }

    #[test]
    fn address_trims_whitespace() {
        let a = Address::from("  0xabc  ");
        assert_eq!(a.as_str(), "0xabc");
    }
}
