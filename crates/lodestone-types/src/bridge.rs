//! Bridge flows and the unpriced-token catalog (spec §3, §4.E).

use crate::ids::{Address, ChainId, TxHash};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeAssetKind {
    Item,
    Hero,
    Equipment,
    Pet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeDirection {
    In,
    Out,
}

/// Unique on `(tx_hash, wallet, bridge_type)` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeEvent {
    pub wallet: Address,
    pub bridge_type: BridgeAssetKind,
    pub direction: BridgeDirection,
    pub token: Option<Address>,
    pub amount: Option<BigDecimal>,
    pub asset_id: Option<String>,
    pub usd_value: BigDecimal,
    pub src_chain_id: ChainId,
    pub dst_chain_id: ChainId,
    pub tx_hash: TxHash,
    pub block_number: i64,
    pub timestamp: DateTime<Utc>,
}

/// Idempotent rollup of [`BridgeEvent`]s, rebuilt by folding all events for
/// a wallet (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBridgeMetrics {
    pub wallet: Address,
    pub bridged_in_usd: BigDecimal,
    pub bridged_out_usd: BigDecimal,
    pub net_extracted_usd: BigDecimal,
    pub by_token_in: HashMap<String, BigDecimal>,
    pub by_token_out: HashMap<String, BigDecimal>,
    pub heroes_in: i64,
    pub heroes_out: i64,
    pub last_processed_block: i64,
    pub extractor_score: f64,
    pub extractor_flags: Vec<String>,
}

impl WalletBridgeMetrics {
    pub fn empty(wallet: Address) -> Self {
        Self {
            wallet,
            bridged_in_usd: BigDecimal::from(0),
            bridged_out_usd: BigDecimal::from(0),
            net_extracted_usd: BigDecimal::from(0),
            by_token_in: HashMap::new(),
            by_token_out: HashMap::new(),
            heroes_in: 0,
            heroes_out: 0,
            last_processed_block: 0,
            extractor_score: 0.0,
            extractor_flags: Vec::new(),
        }
    }
}

/// Pricing-status enum for tokens seen in bridge flows that have no DEX or
/// historical price yet (spec §4.E bridge indexer bullet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStatus {
    Unpriced,
    HistoricalOnly,
    DexDerived,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpricedToken {
    pub address: Address,
    pub chain_id: ChainId,
    pub first_seen_block: i64,
    pub status: PricingStatus,
    pub last_checked_at: DateTime<Utc>,
}
