//! Game-event tables that are not pool economics: hunt/patrol drops,
//! tournaments, marketplace (tavern) snapshots, and the summon funnel
//! (spec §4.E, §13 supplement).

use crate::ids::{Address, ChainId, TxHash};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyLuckSnapshot {
    pub party_size: i16,
    pub avg_luck: f64,
    pub avg_level: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuntEncounter {
    pub chain_id: ChainId,
    pub wallet: Address,
    pub tx_hash: TxHash,
    pub block_number: i64,
    pub drop_item: Option<String>,
    pub drop_quantity: i64,
    pub party_luck: PartyLuckSnapshot,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentPlacement {
    pub tournament_id: i64,
    pub wallet: Address,
    pub hero_id: String,
    pub placement: i32,
    pub tx_hash: TxHash,
    pub timestamp: DateTime<Utc>,
}

/// Full hero state captured at participation time (spec §4.E: "a full
/// `HeroTournamentSnapshot`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroTournamentSnapshot {
    pub tournament_id: i64,
    pub hero_id: String,
    pub stats: serde_json::Value,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOutcome {
    StillListed,
    Sold,
    Delisted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavernListing {
    pub listing_id: String,
    pub seller: Address,
    pub asset_id: String,
    pub price: BigDecimal,
    pub snapshot_hour: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavernListingHistory {
    pub listing_id: String,
    pub observed_hour: DateTime<Utc>,
    pub outcome: ListingOutcome,
}

/// Summon funnel tracker (spec §13 supplement): summon attempt, offspring
/// outcome, and marketplace sale outcome, keyed by wallet, purely as
/// append-only rollup rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummonSession {
    pub id: i64,
    pub wallet: Address,
    pub parent_a: String,
    pub parent_b: String,
    pub tx_hash: TxHash,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummonOffspring {
    pub session_id: i64,
    pub offspring_id: String,
    pub rarity_tier: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummonSaleOutcome {
    pub offspring_id: String,
    pub sold_for_usd: Option<BigDecimal>,
    pub sold_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummonConversionMetrics {
    pub wallet: Address,
    pub sessions: i64,
    pub offspring_total: i64,
    pub sold_total: i64,
    pub revenue_usd: BigDecimal,
}
