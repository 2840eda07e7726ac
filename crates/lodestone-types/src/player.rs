//! Player identity, wallet clusters and tier entitlements (spec §3, §4.I).

use crate::ids::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Bronze,
    Silver,
    Gold,
    Whale,
}

impl Tier {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "bronze" => Some(Tier::Bronze),
            "silver" => Some(Tier::Silver),
            "gold" => Some(Tier::Gold),
            "whale" => Some(Tier::Whale),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub discord_id: String,
    pub wallets: Vec<Address>,
    pub primary_wallet: Option<Address>,
    pub tier: Tier,
    pub state: EngagementState,
    pub flags: Vec<String>,
    pub profile_data: ProfileBlob,
    pub first_seen_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tagged record with an explicit schema plus a permissive extension bag,
/// per spec §9's redesign note on dynamic profile blobs: never a
/// free-form map at the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileBlob {
    pub notify_on_apr_drop: bool,
    pub notify_on_new_optimization: bool,
    #[serde(default, flatten)]
    pub extension: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementState {
    Visitor,
    Explorer,
    Participant,
    Player,
    Active,
    Committed,
}

/// Cluster owns wallets; player references `cluster_key` — one authoritative
/// direction, no in-memory pointer graph (spec §9 redesign note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCluster {
    pub cluster_key: String,
    pub owner_player_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletLink {
    pub cluster_key: String,
    pub chain: String,
    pub address: Address,
    pub is_primary: bool,
    pub is_active: bool,
}
