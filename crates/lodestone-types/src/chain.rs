//! `ChainEndpoint` and `IndexerCheckpoint` (spec §3).

use crate::ids::ChainId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-lifetime constant describing one RPC endpoint (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEndpoint {
    pub chain_id: ChainId,
    pub name: String,
    pub rpc_http: String,
    pub rpc_ws: Option<String>,
    /// Hard cap on any single `eth_getLogs` window (default 2048, spec §4.A).
    pub chunk_size: u64,
    /// Confirmations subtracted from chain head before scanning (reorg safety).
    pub confirmations: u64,
}

impl ChainEndpoint {
    pub const DEFAULT_CHUNK_SIZE: u64 = 2048;
}

/// What kind of logical worker owns a checkpoint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexerKind {
    Stake,
    Swap,
    Reward,
    Bridge,
    Hunt,
    Tournament,
    Marketplace,
    DailyAggregate,
    Deposit,
}

impl IndexerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexerKind::Stake => "stake",
            IndexerKind::Swap => "swap",
            IndexerKind::Reward => "reward",
            IndexerKind::Bridge => "bridge",
            IndexerKind::Hunt => "hunt",
            IndexerKind::Tournament => "tournament",
            IndexerKind::Marketplace => "marketplace",
            IndexerKind::DailyAggregate => "daily_aggregate",
            IndexerKind::Deposit => "deposit",
        }
    }
}

/// Operational status of one checkpoint (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    Idle,
    Running,
    Complete,
    Error,
}

/// `IndexerCheckpoint` — one row per logical worker, exclusively written
/// by its owning worker (spec §3 invariant: `genesisBlock <= lastIndexedBlock
/// <= shardEnd? | latestBlock`, never decreasing except on explicit reset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerCheckpoint {
    pub name: String,
    pub kind: IndexerKind,
    pub pid: Option<i64>,
    pub shard_start: i64,
    pub shard_end: Option<i64>,
    pub last_indexed_block: i64,
    pub genesis_block: i64,
    pub status: CheckpointStatus,
    pub stats: serde_json::Value,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl IndexerCheckpoint {
    pub fn seeded(name: impl Into<String>, kind: IndexerKind, genesis_block: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            pid: None,
            shard_start: genesis_block,
            shard_end: None,
            last_indexed_block: genesis_block.saturating_sub(1),
            genesis_block,
            status: CheckpointStatus::Idle,
            stats: serde_json::json!({}),
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    /// Invariant check used by tests and by the checkpoint store before a
    /// write is accepted.
    pub fn is_well_formed(&self) -> bool {
        if self.last_indexed_block < self.genesis_block - 1 {
            return false;
        }
        if let Some(end) = self.shard_end {
            if self.last_indexed_block > end {
                return false;
            }
        }
        true
    }
}

/// A change-set applied to a checkpoint row by its owning worker (4.B `upsert`).
#[derive(Debug, Clone, Default)]
pub struct CheckpointDelta {
    pub last_indexed_block: Option<i64>,
    pub status: Option<CheckpointStatus>,
    pub stats: Option<serde_json::Value>,
    pub last_error: Option<Option<String>>,
}
