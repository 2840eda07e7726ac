//! Pool economics: `Pool`, `StakerPosition`, `SwapEvent`, `RewardEvent`,
//! `PoolDailyAggregate`, `PricedToken` (spec §3, §4.C-F).

use crate::ids::{Address, Pid, TxHash};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Derived, not persisted as truth; rebuilt every analytics cycle by the
/// price graph (spec §3, invariant I-3: price is `Some` iff a path of
/// non-empty reserves exists to the anchor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedToken {
    pub address: Address,
    pub usd_price: BigDecimal,
    pub derived_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub pid: Pid,
    pub lp_token: Address,
    pub token0: Address,
    pub token1: Address,
    pub decimals0: i16,
    pub decimals1: i16,
    pub symbol0: String,
    pub symbol1: String,
    pub alloc_point: i64,
    pub total_staked_v2: BigDecimal,
}

/// Unique on `(wallet, pid)`; mutated only by the stake indexer, with
/// last-writer-wins semantics reconciled periodically against authoritative
/// on-chain `userInfo` reads (spec §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakerPosition {
    pub wallet: Address,
    pub pid: Pid,
    pub staked_lp: BigDecimal,
    pub last_activity_type: StakeActivity,
    pub last_activity_block: i64,
    pub last_activity_tx_hash: TxHash,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeActivity {
    Deposit,
    Withdraw,
    EmergencyWithdraw,
    Reconcile,
}

/// Append-only, unique on `(tx_hash, log_index)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvent {
    pub pid: Pid,
    pub block_number: i64,
    pub tx_hash: TxHash,
    pub log_index: i32,
    pub amount0_in: BigDecimal,
    pub amount1_in: BigDecimal,
    pub amount0_out: BigDecimal,
    pub amount1_out: BigDecimal,
    pub timestamp: DateTime<Utc>,
}

/// Append-only, unique on `(tx_hash, log_index)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEvent {
    pub pid: Pid,
    pub block_number: i64,
    pub tx_hash: TxHash,
    pub log_index: i32,
    pub reward_token: Address,
    pub reward_amount: BigDecimal,
    pub timestamp: DateTime<Utc>,
}

/// Unique on `(pid, date)`; written once per day by the daily aggregator,
/// read-mostly after that (spec §3, §4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolDailyAggregate {
    pub pid: Pid,
    pub date: NaiveDate,
    pub volume_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub rewards_token: BigDecimal,
    pub rewards_usd: BigDecimal,
    pub tvl_usd: BigDecimal,
    pub fee_apr: BigDecimal,
    pub harvest_apr: BigDecimal,
    pub total_apr: BigDecimal,
    pub swap_count: i64,
    pub reward_event_count: i64,
}

impl PoolDailyAggregate {
    /// An aggregate for a day with zero events has all economic fields at
    /// zero and `tvl_usd` equal to the day-end reserves snapshot — never
    /// undefined (spec §8 boundary behavior).
    pub fn empty(pid: Pid, date: NaiveDate, tvl_usd: BigDecimal) -> Self {
        Self {
            pid,
            date,
            volume_usd: BigDecimal::from(0),
            fees_usd: BigDecimal::from(0),
            rewards_token: BigDecimal::from(0),
            rewards_usd: BigDecimal::from(0),
            tvl_usd,
            fee_apr: BigDecimal::from(0),
            harvest_apr: BigDecimal::from(0),
            total_apr: BigDecimal::from(0),
            swap_count: 0,
            reward_event_count: 0,
        }
    }
}

/// Parameterized economic constants (spec §9 open questions): the LP fee
/// share and the gardening-quest APR boost multiplier must be retunable
/// without a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprPolicy {
    /// LP share of the swap fee, e.g. `0.002` for 0.20% (spec §9: pinned to
    /// 0.20% because that is the value spec §4.F's formula actually uses).
    pub lp_fee_rate: BigDecimal,
    /// Days per year used to annualize fee/harvest APR.
    pub days_per_year: BigDecimal,
    /// Gardening-quest APR boost multiplier (spec §9, hand-calibrated).
    pub garden_boost_multiplier: BigDecimal,
}

impl Default for AprPolicy {
    fn default() -> Self {
        Self {
            lp_fee_rate: "0.002".parse().unwrap(),
            days_per_year: "365".parse().unwrap(),
            garden_boost_multiplier: "0.00012".parse().unwrap(),
        }
    }
}
