//! `WalletActivity` rollup: the non-bridge half of the classification
//! engine's inputs (spec §4.J — "recent `WalletActivity` rollups,
//! `WalletBridgeMetrics`, recent message topics"). Folded on the fly from
//! stake, hunt, tournament and summon rows; never persisted as its own
//! table since it is cheap to recompute and has no independent identity.

use crate::ids::Address;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletActivity {
    pub wallet: Address,
    pub pools_staked: i64,
    pub total_staked_lp: BigDecimal,
    pub hunts_count: i64,
    pub tournament_participations: i64,
    pub best_tournament_placement: Option<i32>,
    pub summon_sessions: i64,
    pub summon_offspring_total: i64,
    pub summon_revenue_usd: BigDecimal,
    pub tavern_listings_count: i64,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl WalletActivity {
    pub fn empty(wallet: Address) -> Self {
        Self {
            wallet,
            pools_staked: 0,
            total_staked_lp: BigDecimal::from(0),
            hunts_count: 0,
            tournament_participations: 0,
            best_tournament_placement: None,
            summon_sessions: 0,
            summon_offspring_total: 0,
            summon_revenue_usd: BigDecimal::from(0),
            tavern_listings_count: 0,
            last_activity_at: None,
        }
    }

    /// Folds `other` into `self`, keeping the most recent `last_activity_at`
    /// and the best (lowest) tournament placement. Used to combine the
    /// per-wallet rollups of every wallet in a player's cluster into one
    /// cluster-level rollup (spec §9: cluster owns wallets, one authoritative
    /// direction).
    pub fn merge(mut self, other: WalletActivity) -> Self {
        self.pools_staked += other.pools_staked;
        self.total_staked_lp += other.total_staked_lp;
        self.hunts_count += other.hunts_count;
        self.tournament_participations += other.tournament_participations;
        self.best_tournament_placement = match (self.best_tournament_placement, other.best_tournament_placement) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        };
        self.summon_sessions += other.summon_sessions;
        self.summon_offspring_total += other.summon_offspring_total;
        self.summon_revenue_usd += other.summon_revenue_usd;
        self.tavern_listings_count += other.tavern_listings_count;
        self.last_activity_at = match (self.last_activity_at, other.last_activity_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, None) => a,
            (None, b) => b,
        };
        self
    }
}
