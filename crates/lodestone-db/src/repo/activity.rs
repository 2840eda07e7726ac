//! Builds the `WalletActivity` rollup consumed by the classification
//! engine (spec §4.J). Computed on the fly from stake/hunt/tournament/
//! summon/tavern rows, the same "no standing rollup table" pattern as
//! [`Storage::summon_conversion_metrics`].

use crate::error::Result;
use crate::storage::Storage;
use lodestone_types::activity::WalletActivity;
use lodestone_types::ids::Address;

impl Storage {
    pub async fn wallet_activity(&self, wallet: &Address) -> Result<WalletActivity> {
        let positions = self.staker_positions_for_wallet(wallet).await?;
        let hunts = self.hunt_encounters_for_wallet(wallet, i64::MAX).await?;
        let placements = self.tournament_placements_for_wallet(wallet).await?;
        let summon = self.summon_conversion_metrics(wallet).await?;
        let tavern_listings_count = self.tavern_listings_count_for_seller(wallet).await?;

        let pools_staked = positions.len() as i64;
        let total_staked_lp = positions
            .iter()
            .fold(bigdecimal::BigDecimal::from(0), |acc, p| acc + &p.staked_lp);

        let best_tournament_placement = placements.iter().map(|p| p.placement).min();

        let mut last_activity_at = positions.iter().map(|p| p.updated_at).max();
        last_activity_at = max_opt(last_activity_at, hunts.iter().map(|h| h.timestamp).max());
        last_activity_at = max_opt(last_activity_at, placements.iter().map(|p| p.timestamp).max());

        Ok(WalletActivity {
            wallet: wallet.clone(),
            pools_staked,
            total_staked_lp,
            hunts_count: hunts.len() as i64,
            tournament_participations: placements.len() as i64,
            best_tournament_placement,
            summon_sessions: summon.sessions,
            summon_offspring_total: summon.offspring_total,
            summon_revenue_usd: summon.revenue_usd,
            tavern_listings_count,
            last_activity_at,
        })
    }
}

fn max_opt(
    a: Option<chrono::DateTime<chrono::Utc>>,
    b: Option<chrono::DateTime<chrono::Utc>>,
) -> Option<chrono::DateTime<chrono::Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
