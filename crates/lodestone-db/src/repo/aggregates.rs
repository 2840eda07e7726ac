//! Daily aggregate cache (spec §4.F, §3): unique on `(pid, date)`, written
//! once per day, read-mostly after that.

use crate::error::Result;
use crate::storage::Storage;
use chrono::{NaiveDate, Utc};
use lodestone_types::ids::Pid;
use lodestone_types::pool::PoolDailyAggregate;
use sqlx::Row;

impl Storage {
    pub async fn upsert_daily_aggregate(&self, agg: &PoolDailyAggregate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pool_daily_aggregates
                (pid, date, volume_usd, fees_usd, rewards_token, rewards_usd, tvl_usd,
                 fee_apr, harvest_apr, total_apr, swap_count, reward_event_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (pid, date) DO UPDATE SET
                volume_usd = EXCLUDED.volume_usd,
                fees_usd = EXCLUDED.fees_usd,
                rewards_token = EXCLUDED.rewards_token,
                rewards_usd = EXCLUDED.rewards_usd,
                tvl_usd = EXCLUDED.tvl_usd,
                fee_apr = EXCLUDED.fee_apr,
                harvest_apr = EXCLUDED.harvest_apr,
                total_apr = EXCLUDED.total_apr,
                swap_count = EXCLUDED.swap_count,
                reward_event_count = EXCLUDED.reward_event_count
            "#,
        )
        .bind(agg.pid)
        .bind(agg.date)
        .bind(&agg.volume_usd)
        .bind(&agg.fees_usd)
        .bind(&agg.rewards_token)
        .bind(&agg.rewards_usd)
        .bind(&agg.tvl_usd)
        .bind(&agg.fee_apr)
        .bind(&agg.harvest_apr)
        .bind(&agg.total_apr)
        .bind(agg.swap_count)
        .bind(agg.reward_event_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_daily_aggregate(&self, pid: Pid, date: NaiveDate) -> Result<Option<PoolDailyAggregate>> {
        let row = sqlx::query("SELECT * FROM pool_daily_aggregates WHERE pid = $1 AND date = $2")
            .bind(pid)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_aggregate))
    }

    /// Latest aggregate for a pool, used by the "prefer cache over live
    /// scan" performance contract (spec §4.F).
    pub async fn latest_daily_aggregate(&self, pid: Pid) -> Result<Option<PoolDailyAggregate>> {
        let row = sqlx::query(
            "SELECT * FROM pool_daily_aggregates WHERE pid = $1 ORDER BY date DESC LIMIT 1",
        )
        .bind(pid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_aggregate))
    }

    /// Is the latest cached aggregate fresh enough to serve without a live
    /// scan (spec §4.F: "≤ 2 days old")?
    pub async fn has_fresh_aggregate(&self, pid: Pid) -> Result<bool> {
        match self.latest_daily_aggregate(pid).await? {
            Some(agg) => {
                let today = Utc::now().date_naive();
                Ok((today - agg.date).num_days() <= 2)
            }
            None => Ok(false),
        }
    }
}

fn row_to_aggregate(r: sqlx::postgres::PgRow) -> PoolDailyAggregate {
    PoolDailyAggregate {
        pid: r.get("pid"),
        date: r.get("date"),
        volume_usd: r.get("volume_usd"),
        fees_usd: r.get("fees_usd"),
        rewards_token: r.get("rewards_token"),
        rewards_usd: r.get("rewards_usd"),
        tvl_usd: r.get("tvl_usd"),
        fee_apr: r.get("fee_apr"),
        harvest_apr: r.get("harvest_apr"),
        total_apr: r.get("total_apr"),
        swap_count: r.get("swap_count"),
        reward_event_count: r.get("reward_event_count"),
    }
}
