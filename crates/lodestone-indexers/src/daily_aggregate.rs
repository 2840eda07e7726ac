//! Daily aggregator (spec §4.F): once per UTC day, folds the day's swap
//! and reward events into a `PoolDailyAggregate`, priced by the snapshot
//! price graph passed in by the caller (the supervisor rebuilds one graph
//! per cycle and shares it across every pool, spec §4.G "shared data is
//! passed forward to avoid recomputation").

use crate::error::Result;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use lodestone_chain::PriceGraphResult;
use lodestone_db::Storage;
use lodestone_types::pool::{AprPolicy, Pool, PoolDailyAggregate};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs the aggregator for one `(pid, date)` pair, using `date`'s
/// `[00:00 UTC, 24:00 UTC)` window as the day boundary (spec §9 open
/// question, resolved to plain UTC rather than the legacy 8pm-ET cutoff).
pub async fn aggregate_pool_day(
    db: &Storage,
    pool: &Pool,
    date: NaiveDate,
    prices: &PriceGraphResult,
    policy: &AprPolicy,
) -> Result<PoolDailyAggregate> {
    let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let day_end = day_start + chrono::Duration::days(1);

    let swaps = db.swap_events_in_range(pool.pid, day_start, day_end).await?;
    let rewards = db.reward_events_in_range(pool.pid, day_start, day_end).await?;

    let price0 = prices.price_of(&pool.token0).cloned();
    let price1 = prices.price_of(&pool.token1).cloned();

    let ten = BigDecimal::from(10);
    let norm = |amount: &BigDecimal, decimals: i16| -> BigDecimal { amount / ten.clone().pow(decimals as u64) };

    let mut volume_usd = BigDecimal::from(0);
    for swap in &swaps {
        if let Some(p0) = &price0 {
            volume_usd += norm(&swap.amount0_in, pool.decimals0) * p0;
        }
        if let Some(p1) = &price1 {
            volume_usd += norm(&swap.amount1_in, pool.decimals1) * p1;
        }
    }
    let fees_usd = &volume_usd * &policy.lp_fee_rate;

    let mut rewards_token = BigDecimal::from(0);
    let mut rewards_usd = BigDecimal::from(0);
    for reward in &rewards {
        rewards_token += &reward.reward_amount;
        if let Some(reward_price) = prices.price_of(&reward.reward_token) {
            rewards_usd += &reward.reward_amount * reward_price;
        }
    }

    let tvl_usd = pool_tvl_usd(pool, prices);

    let (fee_apr, harvest_apr) = if tvl_usd.is_zero() {
        (BigDecimal::from(0), BigDecimal::from(0))
    } else {
        let fee_apr = (&fees_usd / &tvl_usd) * &policy.days_per_year * BigDecimal::from(100);
        let harvest_apr = (&rewards_usd / &tvl_usd) * &policy.days_per_year * BigDecimal::from(100);
        (fee_apr, harvest_apr)
    };
    let total_apr = &fee_apr + &harvest_apr;

    let aggregate = PoolDailyAggregate {
        pid: pool.pid,
        date,
        volume_usd,
        fees_usd,
        rewards_token,
        rewards_usd,
        tvl_usd,
        fee_apr,
        harvest_apr,
        total_apr,
        swap_count: swaps.len() as i64,
        reward_event_count: rewards.len() as i64,
    };

    db.upsert_daily_aggregate(&aggregate).await?;
    info!(pid = pool.pid, date = %date, volume_usd = %aggregate.volume_usd, "daily aggregate written");

    Ok(aggregate)
}

/// `totalStakedV2 · lpUnit` priced through the graph (spec §4.F). LP token
/// price is not itself in the graph (it is not a swappable leaf): a
/// balanced pool's two legs hold equal USD value by construction, so
/// pricing either leg and doubling it gives the pool's USD value. If
/// neither leg prices, TVL is unpriced and reported as zero rather than
/// blocking the whole aggregate (spec §8 boundary behavior).
/// V2-only TVL (spec §4.F defines the full figure as V2 + legacy V1
/// balance; this binary has no V1 staking indexer, so `feeApr` and
/// `harvestApr` both derive from this same V2-only base — see DESIGN.md).
fn pool_tvl_usd(pool: &Pool, prices: &PriceGraphResult) -> BigDecimal {
    let leg_price = prices.price_of(&pool.token0).or_else(|| prices.price_of(&pool.token1));
    match leg_price {
        Some(price) => &pool.total_staked_v2 * price * BigDecimal::from(2),
        None => BigDecimal::from(0),
    }
}

/// Runs the aggregator across every pool for `date`, called once per
/// wall-clock UTC day cutoff by the supervisor (spec §4.F, §4.L schedule).
pub async fn aggregate_all_pools(
    db: &Storage,
    date: NaiveDate,
    prices: &PriceGraphResult,
    policy: &AprPolicy,
) -> Result<Vec<PoolDailyAggregate>> {
    let pools = db.list_pools().await?;
    let mut aggregates = Vec::with_capacity(pools.len());
    for pool in &pools {
        aggregates.push(aggregate_pool_day(db, pool, date, prices, policy).await?);
    }
    Ok(aggregates)
}

/// `[00:00 UTC, 23:59:59 UTC)` of the prior day, the cutoff pinned by the
/// spec's open question (SPEC_FULL.md §14.1).
pub fn yesterday_utc(now: DateTime<Utc>) -> NaiveDate {
    (now - chrono::Duration::days(1)).date_naive()
}

fn duration_until_next_utc_midnight(now: DateTime<Utc>) -> Duration {
    let tomorrow = now.date_naive() + chrono::Duration::days(1);
    let next_midnight = tomorrow.and_hms_opt(0, 0, 0).unwrap().and_utc();
    (next_midnight - now).to_std().unwrap_or(Duration::from_secs(1))
}

/// Pool-analytics cache (spec §4.L): rolls yesterday's aggregate for every
/// pool once per UTC day, then sleeps until the next cutoff. `build_prices`
/// is caller-supplied: assembling a fresh price graph needs a live chain
/// client this crate doesn't hold (spec §4.G "shared data is passed
/// forward").
pub async fn run<F, Fut>(
    db: &Storage,
    policy: &AprPolicy,
    build_prices: F,
    shutdown: &CancellationToken,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<PriceGraphResult>>,
{
    loop {
        let now = Utc::now();
        let date = yesterday_utc(now);
        match build_prices().await {
            Ok(prices) => match aggregate_all_pools(db, date, &prices, policy).await {
                Ok(aggregates) => info!(date = %date, pool_count = aggregates.len(), "daily aggregate cycle complete"),
                Err(e) => warn!(date = %date, error = %e, "daily aggregate cycle failed"),
            },
            Err(e) => warn!(date = %date, error = %e, "price graph build failed, skipping this cycle"),
        }

        tokio::select! {
            _ = tokio::time::sleep(duration_until_next_utc_midnight(Utc::now())) => {}
            _ = shutdown.cancelled() => return Ok(()),
        }
    }
}
