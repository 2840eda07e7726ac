//! `getPoolAnalytics`/`getAllPoolAnalytics` (spec §4.G): assembles from the
//! daily-aggregate cache when fresh, falling back to a live fold of the
//! already-ingested swap/reward rows (the "live chunked RPC scan" is
//! already done by the indexer fleet in the background; the live path
//! here means "compute from raw rows instead of the cache", spec §4.F's
//! performance contract).

use crate::deadline::{Deadline, Partial};
use crate::error::{AnalyticsError, Result};
use lodestone_chain::pool_discovery::{build_focused_price_graph, PoolDiscovery, ReserveReader};
use lodestone_chain::PriceGraphResult;
use lodestone_db::Storage;
use lodestone_indexers::daily_aggregate::{aggregate_pool_day, yesterday_utc};
use lodestone_types::ids::{Address, Pid};
use lodestone_types::pool::{AprPolicy, Pool, PoolDailyAggregate};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsSource {
    Cached,
    LiveFold,
}

#[derive(Debug, Clone)]
pub struct PoolAnalytics {
    pub pool: Pool,
    pub aggregate: PoolDailyAggregate,
    pub source: AnalyticsSource,
}

/// `getPoolAnalytics(pid)` (spec §4.G). `prices` is a process-local
/// snapshot the caller maintains and rebuilds periodically (spec §5:
/// "writers publish a new immutable snapshot rather than mutating in
/// place") — this function never rebuilds it itself.
pub async fn get_pool_analytics(
    db: &Storage,
    prices: &PriceGraphResult,
    policy: &AprPolicy,
    pid: Pid,
    deadline: Deadline,
) -> Result<Partial<PoolAnalytics>> {
    let pool = db.get_pool(pid).await?.ok_or(AnalyticsError::PoolNotFound(pid))?;

    if deadline.is_expired() {
        let placeholder = PoolDailyAggregate::empty(pid, yesterday_utc(chrono::Utc::now()), pool.total_staked_v2.clone());
        return Ok(Partial::truncated(
            PoolAnalytics {
                pool,
                aggregate: placeholder,
                source: AnalyticsSource::LiveFold,
            },
            "deadline reached before any aggregate could be read",
        ));
    }

    if db.has_fresh_aggregate(pid).await? {
        if let Some(aggregate) = db.latest_daily_aggregate(pid).await? {
            return Ok(Partial::complete(PoolAnalytics {
                pool,
                aggregate,
                source: AnalyticsSource::Cached,
            }));
        }
    }

    let date = yesterday_utc(chrono::Utc::now());
    let aggregate = aggregate_pool_day(db, &pool, date, prices, policy).await?;
    Ok(Partial::complete(PoolAnalytics {
        pool,
        aggregate,
        source: AnalyticsSource::LiveFold,
    }))
}

/// `getPoolStakers(pid)` (spec §4.G): thin pass-through, the filtering and
/// sort order already live in the storage layer.
pub async fn get_pool_stakers(db: &Storage, pid: Pid) -> Result<Vec<lodestone_types::pool::StakerPosition>> {
    Ok(db.get_pool_stakers(pid).await?)
}

/// `getAllPoolAnalytics()` (spec §4.G): the five-stage pipeline —
/// discover, build a focused price graph, (prices come bundled with the
/// graph so there is no separate "fetch key prices" RPC step here),
/// compute the block range implicitly via `yesterday_utc`, then per-pool
/// analytics reusing the one shared graph.
pub async fn get_all_pool_analytics<R: ReserveReader>(
    db: &Storage,
    discovery: &PoolDiscovery<R>,
    anchor: Address,
    priority_pairs: &[(Address, Address)],
    policy: &AprPolicy,
    deadline: Deadline,
) -> Result<Partial<Vec<PoolAnalytics>>> {
    // Stage 1: discover.
    let pools = db.list_pools().await?;
    info!(pool_count = pools.len(), "getAllPoolAnalytics: discovery complete");

    if deadline.is_expired() {
        return Ok(Partial::truncated(Vec::new(), "deadline reached during discovery"));
    }

    // Stage 2: build focused price graph (also serves stage 3, "fetch key
    // prices" — the graph already holds every priced token).
    let prices = build_focused_price_graph(discovery, &pools, anchor, priority_pairs).await?;
    info!(priced_tokens = prices.prices.len(), "getAllPoolAnalytics: price graph built");

    // Stage 4: compute block range — folded into `yesterday_utc` below,
    // since the aggregator works in UTC days rather than block ranges.
    let date = yesterday_utc(chrono::Utc::now());

    // Stage 5: per-pool analytics, sharing `prices` across every pool.
    let mut results = Vec::with_capacity(pools.len());
    let mut truncated_at = None;
    for pool in &pools {
        if deadline.is_expired() {
            truncated_at = Some(pool.pid);
            break;
        }

        let analytics = if db.has_fresh_aggregate(pool.pid).await? {
            db.latest_daily_aggregate(pool.pid)
                .await?
                .map(|aggregate| PoolAnalytics {
                    pool: pool.clone(),
                    aggregate,
                    source: AnalyticsSource::Cached,
                })
        } else {
            None
        };

        let analytics = match analytics {
            Some(a) => a,
            None => {
                let aggregate = aggregate_pool_day(db, pool, date, &prices, policy).await?;
                PoolAnalytics {
                    pool: pool.clone(),
                    aggregate,
                    source: AnalyticsSource::LiveFold,
                }
            }
        };
        results.push(analytics);
    }

    match truncated_at {
        Some(pid) => Ok(Partial::truncated(results, format!("deadline reached before pid {pid}"))),
        None => Ok(Partial::complete(results)),
    }
}
