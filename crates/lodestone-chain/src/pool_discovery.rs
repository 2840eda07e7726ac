//! Pool discovery & metadata caching (spec §4.D), and the focused/full
//! price-graph build pipeline (spec §4.C "Two flavors").

use crate::client::ChainClient;
use crate::error::{ChainError, Result};
use crate::price_graph::{PoolReserves, PriceGraphBuilder, PriceGraphResult};
use alloy::providers::Provider;
use dashmap::DashMap;
use futures::{stream, StreamExt};
use lodestone_types::ids::{Address, Pid};
use lodestone_types::pool::Pool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

alloy::sol! {
    #[sol(rpc)]
    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }

    #[sol(rpc)]
    interface IMasterGardenerPools {
        function poolLength() external view returns (uint256);
        function poolInfo(uint256 pid) external view returns (address lpToken, uint256 allocPoint, uint256 lastRewardBlock, uint256 accRewardPerShare);
    }

    #[sol(rpc)]
    interface IErc20Meta {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Bounded concurrency used for the "full" price-graph flavor's batched
/// factory-pair enumeration (spec §4.C).
pub const FULL_GRAPH_CONCURRENCY: usize = 6;

const METADATA_TTL: Duration = Duration::from_secs(300);

struct CachedPool {
    pool: Pool,
    cached_at: Instant,
}

/// In-process, read-mostly pool metadata cache. Writers publish a new
/// immutable snapshot rather than mutating fields in place (spec §5
/// "process-local, read-mostly" caches).
pub struct PoolMetadataCache {
    entries: DashMap<Pid, CachedPool>,
}

impl Default for PoolMetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolMetadataCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, pid: Pid) -> Option<Pool> {
        self.entries.get(&pid).and_then(|entry| {
            if entry.cached_at.elapsed() < METADATA_TTL {
                Some(entry.pool.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, pool: Pool) {
        self.entries.insert(
            pool.pid,
            CachedPool {
                pool,
                cached_at: Instant::now(),
            },
        );
    }
}

/// Resolves LP reserves for a pool via `eth_call`-style view reads. The
/// concrete decode logic is chain-specific and lives behind this trait so
/// discovery can be tested against a fake provider.
#[async_trait::async_trait]
pub trait ReserveReader: Send + Sync {
    async fn read_reserves(&self, pool: &Pool) -> Result<PoolReserves>;
}

pub struct PoolDiscovery<R: ReserveReader> {
    cache: Arc<PoolMetadataCache>,
    reserve_reader: Arc<R>,
}

impl<R: ReserveReader> PoolDiscovery<R> {
    pub fn new(cache: Arc<PoolMetadataCache>, reserve_reader: Arc<R>) -> Self {
        Self {
            cache,
            reserve_reader,
        }
    }

    /// Focused flavor: build price-graph inputs from only the pools under
    /// analysis. Fast — no bounded-concurrency batching needed.
    pub async fn focused_reserves(&self, pools: &[Pool]) -> Result<Vec<PoolReserves>> {
        let mut out = Vec::with_capacity(pools.len());
        for pool in pools {
            out.push(self.reserve_reader.read_reserves(pool).await?);
        }
        Ok(out)
    }

    /// Full flavor: enumerate all factory pairs, batched with bounded
    /// concurrency of [`FULL_GRAPH_CONCURRENCY`] (spec §4.C).
    pub async fn full_reserves(&self, all_pools: &[Pool]) -> Result<Vec<PoolReserves>> {
        info!(pool_count = all_pools.len(), "building full price graph reserves");

        let reserves: Vec<PoolReserves> = stream::iter(all_pools.iter())
            .map(|pool| async move { self.reserve_reader.read_reserves(pool).await })
            .buffer_unordered(FULL_GRAPH_CONCURRENCY)
            .filter_map(|r| async move { r.ok() })
            .collect()
            .await;

        Ok(reserves)
    }

    pub fn cached_metadata(&self, pid: Pid) -> Option<Pool> {
        self.cache.get(pid)
    }

    pub fn cache_metadata(&self, pool: Pool) {
        self.cache.put(pool);
    }
}

/// Runs the focused-flavor pipeline end to end and feeds it into the BFS
/// builder (spec §4.C).
pub async fn build_focused_price_graph<R: ReserveReader>(
    discovery: &PoolDiscovery<R>,
    pools: &[Pool],
    anchor: Address,
    priority_pairs: &[(Address, Address)],
) -> Result<PriceGraphResult> {
    let reserves = discovery.focused_reserves(pools).await?;
    let mut builder = PriceGraphBuilder::new(anchor);
    for (a, b) in priority_pairs {
        builder = builder.with_priority_pair(a.clone(), b.clone());
    }
    Ok(builder.build(&reserves))
}

/// Probe that an alloy provider is reachable — used by discovery health
/// checks and by the supervisor's startup readiness gate.
pub async fn probe_connectivity<P: Provider>(provider: &P) -> bool {
    provider.get_block_number().await.is_ok()
}

/// On-chain [`ReserveReader`]: reads a pair's live reserves via
/// `getReserves()` and combines them with the pool's already-known
/// `token0`/`token1`/decimals (spec §4.C, §4.D).
pub struct AlloyReserveReader<P: Provider + Clone> {
    client: ChainClient<P>,
}

impl<P: Provider + Clone> AlloyReserveReader<P> {
    pub fn new(client: ChainClient<P>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl<P: Provider + Clone + 'static> ReserveReader for AlloyReserveReader<P> {
    async fn read_reserves(&self, pool: &Pool) -> Result<PoolReserves> {
        let pair_address: alloy::primitives::Address = pool.lp_token.as_str().parse().map_err(|e| {
            ChainError::Decode(format!("bad pool address {}: {e}", pool.lp_token))
        })?;

        let pair = IUniswapV2Pair::new(pair_address, self.client.provider().clone());
        let reserves = pair.getReserves().call().await.map_err(|e| ChainError::Rpc {
            range: 0..0,
            cause: e.to_string(),
        })?;

        let parse = |v: impl ToString| -> Result<bigdecimal::BigDecimal> {
            v.to_string()
                .parse()
                .map_err(|_| ChainError::Decode("reserve value not representable as decimal".into()))
        };

        Ok(PoolReserves {
            pool_address: pool.lp_token.clone(),
            token0: pool.token0.clone(),
            token1: pool.token1.clone(),
            reserve0: parse(reserves.reserve0)?,
            reserve1: parse(reserves.reserve1)?,
            decimals0: pool.decimals0,
            decimals1: pool.decimals1,
        })
    }
}

/// Enumerates the staking contract's pool list (spec §4.D: "Enumerate the
/// staking contract's pool list; for each `pid`, resolve LP reserves and
/// token metadata"). Run once at startup; `allocPoint`/`totalStakedV2` are
/// the only fields that go stale afterward, and those are refreshed per
/// analytics request rather than by rerunning discovery (spec §3 Pool
/// invariant).
pub async fn discover_pools<P: Provider + Clone + 'static>(
    client: &ChainClient<P>,
    staking_contract: alloy::primitives::Address,
) -> Result<Vec<Pool>> {
    let provider = client.provider().clone();
    let staking = IMasterGardenerPools::new(staking_contract, provider.clone());

    let pool_len = staking
        .poolLength()
        .call()
        .await
        .map_err(|e| ChainError::Rpc { range: 0..0, cause: e.to_string() })?;
    let pool_count: u64 = pool_len.to_string().parse().unwrap_or(0);

    let mut pools = Vec::with_capacity(pool_count as usize);
    for pid in 0..pool_count {
        let info = staking
            .poolInfo(alloy::primitives::U256::from(pid))
            .call()
            .await
            .map_err(|e| ChainError::Rpc { range: 0..0, cause: e.to_string() })?;

        let pair = IUniswapV2Pair::new(info.lpToken, provider.clone());
        let token0 = pair.token0().call().await.map_err(|e| ChainError::Rpc { range: 0..0, cause: e.to_string() })?;
        let token1 = pair.token1().call().await.map_err(|e| ChainError::Rpc { range: 0..0, cause: e.to_string() })?;

        let meta0 = IErc20Meta::new(token0, provider.clone());
        let meta1 = IErc20Meta::new(token1, provider.clone());
        let symbol0 = meta0.symbol().call().await.unwrap_or_else(|_| "UNKNOWN".to_string());
        let symbol1 = meta1.symbol().call().await.unwrap_or_else(|_| "UNKNOWN".to_string());
        let decimals0 = meta0.decimals().call().await.unwrap_or(18) as i16;
        let decimals1 = meta1.decimals().call().await.unwrap_or(18) as i16;

        let lp_meta = IErc20Meta::new(info.lpToken, provider.clone());
        let total_staked = lp_meta
            .balanceOf(staking_contract)
            .call()
            .await
            .map_err(|e| ChainError::Rpc { range: 0..0, cause: e.to_string() })?;
        let total_staked_v2: bigdecimal::BigDecimal = total_staked
            .to_string()
            .parse()
            .map_err(|_| ChainError::Decode("totalStakedV2 not representable as decimal".into()))?;

        pools.push(Pool {
            pid: pid as Pid,
            lp_token: Address::new(info.lpToken.to_string()),
            token0: Address::new(token0.to_string()),
            token1: Address::new(token1.to_string()),
            decimals0,
            decimals1,
            symbol0,
            symbol1,
            alloc_point: info.allocPoint.to_string().parse().unwrap_or(0),
            total_staked_v2,
        });
    }

    info!(pool_count, "pool discovery complete");
    Ok(pools)
}
