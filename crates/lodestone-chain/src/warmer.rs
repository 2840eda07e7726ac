//! Price-cache warmer (spec §4.L "price-cache warmer (on ready)"): rebuilds
//! the full price graph on an interval and on demand, publishing the
//! result through a shared, read-mostly cache (spec §5 "process-local,
//! read-mostly" caches — same shape as [`crate::pool_discovery::PoolMetadataCache`]).

use crate::price_graph::PriceGraphResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default rebuild cadence absent an explicit override.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Shared holder for the latest full price graph build. Readers never
/// block a rebuild in progress — they see the previous snapshot until the
/// new one is published.
pub struct PriceCache {
    inner: RwLock<(PriceGraphResult, Instant)>,
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new((PriceGraphResult::default(), Instant::now())),
        }
    }

    pub async fn get(&self) -> PriceGraphResult {
        self.inner.read().await.0.clone()
    }

    pub async fn age_secs(&self) -> u64 {
        self.inner.read().await.1.elapsed().as_secs()
    }

    async fn set(&self, result: PriceGraphResult) {
        *self.inner.write().await = (result, Instant::now());
    }

    /// Resets to an empty graph (spec §6 `clear-pool-cache`); the next
    /// scheduled or on-demand rebuild repopulates it.
    pub async fn clear(&self) {
        *self.inner.write().await = (PriceGraphResult::default(), Instant::now());
    }
}

/// Runs until `shutdown` fires: builds once immediately (spec §4.L "on
/// ready"), then every `interval`, and also whenever `refresh_rx` receives
/// a signal (the debug route's on-demand refresh, spec §6
/// `refresh-pool-cache`). `build` is caller-supplied since assembling
/// reserves needs a live chain client and pool list this crate doesn't own.
pub async fn run<F, Fut>(
    cache: Arc<PriceCache>,
    interval: Duration,
    mut refresh_rx: mpsc::UnboundedReceiver<()>,
    build: F,
    shutdown: &CancellationToken,
) -> crate::Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = crate::Result<PriceGraphResult>>,
{
    loop {
        match build().await {
            Ok(result) => {
                let priced = result.prices.len();
                cache.set(result).await;
                info!(priced, "price graph rebuilt");
            }
            Err(e) => warn!(error = %e, "price graph rebuild failed, keeping prior snapshot"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = refresh_rx.recv() => {}
            _ = shutdown.cancelled() => return Ok(()),
        }
    }
}
