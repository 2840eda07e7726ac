//! Expiry sweep (spec §4.H): a periodic task that transitions stale
//! `pending` deposit requests and `awaiting_payment`/`payment_verified`
//! garden optimizations to `expired`.

use crate::error::Result;
use lodestone_db::Storage;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run(db: &Storage, shutdown: &CancellationToken) -> Result<()> {
    loop {
        if shutdown.is_cancelled() {
            return Ok(());
        }

        let expired_deposits = db.expire_stale_deposits().await?;
        let expired_optimizations = db.expire_stale_optimizations().await?;
        if expired_deposits > 0 || expired_optimizations > 0 {
            info!(expired_deposits, expired_optimizations, "expiry sweep complete");
        }

        tokio::select! {
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
            _ = shutdown.cancelled() => {}
        }
    }
}
