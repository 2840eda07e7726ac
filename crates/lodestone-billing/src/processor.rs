//! Optimization processor (spec §4.L "optimization processor"): polls for
//! garden optimizations sitting in `payment_verified` and drives each
//! through [`crate::garden::process`]. What the optimization work itself
//! does is supplied by the caller — that logic belongs to the garden
//! feature, not billing (spec §4.H).

use crate::error::Result;
use crate::garden::process;
use lodestone_db::Storage;
use lodestone_types::billing::GardenOptimization;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(10);
const BATCH_SIZE: i64 = 50;

/// Runs until `shutdown` fires, polling every [`POLL_INTERVAL`] for a batch
/// of up to [`BATCH_SIZE`] verified optimizations and driving each through
/// `work`.
pub async fn run<F, Fut>(db: &Storage, work: F, shutdown: &CancellationToken) -> Result<()>
where
    F: Fn(GardenOptimization) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<(), String>>,
{
    loop {
        let due = db.garden_optimizations_awaiting_processing(BATCH_SIZE).await?;
        let due_count = due.len();
        for optimization in due {
            let id = optimization.id;
            if let Err(e) = process(db, id, || work(optimization.clone())).await {
                warn!(optimization_id = id, error = %e, "optimization processing transition failed");
            }
        }
        if due_count > 0 {
            info!(due_count, "optimization processor batch complete");
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = shutdown.cancelled() => return Ok(()),
        }
    }
}
