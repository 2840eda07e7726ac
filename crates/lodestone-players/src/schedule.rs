//! Nightly reclassification sweep (spec §4.J: "Reclassification triggers:
//! new bridge-metric rollup; operator request; nightly schedule"). The
//! other two triggers are call sites elsewhere — the bridge indexer after
//! a metrics rebuild, the admin route on an operator request — both
//! calling [`crate::engine::run_classification`] directly.

use crate::engine::run_classification;
use crate::error::Result;
use lodestone_db::Storage;
use lodestone_types::classification::ReclassifyTrigger;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const BATCH_SIZE: i64 = 500;

/// Runs once immediately, then every 24h until `shutdown` fires. Sweeps in
/// bounded batches rather than all players at once so one slow run never
/// blocks cancellation.
pub async fn run(db: &Storage, message_topic_count_for: impl Fn(i64) -> u32, shutdown: &CancellationToken) -> Result<()> {
    loop {
        let cutoff = chrono::Utc::now() - chrono::Duration::hours(24);
        let mut due = db.classified_before(cutoff, BATCH_SIZE).await?;
        due.extend(db.never_classified(BATCH_SIZE).await?);
        let total_players = db.player_count().await?;
        let due_count = due.len();
        for player_id in due {
            match run_classification(
                db,
                player_id,
                message_topic_count_for(player_id),
                ReclassifyTrigger::NightlySchedule,
            )
            .await
            {
                Ok(_) => {}
                Err(e) => warn!(player_id, error = %e, "nightly reclassification failed, left at prior result"),
            }
        }
        info!(due_count, total_players, "nightly reclassification sweep complete");

        tokio::select! {
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
            _ = shutdown.cancelled() => return Ok(()),
        }
    }
}
