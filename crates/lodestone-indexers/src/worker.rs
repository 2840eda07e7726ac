//! The shared worker contract every event indexer follows (spec §4.E):
//!
//! 1. Load checkpoint, `cursor = lastIndexedBlock + 1`, `end = min(head -
//!    confirmations, shardEnd)`.
//! 2. If `cursor > end`, sleep and retry.
//! 3. Request logs for `[cursor, cursor+chunkSize-1]` via [`ChainClient`].
//! 4. Decode, normalize, upsert with `ON CONFLICT DO NOTHING`.
//! 5. Advance checkpoint to slice end; record per-batch stats.
//! 6. On error: record `status=error, lastError`, back off, retry from
//!    `cursor`.
//!
//! A worker owns exactly one checkpoint row, read-modify-write, never
//! shared with another task (spec §4.B).

use crate::error::{IndexerError, Result};
use alloy::providers::Provider;
use async_trait::async_trait;
use lodestone_chain::ChainClient;
use lodestone_db::Storage;
use lodestone_types::chain::{CheckpointDelta, CheckpointStatus, IndexerCheckpoint, IndexerKind};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Idle sleep when a worker catches up to the chain head (spec §4.E step 2).
const CAUGHT_UP_SLEEP: Duration = Duration::from_secs(5);
/// Back-off sleep after a slice fails (spec §4.E step 6).
const ERROR_BACKOFF: Duration = Duration::from_secs(10);

/// One indexer's identity plus its slice-processing logic. Implementors
/// decode and persist exactly one event kind; the loop in [`run`] owns
/// checkpoint bookkeeping and cancellation so implementations stay
/// concerned only with "what to do with this range of blocks".
#[async_trait]
pub trait SliceWorker<P: Provider + Clone + Send + Sync>: Send + Sync {
    fn checkpoint_name(&self) -> &str;
    fn kind(&self) -> IndexerKind;
    fn genesis_block(&self) -> i64;
    /// `None` means unsharded (runs over the whole chain).
    fn shard_end(&self) -> Option<i64> {
        None
    }

    /// Process `[from, to]` inclusive, returning stats to merge into the
    /// checkpoint's `stats` blob (spec §4.E step 5).
    async fn process_slice(
        &self,
        chain: &ChainClient<P>,
        db: &Storage,
        from: u64,
        to: u64,
    ) -> Result<serde_json::Value>;
}

/// Ensures a checkpoint row exists, seeding it from `genesis_block` if
/// missing (spec §4.L: "missing checkpoints are seeded").
pub async fn ensure_seeded<P: Provider + Clone + Send + Sync>(
    db: &Storage,
    worker: &dyn SliceWorker<P>,
) -> Result<()> {
    if db.get_checkpoint(worker.checkpoint_name()).await?.is_none() {
        let mut checkpoint = IndexerCheckpoint::seeded(
            worker.checkpoint_name().to_string(),
            worker.kind(),
            worker.genesis_block(),
        );
        checkpoint.shard_end = worker.shard_end();
        db.seed_checkpoint(&checkpoint).await?;
    }
    Ok(())
}

/// Runs the worker contract until `shutdown` is cancelled. A cancelled
/// worker never commits a partial slice: it checks for cancellation before
/// starting a slice, not in the middle of one (spec §5 cancellation
/// policy).
pub async fn run<P: Provider + Clone + Send + Sync>(
    worker: &dyn SliceWorker<P>,
    chain: &ChainClient<P>,
    db: &Storage,
    shutdown: &CancellationToken,
) -> Result<()> {
    let name = worker.checkpoint_name().to_string();
    ensure_seeded(db, worker).await?;

    loop {
        if shutdown.is_cancelled() {
            info!(indexer = %name, "shutdown requested, stopping worker");
            return Ok(());
        }

        let checkpoint = db
            .get_checkpoint(&name)
            .await?
            .ok_or_else(|| IndexerError::Decode {
                tx_hash: String::new(),
                reason: format!("checkpoint {name} vanished"),
            })?;

        let cursor = (checkpoint.last_indexed_block + 1).max(0) as u64;
        let safe_head = chain.safe_head().await?;
        let end = match checkpoint.shard_end {
            Some(shard_end) => safe_head.min(shard_end.max(0) as u64),
            None => safe_head,
        };

        if cursor as i64 > end as i64 {
            tokio::select! {
                _ = tokio::time::sleep(CAUGHT_UP_SLEEP) => {}
                _ = shutdown.cancelled() => {}
            }
            continue;
        }

        let slice_end = cursor + chain.chunk_size().saturating_sub(1);
        let slice_end = slice_end.min(end);

        db.upsert_checkpoint(
            &name,
            CheckpointDelta {
                status: Some(CheckpointStatus::Running),
                ..Default::default()
            },
        )
        .await?;

        match worker.process_slice(chain, db, cursor, slice_end).await {
            Ok(stats) => {
                db.upsert_checkpoint(
                    &name,
                    CheckpointDelta {
                        last_indexed_block: Some(slice_end as i64),
                        status: Some(CheckpointStatus::Idle),
                        stats: Some(stats),
                        last_error: Some(None),
                    },
                )
                .await?;
                info!(indexer = %name, from = cursor, to = slice_end, "slice indexed");
            }
            Err(e) => {
                error!(indexer = %name, from = cursor, to = slice_end, error = %e, "slice failed");
                db.upsert_checkpoint(
                    &name,
                    CheckpointDelta {
                        status: Some(CheckpointStatus::Error),
                        last_error: Some(Some(e.to_string())),
                        ..Default::default()
                    },
                )
                .await?;
                tokio::select! {
                    _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    _ = shutdown.cancelled() => {}
                }
            }
        }
    }
}

/// Bounded-parallelism helper used by a handful of workers (the stake
/// indexer's `userInfo` reconciliation, the bridge indexer's receipt
/// fetch) that must fan out several RPC/DB calls without unbounding
/// concurrency (spec §5 shared-resource policy: 6-10 in-flight calls).
pub async fn bounded_parallel<T, F, Fut>(items: Vec<T>, concurrency: usize, f: F)
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    use futures::stream::{self, StreamExt};
    stream::iter(items)
        .for_each_concurrent(concurrency, |item| f(item))
        .await;
}
