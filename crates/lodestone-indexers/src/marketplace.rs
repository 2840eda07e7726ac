//! Tavern/marketplace indexer (spec §4.E): takes an hourly snapshot of
//! current listings, then classifies every listing seen in the *previous*
//! snapshot as `still-listed | sold | delisted` by diffing against the
//! current one. This worker polls state rather than scanning logs, so it
//! does not implement [`crate::worker::SliceWorker`] — there is no block
//! range to chunk, only a wall-clock hour to wait for.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use lodestone_db::Storage;
use lodestone_types::chain::{CheckpointDelta, CheckpointStatus, IndexerCheckpoint, IndexerKind};
use lodestone_types::game::{ListingOutcome, TavernListing, TavernListingHistory};
use lodestone_types::ids::Address;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone)]
pub struct TavernListingSnapshot {
    pub listing_id: String,
    pub seller: Address,
    pub asset_id: String,
    pub price: bigdecimal::BigDecimal,
}

#[async_trait]
pub trait ListingsReader: Send + Sync {
    async fn current_listings(&self) -> Result<Vec<TavernListingSnapshot>>;
    /// Best-effort check for listings that vanished between snapshots:
    /// `true` if a sale can be attributed to this listing, `false` if it
    /// should be classified `delisted`.
    async fn was_sold(&self, listing_id: &str) -> Result<bool>;
}

const POLL_INTERVAL: Duration = Duration::from_secs(3600);

pub struct MarketplaceIndexer<R: ListingsReader> {
    pub name: String,
    pub reader: Arc<R>,
}

impl<R: ListingsReader> MarketplaceIndexer<R> {
    fn checkpoint_name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, db: &Storage, shutdown: &CancellationToken) -> Result<()> {
        if db.get_checkpoint(self.checkpoint_name()).await?.is_none() {
            db.seed_checkpoint(&IndexerCheckpoint::seeded(
                self.checkpoint_name().to_string(),
                IndexerKind::Marketplace,
                0,
            ))
            .await?;
        }

        let mut previous: HashMap<String, TavernListingSnapshot> = HashMap::new();

        loop {
            if shutdown.is_cancelled() {
                info!(indexer = %self.checkpoint_name(), "shutdown requested, stopping worker");
                return Ok(());
            }

            let snapshot_hour = floor_to_hour(Utc::now());
            match self.take_snapshot(db, &previous, snapshot_hour).await {
                Ok(current) => {
                    db.upsert_checkpoint(
                        self.checkpoint_name(),
                        CheckpointDelta {
                            status: Some(CheckpointStatus::Idle),
                            stats: Some(serde_json::json!({ "listings": current.len(), "snapshot_hour": snapshot_hour })),
                            last_error: Some(None),
                            ..Default::default()
                        },
                    )
                    .await?;
                    previous = current;
                }
                Err(e) => {
                    db.upsert_checkpoint(
                        self.checkpoint_name(),
                        CheckpointDelta {
                            status: Some(CheckpointStatus::Error),
                            last_error: Some(Some(e.to_string())),
                            ..Default::default()
                        },
                    )
                    .await?;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
                _ = shutdown.cancelled() => {}
            }
        }
    }

    async fn take_snapshot(
        &self,
        db: &Storage,
        previous: &HashMap<String, TavernListingSnapshot>,
        snapshot_hour: DateTime<Utc>,
    ) -> Result<HashMap<String, TavernListingSnapshot>> {
        let listings = self.reader.current_listings().await?;
        let mut current: HashMap<String, TavernListingSnapshot> = HashMap::new();

        for listing in listings {
            db.upsert_tavern_listing(&TavernListing {
                listing_id: listing.listing_id.clone(),
                seller: listing.seller.clone(),
                asset_id: listing.asset_id.clone(),
                price: listing.price.clone(),
                snapshot_hour,
            })
            .await?;
            current.insert(listing.listing_id.clone(), listing);
        }

        for (listing_id, _) in previous {
            let outcome = if current.contains_key(listing_id) {
                ListingOutcome::StillListed
            } else if self.reader.was_sold(listing_id).await? {
                ListingOutcome::Sold
            } else {
                ListingOutcome::Delisted
            };

            db.insert_tavern_listing_history(&TavernListingHistory {
                listing_id: listing_id.clone(),
                observed_hour: snapshot_hour,
                outcome,
            })
            .await?;
        }

        Ok(current)
    }
}

fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts - ChronoDuration::minutes(ts.minute() as i64))
}
