//! `getWalletRewards(wallet)` (spec §4.G): reads authoritative on-chain
//! `pendingRewards` for the wallet's top-N staked pools by `staked_lp`
//! descending, timeout-bounded. Follows the same injection-seam pattern
//! as `lodestone_indexers::stake::UserInfoReader` so the read path is
//! testable without a live contract.

use crate::deadline::{Deadline, Partial};
use crate::error::Result;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use futures::stream::{self, StreamExt};
use lodestone_db::Storage;
use lodestone_types::ids::{Address, Pid};
use std::sync::Arc;
use tracing::warn;

/// Cap on how many of a wallet's staked pools get a live `pendingRewards`
/// read. A wallet rarely holds positions in more than a handful of pools
/// at once, so 10 covers the realistic case while keeping one call's RPC
/// fan-out bounded.
const TOP_N_POOLS: usize = 10;
const READ_CONCURRENCY: usize = 5;

#[async_trait]
pub trait PendingRewardsReader: Send + Sync {
    async fn pending_rewards(&self, wallet: &Address, pid: Pid) -> Result<BigDecimal>;
}

#[derive(Debug, Clone)]
pub struct PoolReward {
    pub pid: Pid,
    pub pending: BigDecimal,
}

pub async fn get_wallet_rewards<R: PendingRewardsReader>(
    db: &Storage,
    reader: &Arc<R>,
    wallet: &Address,
    deadline: Deadline,
) -> Result<Partial<Vec<PoolReward>>> {
    if deadline.is_expired() {
        return Ok(Partial::truncated(Vec::new(), "deadline already reached"));
    }

    let mut positions = db.staker_positions_for_wallet(wallet).await?;
    positions.sort_by(|a, b| b.staked_lp.cmp(&a.staked_lp));
    positions.truncate(TOP_N_POOLS);
    let considered = positions.len();

    let wallet = wallet.clone();
    let rewards: Vec<Option<PoolReward>> = stream::iter(positions)
        .map(|position| {
            let reader = Arc::clone(reader);
            let wallet = wallet.clone();
            async move {
                match reader.pending_rewards(&wallet, position.pid).await {
                    Ok(pending) => Some(PoolReward {
                        pid: position.pid,
                        pending,
                    }),
                    Err(e) => {
                        warn!(wallet = %wallet, pid = position.pid, error = %e, "pendingRewards read failed, omitting pool");
                        None
                    }
                }
            }
        })
        .buffer_unordered(READ_CONCURRENCY)
        .collect()
        .await;

    let rewards: Vec<PoolReward> = rewards.into_iter().flatten().collect();
    if rewards.len() == considered && !deadline.is_expired() {
        Ok(Partial::complete(rewards))
    } else {
        Ok(Partial::truncated(
            rewards,
            format!("{} of {} pool reads failed or deadline reached", considered - rewards.len().min(considered), considered),
        ))
    }
}
