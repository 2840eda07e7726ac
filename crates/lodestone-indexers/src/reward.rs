//! Reward indexer (spec §4.E): parses `RewardCollected`, persisting the
//! raw token amount harvested per pool. USD conversion happens later in
//! the daily aggregator, not here, since the price graph is a point-in-time
//! snapshot recomputed once per cycle rather than per event.

use crate::abi::RewardCollected;
use crate::error::{IndexerError, Result};
use crate::worker::SliceWorker;
use alloy::primitives::Address as AlloyAddress;
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use lodestone_chain::ChainClient;
use lodestone_db::Storage;
use lodestone_types::chain::IndexerKind;
use lodestone_types::ids::{Address, Pid, TxHash};
use lodestone_types::pool::RewardEvent;

pub struct RewardIndexer {
    pub name: String,
    pub staking_contract: AlloyAddress,
    pub pid: Pid,
    pub reward_token: Address,
    pub genesis_block: i64,
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync> SliceWorker<P> for RewardIndexer {
    fn checkpoint_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndexerKind {
        IndexerKind::Reward
    }

    fn genesis_block(&self) -> i64 {
        self.genesis_block
    }

    async fn process_slice(
        &self,
        chain: &ChainClient<P>,
        db: &Storage,
        from: u64,
        to: u64,
    ) -> Result<serde_json::Value> {
        let filter = Filter::new()
            .address(self.staking_contract)
            .event(RewardCollected::SIGNATURE);
        let logs = chain.logs(filter, from, to).await?;

        let mut inserted = 0u64;
        for log in &logs {
            let Ok(decoded) = RewardCollected::decode_log(&log.inner, true) else {
                continue;
            };

            let tx_hash = log
                .transaction_hash
                .map(|h| TxHash::new(h.to_string()))
                .unwrap_or_else(|| TxHash::new(String::new()));
            let log_index = log.log_index.unwrap_or(0) as i32;
            let block_number = log.block_number.unwrap_or(from) as i64;
            let timestamp = chain.block_timestamp(block_number as u64).await?;

            let reward_amount: BigDecimal =
                decoded.amount.to_string().parse().map_err(|_| IndexerError::Decode {
                    tx_hash: tx_hash.to_string(),
                    reason: "reward amount did not parse as decimal".into(),
                })?;

            let event = RewardEvent {
                pid: self.pid,
                block_number,
                tx_hash,
                log_index,
                reward_token: self.reward_token.clone(),
                reward_amount,
                timestamp,
            };

            if db.insert_reward_event(&event).await? {
                inserted += 1;
            }
        }

        Ok(serde_json::json!({ "rewards_inserted": inserted, "from": from, "to": to }))
    }
}
