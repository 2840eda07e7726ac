//! Swap indexer (spec §4.E): parses `Swap` events per LP pair, derives USD
//! volume using the price graph snapshot at the event's block-day.

use crate::abi::Swap;
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
use lodestone_types::ids::{Pid, TxHash};
use lodestone_types::pool::SwapEvent;

pub struct SwapIndexer {
    pub name: String,
    pub pair_address: AlloyAddress,
    pub pid: Pid,
    pub genesis_block: i64,
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync> SliceWorker<P> for SwapIndexer {
    fn checkpoint_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndexerKind {
        IndexerKind::Swap
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
        let filter = Filter::new().address(self.pair_address).event(Swap::SIGNATURE);
        let logs = chain.logs(filter, from, to).await?;

        let mut inserted = 0u64;
        for log in &logs {
            let Ok(decoded) = Swap::decode_log(&log.inner, true) else {
                continue;
            };

            let tx_hash = TxHash::new(log.transaction_hash.map(|h| h.to_string()).unwrap_or_default());
            let log_index = log.log_index.unwrap_or(0) as i32;
            let block_number = log.block_number.unwrap_or(from) as i64;
            let timestamp = chain.block_timestamp(block_number as u64).await?;

            let parse = |v: &alloy::primitives::U256| -> Result<BigDecimal> {
                v.to_string().parse().map_err(|_| IndexerError::Decode {
                    tx_hash: tx_hash.to_string(),
                    reason: "swap amount did not parse as decimal".into(),
                })
            };

            let event = SwapEvent {
                pid: self.pid,
                block_number,
                tx_hash,
                log_index,
                amount0_in: parse(&decoded.amount0In)?,
                amount1_in: parse(&decoded.amount1In)?,
                amount0_out: parse(&decoded.amount0Out)?,
                amount1_out: parse(&decoded.amount1Out)?,
                timestamp,
            };

            if db.insert_swap_event(&event).await? {
                inserted += 1;
            }
        }

        Ok(serde_json::json!({ "swaps_inserted": inserted, "from": from, "to": to }))
    }
}
