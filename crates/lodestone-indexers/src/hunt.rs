//! Hunt/patrol indexer (spec §4.E): parses drop events, attaching a
//! party-luck snapshot captured at encounter time. The drop event itself
//! carries no party composition, so a `PartySnapshotReader` is injected to
//! read it (e.g. from a companion view call or off-chain telemetry feed),
//! following the same seam `stake::UserInfoReader` uses for `userInfo`.

use crate::abi::HuntReward;
use crate::error::{IndexerError, Result};
use crate::worker::SliceWorker;
use alloy::primitives::Address as AlloyAddress;
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use lodestone_chain::ChainClient;
use lodestone_db::Storage;
use lodestone_types::chain::IndexerKind;
use lodestone_types::game::{HuntEncounter, PartyLuckSnapshot};
use lodestone_types::ids::{Address, ChainId, TxHash};
use std::sync::Arc;

#[async_trait]
pub trait PartySnapshotReader: Send + Sync {
    async fn party_luck(&self, wallet: &Address, tx_hash: &TxHash) -> Result<PartyLuckSnapshot>;
}

pub struct HuntIndexer<R: PartySnapshotReader> {
    pub name: String,
    pub hunt_contract: AlloyAddress,
    pub chain_id: ChainId,
    pub genesis_block: i64,
    pub reader: Arc<R>,
}

#[async_trait]
impl<P, R> SliceWorker<P> for HuntIndexer<R>
where
    P: Provider + Clone + Send + Sync,
    R: PartySnapshotReader + 'static,
{
    fn checkpoint_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndexerKind {
        IndexerKind::Hunt
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
        let filter = Filter::new().address(self.hunt_contract).event(HuntReward::SIGNATURE);
        let logs = chain.logs(filter, from, to).await?;

        let mut inserted = 0u64;
        for log in &logs {
            let Ok(decoded) = HuntReward::decode_log(&log.inner, true) else {
                continue;
            };

            let tx_hash = log
                .transaction_hash
                .map(|h| TxHash::new(h.to_string()))
                .unwrap_or_else(|| TxHash::new(String::new()));
            let block_number = log.block_number.unwrap_or(from) as i64;
            let timestamp = chain.block_timestamp(block_number as u64).await?;
            let wallet = Address::from(decoded.wallet.to_string());

            let drop_quantity: i64 = decoded.quantity.to_string().parse().map_err(|_| IndexerError::Decode {
                tx_hash: tx_hash.to_string(),
                reason: "drop quantity did not parse as integer".into(),
            })?;

            let party_luck = self.reader.party_luck(&wallet, &tx_hash).await?;

            let encounter = HuntEncounter {
                chain_id: self.chain_id,
                wallet,
                tx_hash,
                block_number,
                drop_item: Some(decoded.itemId.to_string()),
                drop_quantity,
                party_luck,
                timestamp,
            };

            if db.insert_hunt_encounter(&encounter).await? {
                inserted += 1;
            }
        }

        Ok(serde_json::json!({ "encounters_inserted": inserted, "from": from, "to": to }))
    }
}
