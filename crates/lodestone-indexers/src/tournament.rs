//! Tournament indexer (spec §4.E, §13 supplement): parses `TournamentResult`
//! into a placement row plus a full hero-state snapshot captured at
//! participation time. A `HeroStatsReader` is injected to fetch the hero's
//! stats blob, since the event itself only carries the hero id.

use crate::abi::TournamentResult;
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
use lodestone_types::game::{HeroTournamentSnapshot, TournamentPlacement};
use lodestone_types::ids::{Address, TxHash};
use std::sync::Arc;

#[async_trait]
pub trait HeroStatsReader: Send + Sync {
    async fn hero_stats(&self, hero_id: &str) -> Result<serde_json::Value>;
}

pub struct TournamentIndexer<R: HeroStatsReader> {
    pub name: String,
    pub tournament_contract: AlloyAddress,
    pub genesis_block: i64,
    pub reader: Arc<R>,
}

#[async_trait]
impl<P, R> SliceWorker<P> for TournamentIndexer<R>
where
    P: Provider + Clone + Send + Sync,
    R: HeroStatsReader + 'static,
{
    fn checkpoint_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndexerKind {
        IndexerKind::Tournament
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
            .address(self.tournament_contract)
            .event(TournamentResult::SIGNATURE);
        let logs = chain.logs(filter, from, to).await?;

        let mut inserted = 0u64;
        for log in &logs {
            let Ok(decoded) = TournamentResult::decode_log(&log.inner, true) else {
                continue;
            };

            let tx_hash = log
                .transaction_hash
                .map(|h| TxHash::new(h.to_string()))
                .unwrap_or_else(|| TxHash::new(String::new()));
            let timestamp = chain
                .block_timestamp(log.block_number.unwrap_or(from))
                .await?;

            let tournament_id: i64 = decoded.tournamentId.to_string().parse().map_err(|_| IndexerError::Decode {
                tx_hash: tx_hash.to_string(),
                reason: "tournament id did not parse as integer".into(),
            })?;
            let placement: i32 = decoded.placement.to_string().parse().map_err(|_| IndexerError::Decode {
                tx_hash: tx_hash.to_string(),
                reason: "placement did not parse as integer".into(),
            })?;
            let hero_id = decoded.heroId.to_string();
            let wallet = Address::from(decoded.wallet.to_string());

            let placement_row = TournamentPlacement {
                tournament_id,
                wallet,
                hero_id: hero_id.clone(),
                placement,
                tx_hash,
                timestamp,
            };

            if db.insert_tournament_placement(&placement_row).await? {
                inserted += 1;

                let stats = self.reader.hero_stats(&hero_id).await?;
                db.insert_hero_tournament_snapshot(&HeroTournamentSnapshot {
                    tournament_id,
                    hero_id,
                    stats,
                    captured_at: timestamp,
                })
                .await?;
            }
        }

        Ok(serde_json::json!({ "placements_inserted": inserted, "from": from, "to": to }))
    }
}
