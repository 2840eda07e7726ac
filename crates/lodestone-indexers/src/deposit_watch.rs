//! Deposit watcher (spec §4.H, §4.L "transaction-monitor"): scans the
//! deposit token for `Transfer` events into the platform's deposit address
//! and feeds each one through both reconciliation flows — the deposit
//! state machine and the garden-optimization payment flow. A transfer that
//! matches neither is logged, never applied (spec §4.H "logged but not
//! applied", §7.5 deposit mismatch).

use crate::abi::Transfer;
use crate::error::Result;
use crate::worker::SliceWorker;
use alloy::primitives::Address as AlloyAddress;
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use lodestone_billing::garden::verify_payment;
use lodestone_billing::reconcile::reconcile_transfer;
use lodestone_chain::ChainClient;
use lodestone_db::Storage;
use lodestone_types::billing::{ObservedTransfer, OptimizationStatus};
use lodestone_types::chain::IndexerKind;
use lodestone_types::ids::{Address, TxHash};
use tracing::warn;

#[derive(Clone)]
pub struct DepositWatcher {
    pub name: String,
    pub token_contract: AlloyAddress,
    pub deposit_address: Address,
    pub genesis_block: i64,
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync> SliceWorker<P> for DepositWatcher {
    fn checkpoint_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndexerKind {
        IndexerKind::Deposit
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
        let filter = Filter::new().address(self.token_contract).event(Transfer::SIGNATURE);
        let logs = chain.logs(filter, from, to).await?;
        let deposit_addr: AlloyAddress = self.deposit_address.as_str().parse().unwrap_or_default();

        let mut applied = 0u64;
        let mut unmatched = 0u64;

        for log in &logs {
            let Ok(decoded) = Transfer::decode_log(&log.inner, true) else {
                continue;
            };
            if decoded.to != deposit_addr {
                continue;
            }

            let block_number = log.block_number.unwrap_or(from);
            let timestamp = chain.block_timestamp(block_number).await?;
            let tx_hash = TxHash::new(log.transaction_hash.map(|h| h.to_string()).unwrap_or_default());

            let Ok(amount) = decoded.value.to_string().parse() else {
                warn!(tx_hash = %tx_hash, "transfer amount did not parse as decimal, skipped");
                continue;
            };

            let transfer = ObservedTransfer {
                tx_hash,
                from: Address::new(decoded.from.to_string()),
                to: self.deposit_address.clone(),
                amount,
                block_time: timestamp,
            };

            if reconcile_transfer(db, &transfer, &self.deposit_address).await.is_ok() {
                applied += 1;
                continue;
            }

            match self
                .try_garden_optimization(db, &transfer)
                .await
            {
                Ok(true) => applied += 1,
                Ok(false) => {
                    unmatched += 1;
                    warn!(tx_hash = %transfer.tx_hash, "transfer matched no deposit request or optimization");
                }
                Err(e) => warn!(tx_hash = %transfer.tx_hash, error = %e, "garden-optimization match check failed"),
            }
        }

        Ok(serde_json::json!({ "applied": applied, "unmatched": unmatched, "from": from, "to": to }))
    }
}

impl DepositWatcher {
    async fn try_garden_optimization(&self, db: &Storage, transfer: &ObservedTransfer) -> lodestone_billing::Result<bool> {
        let candidates = db
            .garden_optimization_candidates(&transfer.amount, &self.deposit_address)
            .await?;

        for optimization in candidates {
            if optimization.status != OptimizationStatus::AwaitingPayment {
                continue;
            }
            if verify_payment(db, &optimization, transfer, &self.deposit_address).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
