//! Garden-optimization payment flow (spec §4.H "parallel flow"):
//! `awaiting_payment -> payment_verified -> processing ->
//! completed|failed|expired`. A payment that lands after `expiresAt` is
//! recorded as `expired` with the transaction hash kept for audit, never
//! silently dropped.

use crate::error::Result;
use lodestone_db::Storage;
use lodestone_types::billing::{GardenOptimization, ObservedTransfer, OptimizationStatus};
use lodestone_types::ids::Address;
use tracing::info;

/// Evaluates an observed transfer against one awaiting-payment optimization
/// and applies the resulting transition. Returns `true` if the transfer was
/// consumed by this optimization.
pub async fn verify_payment(
    db: &Storage,
    optimization: &GardenOptimization,
    transfer: &ObservedTransfer,
    deposit_address: &Address,
) -> Result<bool> {
    if optimization.status != OptimizationStatus::AwaitingPayment {
        return Ok(false);
    }
    if &transfer.to != deposit_address || transfer.amount != optimization.unique_amount {
        return Ok(false);
    }

    if transfer.block_time > optimization.expires_at {
        db.transition_garden_optimization(optimization.id, OptimizationStatus::Expired, Some(&transfer.tx_hash))
            .await?;
        info!(optimization_id = optimization.id, "payment arrived after expiry, recorded and marked expired");
        return Ok(true);
    }

    db.transition_garden_optimization(optimization.id, OptimizationStatus::PaymentVerified, Some(&transfer.tx_hash))
        .await?;
    Ok(true)
}

/// Runs the optimization work itself after payment is verified, then
/// records the outcome. The work closure is caller-supplied since what
/// "processing" means is owned by the garden-optimization feature, not
/// the billing flow.
pub async fn process<F, Fut>(db: &Storage, optimization_id: i64, work: F) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<(), String>>,
{
    db.transition_garden_optimization(optimization_id, OptimizationStatus::Processing, None)
        .await?;

    match work().await {
        Ok(()) => {
            db.transition_garden_optimization(optimization_id, OptimizationStatus::Completed, None)
                .await?;
        }
        Err(reason) => {
            tracing::warn!(optimization_id, reason, "garden optimization work failed");
            db.transition_garden_optimization(optimization_id, OptimizationStatus::Failed, None)
                .await?;
        }
    }
    Ok(())
}
