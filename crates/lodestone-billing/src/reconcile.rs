//! Ties the matching predicate, the `pending -> matched` transition, and
//! the crediting task together for one observed transfer (spec §4.H).
//! The expiry sweep and garden-optimization flow are separate concerns
//! (see [`crate::expiry`], [`crate::garden`]).

use crate::crediting::credit_with_retry;
use crate::error::{BillingError, Result};
use crate::matching::evaluate_match;
use lodestone_db::Storage;
use lodestone_types::billing::{DepositStatus, MatchOutcome, ObservedTransfer};
use lodestone_types::ids::Address;
use tracing::{info, warn};

/// Evaluates `transfer` against every pending request at `deposit_address`
/// with a matching unique amount, applies the match, and spawns crediting.
/// A transfer that matches nothing is logged, not applied (spec §4.H: "If
/// any mismatch, the transfer is logged but not applied").
pub async fn reconcile_transfer(db: &Storage, transfer: &ObservedTransfer, deposit_address: &Address) -> Result<()> {
    let candidates = db
        .pending_deposit_candidates(&transfer.amount, deposit_address)
        .await?;

    for request in candidates {
        let player = db.get_player(request.player_id).await?;
        let Some(player) = player else { continue };

        match evaluate_match(transfer, &request, deposit_address, &player.wallets) {
            MatchOutcome::Matched => {
                db.transition_deposit(request.id, DepositStatus::Matched, Some(&transfer.tx_hash))
                    .await?;
                info!(request_id = request.id, player_id = request.player_id, "deposit matched");
                credit_with_retry(db, request.id, request.player_id, &request.unique_amount).await?;
                return Ok(());
            }
            other => {
                warn!(request_id = request.id, outcome = ?other, "candidate transfer did not match, skipped");
            }
        }
    }

    Err(BillingError::NoMatch(transfer.tx_hash.to_string()))
}
