//! Crediting task (spec §4.H): the second half of the match→credit
//! transition. Runs after a request reaches `matched`; on failure it is
//! retried with exponential backoff while the request stays `matched`
//! (never silently reverting to `pending`), and only marked `errored` once
//! retries are exhausted.

use crate::error::Result;
use lodestone_db::Storage;
use lodestone_types::billing::DepositStatus;
use std::time::Duration;
use tracing::{error, info, warn};

const MAX_ATTEMPTS: u32 = 5;
const BASE_BACKOFF: Duration = Duration::from_secs(2);

/// Credits `request_id`'s player balance and transitions `matched ->
/// completed` atomically (via `Storage::credit_and_complete_deposit`), so a
/// retry after a transient failure can never double-credit: either the
/// whole unit applied on a prior attempt (and this call is a no-op) or
/// nothing did.
pub async fn credit_with_retry(db: &Storage, request_id: i64, player_id: i64, amount: &bigdecimal::BigDecimal) -> Result<()> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match db.credit_and_complete_deposit(request_id, player_id, amount).await {
            Ok(()) => {
                info!(request_id, player_id, "deposit credited");
                return Ok(());
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(request_id, attempt, error = %e, "credit attempt failed, retrying");
                tokio::time::sleep(BASE_BACKOFF * 2u32.pow(attempt - 1)).await;
            }
            Err(e) => {
                error!(request_id, attempt, error = %e, "credit exhausted retries, marking errored for manual recovery");
                db.transition_deposit(request_id, DepositStatus::Errored, None).await?;
                return Err(e.into());
            }
        }
    }
}
