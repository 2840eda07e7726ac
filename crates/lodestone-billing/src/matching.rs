//! Transfer-matching predicate and unique-amount jitter (spec §4.H).

use crate::error::Result;
use bigdecimal::BigDecimal;
use lodestone_db::Storage;
use lodestone_types::billing::{DepositRequest, MatchOutcome, ObservedTransfer};
use lodestone_types::ids::Address;
use rand::Rng;

/// Sub-unit jitter range: a six-decimal suffix keeps collisions astronomically
/// unlikely within one player's active request window without perturbing the
/// displayed amount (spec §4.H: "jittered sub-unit suffix").
const JITTER_DECIMALS: u32 = 6;
const JITTER_ATTEMPTS: u32 = 20;

fn random_jitter() -> BigDecimal {
    let mut rng = rand::thread_rng();
    let suffix: u32 = rng.gen_range(1..1_000_000);
    format!("0.{suffix:0width$}", width = JITTER_DECIMALS as usize)
        .parse()
        .expect("fixed-width decimal string always parses")
}

/// Picks `base_amount + jitter` such that no other pending request anywhere
/// currently uses the same amount at the same deposit address (spec §4.H
/// invariant: `(sender, amount)` collision-resistant within the active
/// window). Retries with a fresh jitter on collision.
pub async fn generate_unique_amount(db: &Storage, base_amount: &BigDecimal, wallet: &Address) -> Result<BigDecimal> {
    for _ in 0..JITTER_ATTEMPTS {
        let candidate = base_amount + random_jitter();
        if db.pending_deposit_candidates(&candidate, wallet).await?.is_empty() {
            return Ok(candidate);
        }
    }
    Ok(base_amount + random_jitter())
}

/// Pure predicate: spec §4.H's matching rule. `deposit_address` is the
/// platform's receiving address (a process-wide constant, not per-request).
pub fn evaluate_match(
    transfer: &ObservedTransfer,
    request: &DepositRequest,
    deposit_address: &Address,
    player_wallets: &[Address],
) -> MatchOutcome {
    if &transfer.to != deposit_address {
        return MatchOutcome::WrongRecipient;
    }
    if transfer.amount != request.unique_amount {
        return MatchOutcome::WrongAmount;
    }
    if !player_wallets.contains(&transfer.from) {
        return MatchOutcome::WrongSender;
    }
    if transfer.block_time < request.created_at || transfer.block_time > request.expires_at {
        return MatchOutcome::OutsideWindow;
    }
    MatchOutcome::Matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use lodestone_types::billing::DepositStatus;
    use lodestone_types::ids::TxHash;

    fn wallet(s: &str) -> Address {
        Address::from(s)
    }

    fn base_request(unique_amount: BigDecimal) -> DepositRequest {
        let now = Utc::now();
        DepositRequest {
            id: 1,
            player_id: 1,
            wallet: wallet("0xdeposit"),
            unique_amount,
            expires_at: now + Duration::minutes(30),
            status: DepositStatus::Pending,
            tx_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Spec §8: the canonical 4-field match.
    #[test]
    fn matches_when_all_four_fields_align() {
        let request = base_request(BigDecimal::from(100));
        let transfer = ObservedTransfer {
            tx_hash: TxHash::new("0xabc"),
            from: wallet("0xplayer"),
            to: wallet("0xdeposit"),
            amount: BigDecimal::from(100),
            block_time: request.created_at,
        };
        assert_eq!(
            evaluate_match(&transfer, &request, &wallet("0xdeposit"), &[wallet("0xplayer")]),
            MatchOutcome::Matched
        );
    }

    #[test]
    fn rejects_wrong_amount() {
        let request = base_request(BigDecimal::from(100));
        let transfer = ObservedTransfer {
            tx_hash: TxHash::new("0xabc"),
            from: wallet("0xplayer"),
            to: wallet("0xdeposit"),
            amount: BigDecimal::from(99),
            block_time: request.created_at,
        };
        assert_eq!(
            evaluate_match(&transfer, &request, &wallet("0xdeposit"), &[wallet("0xplayer")]),
            MatchOutcome::WrongAmount
        );
    }

    #[test]
    fn rejects_transfer_outside_window() {
        let request = base_request(BigDecimal::from(100));
        let transfer = ObservedTransfer {
            tx_hash: TxHash::new("0xabc"),
            from: wallet("0xplayer"),
            to: wallet("0xdeposit"),
            amount: BigDecimal::from(100),
            block_time: request.expires_at + Duration::minutes(1),
        };
        assert_eq!(
            evaluate_match(&transfer, &request, &wallet("0xdeposit"), &[wallet("0xplayer")]),
            MatchOutcome::OutsideWindow
        );
    }

    #[test]
    fn rejects_sender_not_in_player_wallets() {
        let request = base_request(BigDecimal::from(100));
        let transfer = ObservedTransfer {
            tx_hash: TxHash::new("0xabc"),
            from: wallet("0xstranger"),
            to: wallet("0xdeposit"),
            amount: BigDecimal::from(100),
            block_time: request.created_at,
        };
        assert_eq!(
            evaluate_match(&transfer, &request, &wallet("0xdeposit"), &[wallet("0xplayer")]),
            MatchOutcome::WrongSender
        );
    }
}
