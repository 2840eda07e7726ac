//! Deposit reconciliation state machine and the parallel garden-optimization
//! payment flow (spec §4.H).

use crate::ids::{Address, TxHash};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Pending,
    Matched,
    Completed,
    Expired,
    Errored,
}

impl DepositStatus {
    /// Valid transitions per spec §4.H: `pending -> matched -> completed`
    /// (success path), `pending -> expired`, `* -> errored`.
    pub fn can_transition_to(self, next: DepositStatus) -> bool {
        use DepositStatus::*;
        matches!(
            (self, next),
            (Pending, Matched)
                | (Matched, Completed)
                | (Pending, Expired)
                | (_, Errored)
        )
    }
}

/// One outstanding deposit request. `unique_amount` is `baseAmount` plus a
/// jittered sub-unit suffix chosen so `(sender, amount)` is collision
/// resistant within the active request window (spec §4.H invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    pub id: i64,
    pub player_id: i64,
    pub wallet: Address,
    pub unique_amount: BigDecimal,
    pub expires_at: DateTime<Utc>,
    pub status: DepositStatus,
    pub tx_hash: Option<TxHash>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transfer observed on-chain, considered as a candidate match against
/// outstanding [`DepositRequest`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedTransfer {
    pub tx_hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub amount: BigDecimal,
    pub block_time: DateTime<Utc>,
}

/// Result of evaluating a transfer against a deposit request (spec §4.H
/// matching rule / §7.5 deposit-mismatch).
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched,
    WrongRecipient,
    WrongAmount,
    WrongSender,
    OutsideWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStatus {
    AwaitingPayment,
    PaymentVerified,
    Processing,
    Completed,
    Failed,
    Expired,
}

impl OptimizationStatus {
    pub fn can_transition_to(self, next: OptimizationStatus) -> bool {
        use OptimizationStatus::*;
        matches!(
            (self, next),
            (AwaitingPayment, PaymentVerified)
                | (PaymentVerified, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (AwaitingPayment, Expired)
                | (PaymentVerified, Expired)
        )
    }
}

/// Garden-optimization payment flow (spec §4.H "parallel flow").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GardenOptimization {
    pub id: i64,
    pub player_id: i64,
    pub wallet: Address,
    pub unique_amount: BigDecimal,
    pub status: OptimizationStatus,
    pub tx_hash: Option<TxHash>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One billed LLM call (spec §6 `query_costs` table, surfaced via
/// `GET /api/analytics/query-breakdown`). Recorded by the Discord bot
/// surface, which is out of scope here (spec §1); this crate only stores
/// and aggregates what it is handed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCost {
    pub id: i64,
    pub query_type: String,
    pub cost_usd: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// One row of the query-type histogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTypeBreakdown {
    pub query_type: String,
    pub count: i64,
    pub total_cost_usd: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_transitions_follow_the_state_machine() {
        assert!(DepositStatus::Pending.can_transition_to(DepositStatus::Matched));
        assert!(DepositStatus::Matched.can_transition_to(DepositStatus::Completed));
        assert!(DepositStatus::Pending.can_transition_to(DepositStatus::Expired));
        assert!(!DepositStatus::Completed.can_transition_to(DepositStatus::Pending));
        assert!(!DepositStatus::Expired.can_transition_to(DepositStatus::Matched));
        assert!(DepositStatus::Matched.can_transition_to(DepositStatus::Errored));
    }

    #[test]
    fn optimization_transitions_follow_the_state_machine() {
        assert!(OptimizationStatus::AwaitingPayment.can_transition_to(OptimizationStatus::PaymentVerified));
        assert!(OptimizationStatus::Processing.can_transition_to(OptimizationStatus::Completed));
        assert!(!OptimizationStatus::Completed.can_transition_to(OptimizationStatus::Processing));
    }
}
