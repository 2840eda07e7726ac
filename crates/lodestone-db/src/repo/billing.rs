//! Deposit requests and garden optimizations (spec §4.H).

use crate::error::{DbError, Result};
use crate::storage::Storage;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use lodestone_types::billing::{DepositRequest, DepositStatus, GardenOptimization, OptimizationStatus};
use lodestone_types::ids::{Address, TxHash};
use sqlx::Row;

fn dep_status_to_str(s: DepositStatus) -> &'static str {
    match s {
        DepositStatus::Pending => "pending",
        DepositStatus::Matched => "matched",
        DepositStatus::Completed => "completed",
        DepositStatus::Expired => "expired",
        DepositStatus::Errored => "errored",
    }
}

fn dep_status_from_str(s: &str) -> DepositStatus {
    match s {
        "matched" => DepositStatus::Matched,
        "completed" => DepositStatus::Completed,
        "expired" => DepositStatus::Expired,
        "errored" => DepositStatus::Errored,
        _ => DepositStatus::Pending,
    }
}

fn row_to_deposit(r: sqlx::postgres::PgRow) -> DepositRequest {
    DepositRequest {
        id: r.get("id"),
        player_id: r.get("player_id"),
        wallet: Address::from(r.get::<String, _>("wallet")),
        unique_amount: r.get("unique_amount"),
        expires_at: r.get("expires_at"),
        status: dep_status_from_str(r.get::<String, _>("status").as_str()),
        tx_hash: r.get::<Option<String>, _>("tx_hash").map(TxHash::new),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

impl Storage {
    /// Creates a new pending deposit request. Callers must ensure at most
    /// one pending request per player (spec §4.H invariant); this is
    /// enforced by a partial unique index on `(player_id) WHERE status =
    /// 'pending'`.
    pub async fn create_deposit_request(
        &self,
        player_id: i64,
        wallet: &Address,
        unique_amount: &BigDecimal,
        expires_at: DateTime<Utc>,
    ) -> Result<DepositRequest> {
        let row = sqlx::query(
            r#"
            INSERT INTO deposit_requests (player_id, wallet, unique_amount, status, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(player_id)
        .bind(wallet.as_str())
        .bind(unique_amount)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_deposit(row))
    }

    pub async fn get_pending_deposit_for_player(&self, player_id: i64) -> Result<Option<DepositRequest>> {
        let row = sqlx::query("SELECT * FROM deposit_requests WHERE player_id = $1 AND status = 'pending'")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_deposit))
    }

    /// Candidate requests a transfer could match: status `pending`, window
    /// still open.
    pub async fn pending_deposit_candidates(&self, amount: &BigDecimal, wallet: &Address) -> Result<Vec<DepositRequest>> {
        let rows = sqlx::query(
            "SELECT * FROM deposit_requests WHERE status = 'pending' AND unique_amount = $1 AND wallet = $2",
        )
        .bind(amount)
        .bind(wallet.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_deposit).collect())
    }

    /// Transition a request, enforcing the state machine (spec §4.H).
    pub async fn transition_deposit(
        &self,
        id: i64,
        next: DepositStatus,
        tx_hash: Option<&TxHash>,
    ) -> Result<()> {
        let row = sqlx::query("SELECT * FROM deposit_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        let current = row_to_deposit(row);

        if !current.status.can_transition_to(next) {
            return Err(DbError::InvariantViolation(format!(
                "illegal deposit transition {:?} -> {:?}",
                current.status, next
            )));
        }

        sqlx::query(
            "UPDATE deposit_requests SET status = $2, tx_hash = COALESCE($3, tx_hash), updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(dep_status_to_str(next))
        .bind(tx_hash.map(|h| h.as_str().to_string()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Credits the player's balance and transitions the request to
    /// `completed` atomically (spec §4.H exactly-once credit invariant).
    /// Doing both in one transaction means a crash or error between the two
    /// steps leaves nothing applied, rather than a credited balance stuck
    /// behind a failed transition — the retry loop in `lodestone-billing`
    /// can safely re-run this whole call without double-crediting.
    pub async fn credit_and_complete_deposit(&self, request_id: i64, player_id: i64, amount: &BigDecimal) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM deposit_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;
        let current = row_to_deposit(row);

        if current.status == DepositStatus::Completed {
            tx.commit().await?;
            return Ok(());
        }
        if !current.status.can_transition_to(DepositStatus::Completed) {
            return Err(DbError::InvariantViolation(format!(
                "illegal deposit transition {:?} -> Completed",
                current.status
            )));
        }

        sqlx::query("UPDATE jewel_balances SET balance = balance + $2 WHERE player_id = $1")
            .bind(player_id)
            .bind(amount)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE deposit_requests SET status = 'completed', updated_at = $2 WHERE id = $1")
            .bind(request_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Expiry sweep (spec §4.H): transitions all expired pending requests.
    pub async fn expire_stale_deposits(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE deposit_requests SET status = 'expired', updated_at = $1 WHERE status = 'pending' AND expires_at < $1",
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn recent_deposits(&self, limit: i64) -> Result<Vec<DepositRequest>> {
        let rows = sqlx::query("SELECT * FROM deposit_requests ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(row_to_deposit).collect())
    }

    /// Listing for `GET /api/user/summary/:discordId` (spec §6).
    pub async fn garden_optimizations_for_player(&self, player_id: i64, limit: i64) -> Result<Vec<GardenOptimization>> {
        let rows = sqlx::query("SELECT * FROM garden_optimizations WHERE player_id = $1 ORDER BY created_at DESC LIMIT $2")
            .bind(player_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(row_to_optimization).collect())
    }

    // --- garden optimizations -------------------------------------------------

    pub async fn create_garden_optimization(
        &self,
        player_id: i64,
        wallet: &Address,
        unique_amount: &BigDecimal,
        expires_at: DateTime<Utc>,
    ) -> Result<GardenOptimization> {
        let row = sqlx::query(
            r#"
            INSERT INTO garden_optimizations (player_id, wallet, unique_amount, status, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, 'awaiting_payment', $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(player_id)
        .bind(wallet.as_str())
        .bind(unique_amount)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_optimization(row))
    }

    /// Candidate optimizations a transfer could satisfy: status
    /// `awaiting_payment`, matching unique amount at this wallet (spec §4.H
    /// "parallel flow", mirrors `pending_deposit_candidates`).
    pub async fn garden_optimization_candidates(&self, amount: &BigDecimal, wallet: &Address) -> Result<Vec<GardenOptimization>> {
        let rows = sqlx::query(
            "SELECT * FROM garden_optimizations WHERE status = 'awaiting_payment' AND unique_amount = $1 AND wallet = $2",
        )
        .bind(amount)
        .bind(wallet.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_optimization).collect())
    }

    /// Optimizations whose payment has been verified and are ready for the
    /// processor to pick up (spec §4.L "optimization processor").
    pub async fn garden_optimizations_awaiting_processing(&self, limit: i64) -> Result<Vec<GardenOptimization>> {
        let rows = sqlx::query(
            "SELECT * FROM garden_optimizations WHERE status = 'payment_verified' ORDER BY updated_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_optimization).collect())
    }

    pub async fn transition_garden_optimization(
        &self,
        id: i64,
        next: OptimizationStatus,
        tx_hash: Option<&TxHash>,
    ) -> Result<()> {
        let row = sqlx::query("SELECT * FROM garden_optimizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        let current = row_to_optimization(row);

        if !current.status.can_transition_to(next) {
            return Err(DbError::InvariantViolation(format!(
                "illegal optimization transition {:?} -> {:?}",
                current.status, next
            )));
        }

        sqlx::query(
            "UPDATE garden_optimizations SET status = $2, tx_hash = COALESCE($3, tx_hash), updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(opt_status_to_str(next))
        .bind(tx_hash.map(|h| h.as_str().to_string()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn expire_stale_optimizations(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE garden_optimizations SET status = 'expired', updated_at = $1 WHERE status IN ('awaiting_payment', 'payment_verified') AND expires_at < $1",
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn opt_status_to_str(s: OptimizationStatus) -> &'static str {
    match s {
        OptimizationStatus::AwaitingPayment => "awaiting_payment",
        OptimizationStatus::PaymentVerified => "payment_verified",
        OptimizationStatus::Processing => "processing",
        OptimizationStatus::Completed => "completed",
        OptimizationStatus::Failed => "failed",
        OptimizationStatus::Expired => "expired",
    }
}

fn opt_status_from_str(s: &str) -> OptimizationStatus {
    match s {
        "payment_verified" => OptimizationStatus::PaymentVerified,
        "processing" => OptimizationStatus::Processing,
        "completed" => OptimizationStatus::Completed,
        "failed" => OptimizationStatus::Failed,
        "expired" => OptimizationStatus::Expired,
        _ => OptimizationStatus::AwaitingPayment,
    }
}

fn row_to_optimization(r: sqlx::postgres::PgRow) -> GardenOptimization {
    GardenOptimization {
        id: r.get("id"),
        player_id: r.get("player_id"),
        wallet: Address::from(r.get::<String, _>("wallet")),
        unique_amount: r.get("unique_amount"),
        status: opt_status_from_str(r.get::<String, _>("status").as_str()),
        tx_hash: r.get::<Option<String>, _>("tx_hash").map(TxHash::new),
        expires_at: r.get("expires_at"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}
