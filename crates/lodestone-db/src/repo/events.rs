//! Append-only swap/reward event tables, idempotent on `(tx_hash,
//! log_index)` (spec §3 invariant I-1, §4.E step 4: `ON CONFLICT DO
//! NOTHING`).

use crate::error::Result;
use crate::storage::Storage;
use lodestone_types::ids::{Address, Pid, TxHash};
use lodestone_types::pool::{RewardEvent, SwapEvent};
use sqlx::Row;

impl Storage {
    /// Returns `true` if the row was newly inserted, `false` if it already
    /// existed (uniqueness conflict treated as a no-op, spec §7.3).
    pub async fn insert_swap_event(&self, event: &SwapEvent) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO pool_swap_events
                (pid, block_number, tx_hash, log_index, amount0_in, amount1_in,
                 amount0_out, amount1_out, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (tx_hash, log_index) DO NOTHING
            "#,
        )
        .bind(event.pid)
        .bind(event.block_number)
        .bind(event.tx_hash.as_str())
        .bind(event.log_index)
        .bind(&event.amount0_in)
        .bind(&event.amount1_in)
        .bind(&event.amount0_out)
        .bind(&event.amount1_out)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_reward_event(&self, event: &RewardEvent) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO pool_reward_events
                (pid, block_number, tx_hash, log_index, reward_token, reward_amount, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tx_hash, log_index) DO NOTHING
            "#,
        )
        .bind(event.pid)
        .bind(event.block_number)
        .bind(event.tx_hash.as_str())
        .bind(event.log_index)
        .bind(event.reward_token.as_str())
        .bind(&event.reward_amount)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn swap_events_in_range(
        &self,
        pid: Pid,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<SwapEvent>> {
        let rows = sqlx::query(
            "SELECT * FROM pool_swap_events WHERE pid = $1 AND timestamp >= $2 AND timestamp < $3 ORDER BY block_number, log_index",
        )
        .bind(pid)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SwapEvent {
                pid: r.get("pid"),
                block_number: r.get("block_number"),
                tx_hash: TxHash::new(r.get::<String, _>("tx_hash")),
                log_index: r.get("log_index"),
                amount0_in: r.get("amount0_in"),
                amount1_in: r.get("amount1_in"),
                amount0_out: r.get("amount0_out"),
                amount1_out: r.get("amount1_out"),
                timestamp: r.get("timestamp"),
            })
            .collect())
    }

    pub async fn reward_events_in_range(
        &self,
        pid: Pid,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<RewardEvent>> {
        let rows = sqlx::query(
            "SELECT * FROM pool_reward_events WHERE pid = $1 AND timestamp >= $2 AND timestamp < $3 ORDER BY block_number, log_index",
        )
        .bind(pid)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| RewardEvent {
                pid: r.get("pid"),
                block_number: r.get("block_number"),
                tx_hash: TxHash::new(r.get::<String, _>("tx_hash")),
                log_index: r.get("log_index"),
                reward_token: Address::from(r.get::<String, _>("reward_token")),
                reward_amount: r.get("reward_amount"),
                timestamp: r.get("timestamp"),
            })
            .collect())
    }
}
