//! Checkpoint store (spec §4.B): `(indexer_name -> last_block, status,
//! stats)` plus worker-shard ranges. A worker reads and writes only its own
//! row; reset is explicit and admin-gated.

use crate::error::{DbError, Result};
use crate::storage::Storage;
use chrono::Utc;
use lodestone_types::chain::{CheckpointDelta, CheckpointStatus, IndexerCheckpoint, IndexerKind};
use sqlx::Row;

fn status_to_str(status: CheckpointStatus) -> &'static str {
    match status {
        CheckpointStatus::Idle => "idle",
        CheckpointStatus::Running => "running",
        CheckpointStatus::Complete => "complete",
        CheckpointStatus::Error => "error",
    }
}

fn status_from_str(s: &str) -> CheckpointStatus {
    match s {
        "running" => CheckpointStatus::Running,
        "complete" => CheckpointStatus::Complete,
        "error" => CheckpointStatus::Error,
        _ => CheckpointStatus::Idle,
    }
}

fn kind_to_str(kind: IndexerKind) -> &'static str {
    kind.as_str()
}

fn kind_from_str(s: &str) -> IndexerKind {
    match s {
        "swap" => IndexerKind::Swap,
        "reward" => IndexerKind::Reward,
        "bridge" => IndexerKind::Bridge,
        "hunt" => IndexerKind::Hunt,
        "tournament" => IndexerKind::Tournament,
        "marketplace" => IndexerKind::Marketplace,
        "daily_aggregate" => IndexerKind::DailyAggregate,
        _ => IndexerKind::Stake,
    }
}

fn row_to_checkpoint(row: &sqlx::postgres::PgRow) -> IndexerCheckpoint {
    IndexerCheckpoint {
        name: row.get("name"),
        kind: kind_from_str(row.get::<String, _>("kind").as_str()),
        pid: row.get("pid"),
        shard_start: row.get("shard_start"),
        shard_end: row.get("shard_end"),
        last_indexed_block: row.get("last_indexed_block"),
        genesis_block: row.get("genesis_block"),
        status: status_from_str(row.get::<String, _>("status").as_str()),
        stats: row.get("stats"),
        last_error: row.get("last_error"),
        updated_at: row.get("updated_at"),
    }
}

impl Storage {
    /// Seed a checkpoint row from `genesis_block` if one doesn't already
    /// exist for `name` (spec §4.L: "missing checkpoints are seeded from
    /// configured genesisBlock").
    pub async fn seed_checkpoint(&self, checkpoint: &IndexerCheckpoint) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pool_event_indexer_progress
                (name, kind, pid, shard_start, shard_end, last_indexed_block,
                 genesis_block, status, stats, last_error, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&checkpoint.name)
        .bind(kind_to_str(checkpoint.kind))
        .bind(checkpoint.pid)
        .bind(checkpoint.shard_start)
        .bind(checkpoint.shard_end)
        .bind(checkpoint.last_indexed_block)
        .bind(checkpoint.genesis_block)
        .bind(status_to_str(checkpoint.status))
        .bind(&checkpoint.stats)
        .bind(&checkpoint.last_error)
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_checkpoint(&self, name: &str) -> Result<Option<IndexerCheckpoint>> {
        let row = sqlx::query("SELECT * FROM pool_event_indexer_progress WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_checkpoint))
    }

    /// Read-modify-write: a worker must only ever call this for its own
    /// `name`. `updated_at` is always bumped to now (spec §4.B).
    pub async fn upsert_checkpoint(&self, name: &str, delta: CheckpointDelta) -> Result<()> {
        let current = self
            .get_checkpoint(name)
            .await?
            .ok_or(DbError::NotFound)?;

        let next_last_block = delta.last_indexed_block.unwrap_or(current.last_indexed_block);
        if next_last_block < current.last_indexed_block {
            return Err(DbError::InvariantViolation(format!(
                "checkpoint {name} would move backwards: {} -> {}",
                current.last_indexed_block, next_last_block
            )));
        }

        let next_status = delta.status.unwrap_or(current.status);
        let next_stats = delta.stats.unwrap_or(current.stats);
        let next_error = delta.last_error.unwrap_or(current.last_error);

        sqlx::query(
            r#"
            UPDATE pool_event_indexer_progress
            SET last_indexed_block = $2, status = $3, stats = $4, last_error = $5, updated_at = $6
            WHERE name = $1
            "#,
        )
        .bind(name)
        .bind(next_last_block)
        .bind(status_to_str(next_status))
        .bind(next_stats)
        .bind(next_error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_checkpoints_by_kind(&self, kind: IndexerKind) -> Result<Vec<IndexerCheckpoint>> {
        let rows = sqlx::query("SELECT * FROM pool_event_indexer_progress WHERE kind = $1 ORDER BY name")
            .bind(kind_to_str(kind))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_checkpoint).collect())
    }

    /// Admin-gated: rewinds `last_indexed_block` to `genesis_block` or an
    /// operator-specified height (spec §4.B reset operation).
    pub async fn reset_checkpoint(&self, name: &str, to_block: Option<i64>) -> Result<()> {
        let current = self
            .get_checkpoint(name)
            .await?
            .ok_or(DbError::NotFound)?;
        let target = to_block.unwrap_or(current.genesis_block);

        sqlx::query(
            r#"
            UPDATE pool_event_indexer_progress
            SET last_indexed_block = $2, status = 'idle', last_error = NULL, updated_at = $3
            WHERE name = $1
            "#,
        )
        .bind(name)
        .bind(target)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
