//! Pool metadata and staker positions (spec §3).

use crate::error::Result;
use crate::storage::Storage;
use bigdecimal::BigDecimal;
use lodestone_types::ids::{Address, Pid};
use lodestone_types::pool::{Pool, StakeActivity, StakerPosition};
use sqlx::Row;

fn activity_to_str(a: StakeActivity) -> &'static str {
    match a {
        StakeActivity::Deposit => "deposit",
        StakeActivity::Withdraw => "withdraw",
        StakeActivity::EmergencyWithdraw => "emergency_withdraw",
        StakeActivity::Reconcile => "reconcile",
    }
}

fn activity_from_str(s: &str) -> StakeActivity {
    match s {
        "withdraw" => StakeActivity::Withdraw,
        "emergency_withdraw" => StakeActivity::EmergencyWithdraw,
        "reconcile" => StakeActivity::Reconcile,
        _ => StakeActivity::Deposit,
    }
}

impl Storage {
    pub async fn upsert_pool(&self, pool: &Pool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pools (pid, lp_token, token0, token1, decimals0, decimals1,
                                symbol0, symbol1, alloc_point, total_staked_v2)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (pid) DO UPDATE SET
                alloc_point = EXCLUDED.alloc_point,
                total_staked_v2 = EXCLUDED.total_staked_v2
            "#,
        )
        .bind(pool.pid)
        .bind(pool.lp_token.as_str())
        .bind(pool.token0.as_str())
        .bind(pool.token1.as_str())
        .bind(pool.decimals0)
        .bind(pool.decimals1)
        .bind(&pool.symbol0)
        .bind(&pool.symbol1)
        .bind(pool.alloc_point)
        .bind(&pool.total_staked_v2)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_pool(&self, pid: Pid) -> Result<Option<Pool>> {
        let row = sqlx::query("SELECT * FROM pools WHERE pid = $1")
            .bind(pid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Pool {
            pid: r.get("pid"),
            lp_token: Address::from(r.get::<String, _>("lp_token")),
            token0: Address::from(r.get::<String, _>("token0")),
            token1: Address::from(r.get::<String, _>("token1")),
            decimals0: r.get("decimals0"),
            decimals1: r.get("decimals1"),
            symbol0: r.get("symbol0"),
            symbol1: r.get("symbol1"),
            alloc_point: r.get("alloc_point"),
            total_staked_v2: r.get("total_staked_v2"),
        }))
    }

    pub async fn list_pools(&self) -> Result<Vec<Pool>> {
        let rows = sqlx::query("SELECT * FROM pools ORDER BY pid").fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| Pool {
                pid: r.get("pid"),
                lp_token: Address::from(r.get::<String, _>("lp_token")),
                token0: Address::from(r.get::<String, _>("token0")),
                token1: Address::from(r.get::<String, _>("token1")),
                decimals0: r.get("decimals0"),
                decimals1: r.get("decimals1"),
                symbol0: r.get("symbol0"),
                symbol1: r.get("symbol1"),
                alloc_point: r.get("alloc_point"),
                total_staked_v2: r.get("total_staked_v2"),
            })
            .collect())
    }

    /// Last-writer-wins upsert on `(wallet, pid)` (spec §5 ordering
    /// guarantee: StakerPosition uses last-writer-wins with a periodic
    /// authoritative re-read as reconciler).
    pub async fn upsert_staker_position(&self, position: &StakerPosition) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pool_stakers (wallet, pid, staked_lp, last_activity_type,
                                       last_activity_block, last_activity_tx_hash, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (wallet, pid) DO UPDATE SET
                staked_lp = EXCLUDED.staked_lp,
                last_activity_type = EXCLUDED.last_activity_type,
                last_activity_block = EXCLUDED.last_activity_block,
                last_activity_tx_hash = EXCLUDED.last_activity_tx_hash,
                updated_at = EXCLUDED.updated_at
            WHERE pool_stakers.last_activity_block <= EXCLUDED.last_activity_block
            "#,
        )
        .bind(position.wallet.as_str())
        .bind(position.pid)
        .bind(&position.staked_lp)
        .bind(activity_to_str(position.last_activity_type))
        .bind(position.last_activity_block)
        .bind(position.last_activity_tx_hash.as_str())
        .bind(position.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// `getPoolStakers(pid)` (spec §4.G): stakers with `stakedLp > 0`,
    /// sorted descending.
    pub async fn get_pool_stakers(&self, pid: Pid) -> Result<Vec<StakerPosition>> {
        let rows = sqlx::query(
            "SELECT * FROM pool_stakers WHERE pid = $1 AND staked_lp > 0 ORDER BY staked_lp DESC",
        )
        .bind(pid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StakerPosition {
                wallet: Address::from(r.get::<String, _>("wallet")),
                pid: r.get("pid"),
                staked_lp: r.get("staked_lp"),
                last_activity_type: activity_from_str(r.get::<String, _>("last_activity_type").as_str()),
                last_activity_block: r.get("last_activity_block"),
                last_activity_tx_hash: lodestone_types::ids::TxHash::new(
                    r.get::<String, _>("last_activity_tx_hash"),
                ),
                updated_at: r.get("updated_at"),
            })
            .collect())
    }

    /// All positions for one wallet across every pool (spec §4.J input:
    /// folded into a `WalletActivity` rollup), restricted to non-zero
    /// stakes same as [`Storage::get_pool_stakers`].
    pub async fn staker_positions_for_wallet(&self, wallet: &Address) -> Result<Vec<StakerPosition>> {
        let rows = sqlx::query(
            "SELECT * FROM pool_stakers WHERE wallet = $1 AND staked_lp > 0 ORDER BY pid",
        )
        .bind(wallet.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StakerPosition {
                wallet: Address::from(r.get::<String, _>("wallet")),
                pid: r.get("pid"),
                staked_lp: r.get("staked_lp"),
                last_activity_type: activity_from_str(r.get::<String, _>("last_activity_type").as_str()),
                last_activity_block: r.get("last_activity_block"),
                last_activity_tx_hash: lodestone_types::ids::TxHash::new(
                    r.get::<String, _>("last_activity_tx_hash"),
                ),
                updated_at: r.get("updated_at"),
            })
            .collect())
    }

    pub async fn get_staker_position(&self, wallet: &Address, pid: Pid) -> Result<Option<BigDecimal>> {
        let row = sqlx::query("SELECT staked_lp FROM pool_stakers WHERE wallet = $1 AND pid = $2")
            .bind(wallet.as_str())
            .bind(pid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("staked_lp")))
    }
}
