//! Player identity, wallet clusters, and the player-facing HTTP read models
//! (spec §4.I, §6).

use crate::error::{DbError, Result};
use crate::storage::Storage;
use chrono::Utc;
use lodestone_types::ids::Address;
use lodestone_types::player::{EngagementState, Player, ProfileBlob, Tier, WalletCluster, WalletLink};
use sqlx::Row;

fn tier_to_str(t: Tier) -> &'static str {
    match t {
        Tier::Free => "free",
        Tier::Bronze => "bronze",
        Tier::Silver => "silver",
        Tier::Gold => "gold",
        Tier::Whale => "whale",
    }
}

fn tier_from_str(s: &str) -> Tier {
    Tier::from_str_loose(s).unwrap_or(Tier::Free)
}

fn state_to_str(s: EngagementState) -> &'static str {
    match s {
        EngagementState::Visitor => "visitor",
        EngagementState::Explorer => "explorer",
        EngagementState::Participant => "participant",
        EngagementState::Player => "player",
        EngagementState::Active => "active",
        EngagementState::Committed => "committed",
    }
}

fn state_from_str(s: &str) -> EngagementState {
    match s {
        "explorer" => EngagementState::Explorer,
        "participant" => EngagementState::Participant,
        "player" => EngagementState::Player,
        "active" => EngagementState::Active,
        "committed" => EngagementState::Committed,
        _ => EngagementState::Visitor,
    }
}

fn row_to_player(r: sqlx::postgres::PgRow) -> Player {
    let wallets: Vec<String> = r.get("wallets");
    let flags: Vec<String> = r.get("flags");
    let profile_json: serde_json::Value = r.get("profile_data");
    let profile_data: ProfileBlob = serde_json::from_value(profile_json).unwrap_or_default();

    Player {
        id: r.get("id"),
        discord_id: r.get("discord_id"),
        wallets: wallets.into_iter().map(Address::from).collect(),
        primary_wallet: r.get::<Option<String>, _>("primary_wallet").map(Address::from),
        tier: tier_from_str(r.get::<String, _>("tier").as_str()),
        state: state_from_str(r.get::<String, _>("state").as_str()),
        flags,
        profile_data,
        first_seen_at: r.get("first_seen_at"),
        updated_at: r.get("updated_at"),
    }
}

impl Storage {
    /// `ensurePlayer(discordId, username)` (spec §4.I): idempotent upsert.
    /// On first insert, atomically creates the billing/balance sibling row
    /// in the same transaction (spec §4.I).
    pub async fn ensure_player(&self, discord_id: &str) -> Result<Player> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT * FROM players WHERE discord_id = $1")
            .bind(discord_id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(row) = existing {
            tx.commit().await?;
            return Ok(row_to_player(row));
        }

        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO players (discord_id, wallets, primary_wallet, tier, state, flags, profile_data, first_seen_at, updated_at)
            VALUES ($1, '{}', NULL, 'free', 'visitor', '{}', $2, $3, $3)
            RETURNING *
            "#,
        )
        .bind(discord_id)
        .bind(serde_json::to_value(ProfileBlob::default()).unwrap())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let player_id: i64 = row.get("id");
        sqlx::query("INSERT INTO jewel_balances (player_id, balance) VALUES ($1, 0)")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row_to_player(row))
    }

    pub async fn get_player(&self, id: i64) -> Result<Option<Player>> {
        let row = sqlx::query("SELECT * FROM players WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_player))
    }

    pub async fn get_player_by_discord_id(&self, discord_id: &str) -> Result<Option<Player>> {
        let row = sqlx::query("SELECT * FROM players WHERE discord_id = $1")
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_player))
    }

    pub async fn list_players(&self, limit: i64, offset: i64) -> Result<Vec<Player>> {
        let rows = sqlx::query("SELECT * FROM players ORDER BY id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(row_to_player).collect())
    }

    pub async fn set_player_tier(&self, id: i64, tier: Tier) -> Result<()> {
        sqlx::query("UPDATE players SET tier = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(tier_to_str(tier))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Written by the classification engine on reclassification (spec
    /// §4.J).
    pub async fn set_player_state(&self, id: i64, state: EngagementState) -> Result<()> {
        sqlx::query("UPDATE players SET state = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(state_to_str(state))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_player_settings(&self, discord_id: &str, profile_patch: serde_json::Value) -> Result<()> {
        let row = sqlx::query("SELECT profile_data FROM players WHERE discord_id = $1")
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;

        let mut profile: serde_json::Value = row.get("profile_data");
        if let (Some(obj), Some(patch_obj)) = (profile.as_object_mut(), profile_patch.as_object()) {
            for (k, v) in patch_obj {
                obj.insert(k.clone(), v.clone());
            }
        }

        sqlx::query("UPDATE players SET profile_data = $2, updated_at = $3 WHERE discord_id = $1")
            .bind(discord_id)
            .bind(profile)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Cascades balance then player (spec §6 `DELETE /api/admin/users/:discordId`).
    pub async fn delete_player_cascade(&self, discord_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let player = sqlx::query("SELECT id FROM players WHERE discord_id = $1")
            .bind(discord_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(player) = player else {
            tx.rollback().await?;
            return Err(DbError::NotFound);
        };
        let player_id: i64 = player.get("id");

        sqlx::query("DELETE FROM jewel_balances WHERE player_id = $1")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// `getOrCreateCluster(userId)` (spec §4.I).
    pub async fn get_or_create_cluster(&self, player_id: i64) -> Result<WalletCluster> {
        let existing = sqlx::query("SELECT * FROM wallet_clusters WHERE owner_player_id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = existing {
            return Ok(WalletCluster {
                cluster_key: row.get("cluster_key"),
                owner_player_id: row.get("owner_player_id"),
            });
        }

        let cluster_key = format!("cluster-{player_id}-{}", uuid::Uuid::new_v4());
        sqlx::query("INSERT INTO wallet_clusters (cluster_key, owner_player_id) VALUES ($1, $2)")
            .bind(&cluster_key)
            .bind(player_id)
            .execute(&self.pool)
            .await?;

        Ok(WalletCluster {
            cluster_key,
            owner_player_id: player_id,
        })
    }

    /// `linkWallet(player, address)` (spec §4.I): normalizes to lowercase;
    /// first wallet becomes primary; rejects an address already active in
    /// another cluster (spec §3 invariant: an address is active in at most
    /// one cluster).
    pub async fn link_wallet(&self, player_id: i64, address: &Address) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let conflict = sqlx::query(
            "SELECT 1 FROM wallet_links wl JOIN wallet_clusters wc ON wl.cluster_key = wc.cluster_key WHERE wl.address = $1 AND wl.is_active AND wc.owner_player_id != $2",
        )
        .bind(address.as_str())
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?;

        if conflict.is_some() {
            tx.rollback().await?;
            return Err(DbError::InvariantViolation(format!(
                "address {address} already active in another cluster"
            )));
        }

        let cluster = self.get_or_create_cluster(player_id).await?;

        let wallet_count: i64 = sqlx::query("SELECT COUNT(*) AS c FROM wallet_links WHERE cluster_key = $1")
            .bind(&cluster.cluster_key)
            .fetch_one(&mut *tx)
            .await?
            .get("c");

        let is_primary = wallet_count == 0;

        sqlx::query(
            r#"
            INSERT INTO wallet_links (cluster_key, chain, address, is_primary, is_active)
            VALUES ($1, 'evm', $2, $3, true)
            ON CONFLICT (address) DO NOTHING
            "#,
        )
        .bind(&cluster.cluster_key)
        .bind(address.as_str())
        .bind(is_primary)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE players SET wallets = array_append(wallets, $2), primary_wallet = COALESCE(primary_wallet, $2), updated_at = $3 WHERE id = $1",
        )
        .bind(player_id)
        .bind(address.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn wallet_links_for_cluster(&self, cluster_key: &str) -> Result<Vec<WalletLink>> {
        let rows = sqlx::query("SELECT * FROM wallet_links WHERE cluster_key = $1")
            .bind(cluster_key)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| WalletLink {
                cluster_key: r.get("cluster_key"),
                chain: r.get("chain"),
                address: Address::from(r.get::<String, _>("address")),
                is_primary: r.get("is_primary"),
                is_active: r.get("is_active"),
            })
            .collect())
    }

    /// Replaces the flag set wholesale (spec §4.J classification flags are
    /// recomputed from scratch on every run, never accumulated).
    pub async fn set_player_flags(&self, id: i64, flags: &[String]) -> Result<()> {
        sqlx::query("UPDATE players SET flags = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(flags)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn player_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS c FROM players").fetch_one(&self.pool).await?;
        Ok(row.get("c"))
    }

    /// `GET /api/analytics/overview` (spec §6): total JEWEL held across all
    /// player balances.
    pub async fn total_jewel_balance(&self) -> Result<bigdecimal::BigDecimal> {
        let row = sqlx::query("SELECT COALESCE(SUM(balance), 0) AS total FROM jewel_balances")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    pub async fn get_jewel_balance(&self, player_id: i64) -> Result<bigdecimal::BigDecimal> {
        let row = sqlx::query("SELECT balance FROM jewel_balances WHERE player_id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("balance")).unwrap_or_else(|| bigdecimal::BigDecimal::from(0)))
    }
}
