//! Hunt, tournament, tavern and summon persistence (spec §4.E, §13
//! supplement). All append-only rollup rows; idempotent on `(tx_hash,
//! wallet)` where the event carries one.

use crate::error::Result;
use crate::storage::Storage;
use lodestone_types::game::{
    HeroTournamentSnapshot, HuntEncounter, ListingOutcome, PartyLuckSnapshot, SummonConversionMetrics,
    SummonOffspring, SummonSaleOutcome, SummonSession, TavernListing, TavernListingHistory, TournamentPlacement,
};
use lodestone_types::ids::{Address, ChainId, TxHash};
use sqlx::Row;

fn outcome_to_str(o: ListingOutcome) -> &'static str {
    match o {
        ListingOutcome::StillListed => "still_listed",
        ListingOutcome::Sold => "sold",
        ListingOutcome::Delisted => "delisted",
    }
}

fn outcome_from_str(s: &str) -> ListingOutcome {
    match s {
        "sold" => ListingOutcome::Sold,
        "delisted" => ListingOutcome::Delisted,
        _ => ListingOutcome::StillListed,
    }
}

impl Storage {
    pub async fn insert_hunt_encounter(&self, e: &HuntEncounter) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO hunt_encounters
                (chain_id, wallet, tx_hash, block_number, drop_item, drop_quantity,
                 party_size, avg_luck, avg_level, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (tx_hash, wallet) DO NOTHING
            "#,
        )
        .bind(e.chain_id as i64)
        .bind(e.wallet.as_str())
        .bind(e.tx_hash.as_str())
        .bind(e.block_number)
        .bind(&e.drop_item)
        .bind(e.drop_quantity)
        .bind(e.party_luck.party_size)
        .bind(e.party_luck.avg_luck)
        .bind(e.party_luck.avg_level)
        .bind(e.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn hunt_encounters_for_wallet(&self, wallet: &Address, limit: i64) -> Result<Vec<HuntEncounter>> {
        let rows = sqlx::query(
            "SELECT * FROM hunt_encounters WHERE wallet = $1 ORDER BY block_number DESC LIMIT $2",
        )
        .bind(wallet.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| HuntEncounter {
                chain_id: r.get::<i64, _>("chain_id") as ChainId,
                wallet: Address::from(r.get::<String, _>("wallet")),
                tx_hash: TxHash::new(r.get::<String, _>("tx_hash")),
                block_number: r.get("block_number"),
                drop_item: r.get("drop_item"),
                drop_quantity: r.get("drop_quantity"),
                party_luck: PartyLuckSnapshot {
                    party_size: r.get("party_size"),
                    avg_luck: r.get("avg_luck"),
                    avg_level: r.get("avg_level"),
                },
                timestamp: r.get("timestamp"),
            })
            .collect())
    }

    /// Unique on `(tournament_id, hero_id)` — one placement per hero per
    /// tournament (spec §4.E).
    pub async fn insert_tournament_placement(&self, p: &TournamentPlacement) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO tournament_placements
                (tournament_id, wallet, hero_id, placement, tx_hash, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tournament_id, hero_id) DO NOTHING
            "#,
        )
        .bind(p.tournament_id)
        .bind(p.wallet.as_str())
        .bind(&p.hero_id)
        .bind(p.placement)
        .bind(p.tx_hash.as_str())
        .bind(p.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_hero_tournament_snapshot(&self, s: &HeroTournamentSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hero_tournament_snapshots (tournament_id, hero_id, stats, captured_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tournament_id, hero_id) DO UPDATE SET stats = EXCLUDED.stats, captured_at = EXCLUDED.captured_at
            "#,
        )
        .bind(s.tournament_id)
        .bind(&s.hero_id)
        .bind(&s.stats)
        .bind(s.captured_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn tournament_placements_for_wallet(&self, wallet: &Address) -> Result<Vec<TournamentPlacement>> {
        let rows = sqlx::query("SELECT * FROM tournament_placements WHERE wallet = $1 ORDER BY timestamp DESC")
            .bind(wallet.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| TournamentPlacement {
                tournament_id: r.get("tournament_id"),
                wallet: Address::from(r.get::<String, _>("wallet")),
                hero_id: r.get("hero_id"),
                placement: r.get("placement"),
                tx_hash: TxHash::new(r.get::<String, _>("tx_hash")),
                timestamp: r.get("timestamp"),
            })
            .collect())
    }

    /// Hourly snapshot row (spec §4.E tavern indexer); unique on
    /// `(listing_id, snapshot_hour)`.
    pub async fn upsert_tavern_listing(&self, l: &TavernListing) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tavern_listings (listing_id, seller, asset_id, price, snapshot_hour)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (listing_id, snapshot_hour) DO UPDATE SET price = EXCLUDED.price
            "#,
        )
        .bind(&l.listing_id)
        .bind(l.seller.as_str())
        .bind(&l.asset_id)
        .bind(&l.price)
        .bind(l.snapshot_hour)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn latest_tavern_snapshot_hour(&self, listing_id: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        let row = sqlx::query(
            "SELECT snapshot_hour FROM tavern_listings WHERE listing_id = $1 ORDER BY snapshot_hour DESC LIMIT 1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("snapshot_hour")))
    }

    pub async fn insert_tavern_listing_history(&self, h: &TavernListingHistory) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tavern_listing_history (listing_id, observed_hour, outcome)
            VALUES ($1, $2, $3)
            ON CONFLICT (listing_id, observed_hour) DO UPDATE SET outcome = EXCLUDED.outcome
            "#,
        )
        .bind(&h.listing_id)
        .bind(h.observed_hour)
        .bind(outcome_to_str(h.outcome))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Distinct listings ever posted by `seller` (spec §4.J input: folded
    /// into a `WalletActivity` rollup).
    pub async fn tavern_listings_count_for_seller(&self, seller: &Address) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(DISTINCT listing_id) AS c FROM tavern_listings WHERE seller = $1")
            .bind(seller.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("c"))
    }

    pub async fn tavern_listing_history(&self, listing_id: &str) -> Result<Vec<TavernListingHistory>> {
        let rows = sqlx::query(
            "SELECT * FROM tavern_listing_history WHERE listing_id = $1 ORDER BY observed_hour",
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| TavernListingHistory {
                listing_id: r.get("listing_id"),
                observed_hour: r.get("observed_hour"),
                outcome: outcome_from_str(r.get::<String, _>("outcome").as_str()),
            })
            .collect())
    }

    // --- summon funnel (spec §13) ----------------------------------------

    pub async fn insert_summon_session(&self, s: &SummonSession) -> Result<Option<i64>> {
        let row = sqlx::query(
            r#"
            INSERT INTO summon_sessions (wallet, parent_a, parent_b, tx_hash, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tx_hash) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(s.wallet.as_str())
        .bind(&s.parent_a)
        .bind(&s.parent_b)
        .bind(s.tx_hash.as_str())
        .bind(s.timestamp)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("id")))
    }

    pub async fn insert_summon_offspring(&self, o: &SummonOffspring) -> Result<()> {
        sqlx::query(
            "INSERT INTO summon_offspring (session_id, offspring_id, rarity_tier) VALUES ($1, $2, $3) ON CONFLICT (offspring_id) DO NOTHING",
        )
        .bind(o.session_id)
        .bind(&o.offspring_id)
        .bind(o.rarity_tier)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_summon_sale(&self, outcome: &SummonSaleOutcome) -> Result<()> {
        sqlx::query(
            "UPDATE summon_offspring SET sold_for_usd = $2, sold_at = $3 WHERE offspring_id = $1",
        )
        .bind(&outcome.offspring_id)
        .bind(&outcome.sold_for_usd)
        .bind(outcome.sold_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Aggregated on the fly from `summon_sessions`/`summon_offspring`
    /// (spec §13): no standing rollup table, computed per request.
    pub async fn summon_conversion_metrics(&self, wallet: &Address) -> Result<SummonConversionMetrics> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(DISTINCT s.id) AS sessions,
                COUNT(o.offspring_id) AS offspring_total,
                COUNT(o.offspring_id) FILTER (WHERE o.sold_at IS NOT NULL) AS sold_total,
                COALESCE(SUM(o.sold_for_usd), 0) AS revenue_usd
            FROM summon_sessions s
            LEFT JOIN summon_offspring o ON o.session_id = s.id
            WHERE s.wallet = $1
            "#,
        )
        .bind(wallet.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(SummonConversionMetrics {
            wallet: wallet.clone(),
            sessions: row.get("sessions"),
            offspring_total: row.get("offspring_total"),
            sold_total: row.get("sold_total"),
            revenue_usd: row.get("revenue_usd"),
        })
    }
}
