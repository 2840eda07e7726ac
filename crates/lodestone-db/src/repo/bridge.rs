//! Bridge events, wallet bridge metrics, unpriced-token catalog (spec §3,
//! §4.E bridge indexer).

use crate::error::Result;
use crate::storage::Storage;
use lodestone_types::bridge::{
    BridgeAssetKind, BridgeDirection, BridgeEvent, PricingStatus, UnpricedToken, WalletBridgeMetrics,
};
use lodestone_types::ids::{Address, TxHash};
use sqlx::Row;
use std::collections::HashMap;

fn kind_to_str(k: BridgeAssetKind) -> &'static str {
    match k {
        BridgeAssetKind::Item => "item",
        BridgeAssetKind::Hero => "hero",
        BridgeAssetKind::Equipment => "equipment",
        BridgeAssetKind::Pet => "pet",
    }
}

fn kind_from_str(s: &str) -> BridgeAssetKind {
    match s {
        "hero" => BridgeAssetKind::Hero,
        "equipment" => BridgeAssetKind::Equipment,
        "pet" => BridgeAssetKind::Pet,
        _ => BridgeAssetKind::Item,
    }
}

fn dir_to_str(d: BridgeDirection) -> &'static str {
    match d {
        BridgeDirection::In => "in",
        BridgeDirection::Out => "out",
    }
}

fn dir_from_str(s: &str) -> BridgeDirection {
    if s == "out" {
        BridgeDirection::Out
    } else {
        BridgeDirection::In
    }
}

fn status_to_str(s: PricingStatus) -> &'static str {
    match s {
        PricingStatus::Unpriced => "unpriced",
        PricingStatus::HistoricalOnly => "historical_only",
        PricingStatus::DexDerived => "dex_derived",
        PricingStatus::Resolved => "resolved",
    }
}

fn status_from_str(s: &str) -> PricingStatus {
    match s {
        "historical_only" => PricingStatus::HistoricalOnly,
        "dex_derived" => PricingStatus::DexDerived,
        "resolved" => PricingStatus::Resolved,
        _ => PricingStatus::Unpriced,
    }
}

impl Storage {
    /// Unique on `(tx_hash, wallet, bridge_type)` (spec §3).
    pub async fn insert_bridge_event(&self, event: &BridgeEvent) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO bridge_events
                (wallet, bridge_type, direction, token, amount, asset_id, usd_value,
                 src_chain_id, dst_chain_id, tx_hash, block_number, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (tx_hash, wallet, bridge_type) DO NOTHING
            "#,
        )
        .bind(event.wallet.as_str())
        .bind(kind_to_str(event.bridge_type))
        .bind(dir_to_str(event.direction))
        .bind(event.token.as_ref().map(|t| t.as_str().to_string()))
        .bind(&event.amount)
        .bind(&event.asset_id)
        .bind(&event.usd_value)
        .bind(event.src_chain_id as i64)
        .bind(event.dst_chain_id as i64)
        .bind(event.tx_hash.as_str())
        .bind(event.block_number)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn bridge_events_for_wallet(&self, wallet: &Address, since_block: i64) -> Result<Vec<BridgeEvent>> {
        let rows = sqlx::query(
            "SELECT * FROM bridge_events WHERE wallet = $1 AND block_number > $2 ORDER BY block_number",
        )
        .bind(wallet.as_str())
        .bind(since_block)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| BridgeEvent {
                wallet: Address::from(r.get::<String, _>("wallet")),
                bridge_type: kind_from_str(r.get::<String, _>("bridge_type").as_str()),
                direction: dir_from_str(r.get::<String, _>("direction").as_str()),
                token: r.get::<Option<String>, _>("token").map(Address::from),
                amount: r.get("amount"),
                asset_id: r.get("asset_id"),
                usd_value: r.get("usd_value"),
                src_chain_id: r.get::<i64, _>("src_chain_id") as u64,
                dst_chain_id: r.get::<i64, _>("dst_chain_id") as u64,
                tx_hash: TxHash::new(r.get::<String, _>("tx_hash")),
                block_number: r.get("block_number"),
                timestamp: r.get("timestamp"),
            })
            .collect())
    }

    /// Idempotent rollup rebuild (spec §3): recomputed from all bridge
    /// events for the wallet, then upserted wholesale.
    pub async fn upsert_wallet_bridge_metrics(&self, metrics: &WalletBridgeMetrics) -> Result<()> {
        let by_in = serde_json::to_value(&metrics.by_token_in).unwrap_or_default();
        let by_out = serde_json::to_value(&metrics.by_token_out).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO wallet_bridge_metrics
                (wallet, bridged_in_usd, bridged_out_usd, net_extracted_usd, by_token_in, by_token_out,
                 heroes_in, heroes_out, last_processed_block, extractor_score, extractor_flags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (wallet) DO UPDATE SET
                bridged_in_usd = EXCLUDED.bridged_in_usd,
                bridged_out_usd = EXCLUDED.bridged_out_usd,
                net_extracted_usd = EXCLUDED.net_extracted_usd,
                by_token_in = EXCLUDED.by_token_in,
                by_token_out = EXCLUDED.by_token_out,
                heroes_in = EXCLUDED.heroes_in,
                heroes_out = EXCLUDED.heroes_out,
                last_processed_block = EXCLUDED.last_processed_block,
                extractor_score = EXCLUDED.extractor_score,
                extractor_flags = EXCLUDED.extractor_flags
            "#,
        )
        .bind(metrics.wallet.as_str())
        .bind(&metrics.bridged_in_usd)
        .bind(&metrics.bridged_out_usd)
        .bind(&metrics.net_extracted_usd)
        .bind(by_in)
        .bind(by_out)
        .bind(metrics.heroes_in)
        .bind(metrics.heroes_out)
        .bind(metrics.last_processed_block)
        .bind(metrics.extractor_score)
        .bind(&metrics.extractor_flags)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_wallet_bridge_metrics(&self, wallet: &Address) -> Result<Option<WalletBridgeMetrics>> {
        let row = sqlx::query("SELECT * FROM wallet_bridge_metrics WHERE wallet = $1")
            .bind(wallet.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| WalletBridgeMetrics {
            wallet: Address::from(r.get::<String, _>("wallet")),
            bridged_in_usd: r.get("bridged_in_usd"),
            bridged_out_usd: r.get("bridged_out_usd"),
            net_extracted_usd: r.get("net_extracted_usd"),
            by_token_in: serde_json::from_value(r.get("by_token_in")).unwrap_or_else(|_| HashMap::new()),
            by_token_out: serde_json::from_value(r.get("by_token_out")).unwrap_or_else(|_| HashMap::new()),
            heroes_in: r.get("heroes_in"),
            heroes_out: r.get("heroes_out"),
            last_processed_block: r.get("last_processed_block"),
            extractor_score: r.get("extractor_score"),
            extractor_flags: r.get("extractor_flags"),
        }))
    }

    /// Historical-price cache consulted before falling back to the live
    /// DEX-derived price graph (spec §4.E bridge indexer bullet).
    pub async fn get_historical_price(
        &self,
        token: &Address,
        chain_id: u64,
        date: chrono::NaiveDate,
    ) -> Result<Option<bigdecimal::BigDecimal>> {
        let row = sqlx::query("SELECT usd_price FROM historical_prices WHERE token = $1 AND chain_id = $2 AND date = $3")
            .bind(token.as_str())
            .bind(chain_id as i64)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("usd_price")))
    }

    pub async fn upsert_historical_price(
        &self,
        token: &Address,
        chain_id: u64,
        date: chrono::NaiveDate,
        usd_price: &bigdecimal::BigDecimal,
        source: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO historical_prices (token, chain_id, date, usd_price, source)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (token, chain_id, date) DO UPDATE SET usd_price = EXCLUDED.usd_price, source = EXCLUDED.source
            "#,
        )
        .bind(token.as_str())
        .bind(chain_id as i64)
        .bind(date)
        .bind(usd_price)
        .bind(source)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_unpriced_token(&self, token: &UnpricedToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO unpriced_tokens (address, chain_id, first_seen_block, status, last_checked_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (address, chain_id) DO UPDATE SET
                status = EXCLUDED.status,
                last_checked_at = EXCLUDED.last_checked_at
            "#,
        )
        .bind(token.address.as_str())
        .bind(token.chain_id as i64)
        .bind(token.first_seen_block)
        .bind(status_to_str(token.status))
        .bind(token.last_checked_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
