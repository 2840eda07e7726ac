//! Billed LLM call ledger and its query-type histogram (spec §6
//! `query_costs` table, `GET /api/analytics/query-breakdown`).

use crate::error::Result;
use crate::storage::Storage;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use lodestone_types::billing::QueryTypeBreakdown;
use sqlx::Row;

impl Storage {
    pub async fn record_query_cost(&self, query_type: &str, cost_usd: &BigDecimal) -> Result<()> {
        sqlx::query("INSERT INTO query_costs (query_type, cost_usd) VALUES ($1, $2)")
            .bind(query_type)
            .bind(cost_usd)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn query_cost_breakdown(&self, since: DateTime<Utc>) -> Result<Vec<QueryTypeBreakdown>> {
        let rows = sqlx::query(
            r#"
            SELECT query_type, COUNT(*) AS cnt, COALESCE(SUM(cost_usd), 0) AS total
            FROM query_costs
            WHERE created_at >= $1
            GROUP BY query_type
            ORDER BY total DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| QueryTypeBreakdown {
                query_type: r.get("query_type"),
                count: r.get("cnt"),
                total_cost_usd: r.get("total"),
            })
            .collect())
    }
}
