use crate::error::Result;
use crate::routes::require_admin;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// `GET /api/analytics/overview` (spec §6): admin-gated counts and USD
/// totals.
pub async fn overview(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;

    let total_players = state.db.player_count().await?;
    let total_jewel_balance = state.db.total_jewel_balance().await?;
    let total_pools = state.db.list_pools().await?.len();
    let recent_deposits = state.db.recent_deposits(1000).await?;
    let completed_deposits = recent_deposits
        .iter()
        .filter(|d| d.status == lodestone_types::billing::DepositStatus::Completed)
        .count();

    Ok(Json(json!({
        "totalPlayers": total_players,
        "totalJewelBalance": total_jewel_balance,
        "totalPools": total_pools,
        "completedDeposits": completed_deposits,
    })))
}

#[derive(Deserialize)]
pub struct PageParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

fn sanitize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

/// `GET /api/analytics/players?limit&offset` (spec §6).
pub async fn players(State(state): State<AppState>, Query(params): Query<PageParams>) -> Result<Json<Value>> {
    let limit = sanitize_limit(params.limit);
    let offset = params.offset.unwrap_or(0).max(0);
    let players = state.db.list_players(limit, offset).await?;
    Ok(Json(json!({ "count": players.len(), "players": players })))
}

#[derive(Deserialize)]
pub struct LimitParam {
    limit: Option<i64>,
}

/// `GET /api/analytics/deposits?limit` (spec §6).
pub async fn deposits(State(state): State<AppState>, Query(params): Query<LimitParam>) -> Result<Json<Value>> {
    let limit = sanitize_limit(params.limit);
    let deposits = state.db.recent_deposits(limit).await?;
    Ok(Json(json!({ "count": deposits.len(), "deposits": deposits })))
}

/// `GET /api/analytics/query-breakdown` (spec §6): query-type histogram
/// over the trailing 30 days.
pub async fn query_breakdown(State(state): State<AppState>) -> Result<Json<Value>> {
    let since = Utc::now() - Duration::days(30);
    let breakdown = state.db.query_cost_breakdown(since).await?;
    Ok(Json(json!({ "since": since, "breakdown": breakdown })))
}
