use crate::error::{ApiError, Result};
use crate::routes::require_admin;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use futures::stream::{self, StreamExt};
use lodestone_players::engine::run_classification;
use lodestone_types::bridge::WalletBridgeMetrics;
use lodestone_types::classification::ReclassifyTrigger;
use lodestone_types::ids::Address;
use lodestone_types::player::Tier;
use serde::Deserialize;
use serde_json::{json, Value};

const ENRICH_CONCURRENCY: usize = 8;

/// `GET /api/admin/users` (spec §6): enriched user list with batched
/// rollups (classification + balance), fetched with bounded concurrency
/// rather than serially.
pub async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;

    let players = state.db.list_players(200, 0).await?;
    let enriched: Vec<Value> = stream::iter(players)
        .map(|player| {
            let db = state.db.clone();
            async move {
                let classification = db.get_classification_result(player.id).await.ok().flatten();
                let balance = db.get_jewel_balance(player.id).await.ok();
                json!({
                    "id": player.id,
                    "discordId": player.discord_id,
                    "tier": player.tier,
                    "state": player.state,
                    "flags": player.flags,
                    "jewelBalance": balance,
                    "classification": classification,
                })
            }
        })
        .buffer_unordered(ENRICH_CONCURRENCY)
        .collect()
        .await;

    Ok(Json(json!({ "count": enriched.len(), "users": enriched })))
}

#[derive(Deserialize)]
pub struct TierBody {
    tier: String,
}

/// `PATCH /api/admin/users/:id/tier` (spec §6).
pub async fn set_tier(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<TierBody>,
) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;
    let tier = Tier::from_str_loose(&body.tier).ok_or_else(|| ApiError::BadRequest(format!("unknown tier {}", body.tier)))?;
    state.db.set_player_tier(id, tier).await?;
    Ok(Json(json!({ "id": id, "tier": tier })))
}

/// `DELETE /api/admin/users/:discordId` (spec §6): cascades balance then
/// player.
pub async fn delete_user(State(state): State<AppState>, headers: HeaderMap, Path(discord_id): Path<String>) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;
    state.db.delete_player_cascade(&discord_id).await?;
    Ok(Json(json!({ "deleted": discord_id })))
}

/// `POST /api/admin/users/:id/refresh-snapshot` (spec §6): a read-only
/// preview of a player's current cross-wallet activity/bridge totals,
/// recomputed live without persisting — distinct from `reclassify`, which
/// persists a new scored result.
pub async fn refresh_snapshot(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<i64>) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;
    let player = state.db.get_player(id).await?.ok_or(ApiError::NotFound)?;

    let mut activity = lodestone_types::activity::WalletActivity::empty(placeholder(&player.wallets));
    let mut bridge = WalletBridgeMetrics::empty(placeholder(&player.wallets));
    for wallet in &player.wallets {
        activity = activity.merge(state.db.wallet_activity(wallet).await?);
        if let Some(wb) = state.db.get_wallet_bridge_metrics(wallet).await? {
            bridge.bridged_in_usd += wb.bridged_in_usd;
            bridge.bridged_out_usd += wb.bridged_out_usd;
            bridge.net_extracted_usd += wb.net_extracted_usd;
            bridge.heroes_in += wb.heroes_in;
            bridge.heroes_out += wb.heroes_out;
        }
    }

    Ok(Json(json!({ "activity": activity, "bridge": bridge })))
}

/// `POST /api/admin/users/:id/reclassify` (spec §6): forces an immediate,
/// persisted reclassification run outside the nightly schedule.
pub async fn reclassify(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<i64>) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;
    let result = run_classification(&state.db, id, 0, ReclassifyTrigger::OperatorRequest).await.map_err(|e| match e {
        lodestone_players::PlayersError::PlayerNotFound(_) => ApiError::NotFound,
        other => ApiError::BadRequest(other.to_string()),
    })?;
    Ok(Json(json!(result)))
}

fn placeholder(wallets: &[Address]) -> Address {
    wallets.first().cloned().unwrap_or_else(|| Address::from(String::new()))
}
