use crate::error::{ApiError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

/// `GET /api/user/summary/:discordId` (spec §6): archetype, snapshot,
/// optimizations, bridge activity, settings. No auth gate — a player may
/// always read their own summary; the Discord bot is trusted to resolve
/// `discordId` from the caller's own session upstream of this API.
pub async fn summary(State(state): State<AppState>, Path(discord_id): Path<String>) -> Result<Json<Value>> {
    let player = state.db.get_player_by_discord_id(&discord_id).await?.ok_or(ApiError::NotFound)?;

    let classification = state.db.get_classification_result(player.id).await?;
    let optimizations = state.db.garden_optimizations_for_player(player.id, 20).await?;

    let mut bridged_in = bigdecimal::BigDecimal::from(0);
    let mut bridged_out = bigdecimal::BigDecimal::from(0);
    for wallet in &player.wallets {
        if let Some(wb) = state.db.get_wallet_bridge_metrics(wallet).await? {
            bridged_in += wb.bridged_in_usd;
            bridged_out += wb.bridged_out_usd;
        }
    }

    Ok(Json(json!({
        "discordId": player.discord_id,
        "tier": player.tier,
        "state": player.state,
        "wallets": player.wallets,
        "classification": classification,
        "optimizations": optimizations,
        "bridgeActivity": {
            "bridgedInUsd": bridged_in,
            "bridgedOutUsd": bridged_out,
        },
        "settings": player.profile_data,
    })))
}

#[derive(Deserialize, Default)]
pub struct SettingsPatch {
    #[serde(rename = "notifyOnAprDrop", skip_serializing_if = "Option::is_none")]
    notify_on_apr_drop: Option<bool>,
    #[serde(rename = "notifyOnNewOptimization", skip_serializing_if = "Option::is_none")]
    notify_on_new_optimization: Option<bool>,
}

/// `PATCH /api/user/settings/:discordId` (spec §6): body subset of
/// `{notifyOnAprDrop, notifyOnNewOptimization}`.
pub async fn update_settings(
    State(state): State<AppState>,
    Path(discord_id): Path<String>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Value>> {
    let mut body = serde_json::Map::new();
    if let Some(v) = patch.notify_on_apr_drop {
        body.insert("notify_on_apr_drop".to_string(), json!(v));
    }
    if let Some(v) = patch.notify_on_new_optimization {
        body.insert("notify_on_new_optimization".to_string(), json!(v));
    }

    state.db.update_player_settings(&discord_id, serde_json::Value::Object(body)).await?;
    Ok(Json(json!({ "updated": true })))
}
