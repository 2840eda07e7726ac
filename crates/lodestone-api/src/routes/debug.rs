use crate::debug_handle::DebugCommand;
use crate::error::Result;
use crate::routes::require_admin;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use serde_json::{json, Value};

pub async fn clear_pool_cache(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;
    let sent = state.debug.send(DebugCommand::ClearPoolCache);
    Ok(Json(json!({ "accepted": sent })))
}

pub async fn refresh_pool_cache(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;
    let sent = state.debug.send(DebugCommand::RefreshPoolCache);
    Ok(Json(json!({ "accepted": sent })))
}

pub async fn restart_monitor(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;
    let sent = state.debug.send(DebugCommand::RestartMonitor);
    Ok(Json(json!({ "accepted": sent })))
}

pub async fn system_health(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    require_admin(&headers, &state)?;
    Ok(Json(json!(state.debug.health())))
}
