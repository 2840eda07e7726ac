use axum::response::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// `GET /api/health` (spec §6): always 200.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}
