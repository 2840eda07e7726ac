//! Router assembly and graceful shutdown: bind, build router, `axum::serve`.

use crate::rate_limit::{self, RateLimiter};
use crate::routes::{admin, analytics, debug, health, user};
use crate::state::AppState;
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn build_router(state: AppState) -> Router {
    let limiter = RateLimiter::new();

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/analytics/overview", get(analytics::overview))
        .route("/api/analytics/players", get(analytics::players))
        .route("/api/analytics/deposits", get(analytics::deposits))
        .route("/api/analytics/query-breakdown", get(analytics::query_breakdown))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/tier", patch(admin::set_tier))
        .route("/api/admin/users/:discord_id", delete(admin::delete_user))
        .route("/api/admin/users/:id/refresh-snapshot", post(admin::refresh_snapshot))
        .route("/api/admin/users/:id/reclassify", post(admin::reclassify))
        .route("/api/user/summary/:discord_id", get(user::summary))
        .route("/api/user/settings/:discord_id", patch(user::update_settings))
        .route("/api/debug/clear-pool-cache", post(debug::clear_pool_cache))
        .route("/api/debug/refresh-pool-cache", post(debug::refresh_pool_cache))
        .route("/api/debug/restart-monitor", post(debug::restart_monitor))
        .route("/api/debug/system-health", get(debug::system_health))
        .layer(middleware::from_fn_with_state(limiter.clone(), rate_limit::enforce))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves until `shutdown` is cancelled, then stops accepting new
/// connections and lets in-flight requests drain (spec §4.L: "the HTTP
/// server stops accepting connections; then the process exits").
pub async fn run(bind_address: &str, state: AppState, shutdown: CancellationToken) -> std::io::Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = bind_address
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
