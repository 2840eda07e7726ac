//! Lodestone telemetry/analytics engine entry point (spec §4.L).

mod config;
mod supervisor;

use config::AppConfig;
use supervisor::Supervisor;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lodestone=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting lodestone supervisor");

    let config = AppConfig::from_env();
    info!(chain = %config.chain.name, rpc = %config.chain.rpc_http, "configuration loaded");

    let supervisor = Supervisor::new(config).await?;
    supervisor.run().await
}
