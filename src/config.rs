//! Process configuration, read from the environment (spec §6). Required
//! secrets are a hard exit at startup — a misconfigured deployment should
//! fail loudly before it ever opens a socket, not later with a confusing
//! runtime error.

use lodestone_types::chain::ChainEndpoint;
use lodestone_types::ids::Address;
use std::env;

fn require(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        eprintln!("FATAL: {key} environment variable is not set. Refusing to start.");
        std::process::exit(1);
    })
}

fn optional_addr(key: &str) -> Option<Address> {
    env::var(key).ok().filter(|s| !s.is_empty()).map(Address::new)
}

fn optional_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Everything the supervisor needs beyond what `lodestone_api::ApiConfig`
/// already owns (`SESSION_SECRET`, `ADMIN_DISCORD_IDS`, `API_BIND_ADDRESS`).
/// Discord/OAuth pass-through vars (`DISCORD_TOKEN`, `OPENAI_API_KEY`, ...)
/// are recognized by spec §6 for a companion bot process that is out of
/// this binary's scope (SPEC_FULL.md Non-goals) — they are deliberately
/// not read here.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub chain: ChainEndpoint,

    /// MasterGardener-style staking contract. Absent means the stake/
    /// swap/reward/pool-discovery fleet members simply don't start —
    /// a chain with no configured staking contract runs the rest of the
    /// fleet (bridge, hunt, tournament, marketplace, deposit watch) fine.
    pub staking_contract: Option<Address>,
    pub bridge_contract: Option<Address>,
    pub hunt_contract: Option<Address>,
    pub tournament_contract: Option<Address>,

    /// The token watched for inbound player deposits, and the platform
    /// wallet those deposits land in (spec §4.H, §4.L "transaction-monitor").
    pub deposit_token_contract: Option<Address>,
    pub deposit_address: Option<Address>,

    /// Anchor token for the USD price graph (spec §4.C), typically the
    /// chain's bridged stablecoin.
    pub price_anchor_token: Address,

    /// Base URL of the game's own backend, queried for hunt/tournament/
    /// marketplace companion data the on-chain event doesn't carry
    /// (spec §4.E hunt/tournament/marketplace bullets).
    pub game_api_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = require("DATABASE_URL");
        let rpc_http = require("RPC_HTTP_URL");

        let chain = ChainEndpoint {
            chain_id: optional_u64("CHAIN_ID", 1),
            name: env::var("CHAIN_NAME").unwrap_or_else(|_| "primary".to_string()),
            rpc_http,
            rpc_ws: env::var("RPC_WS_URL").ok().filter(|s| !s.is_empty()),
            chunk_size: optional_u64("CHUNK_SIZE", ChainEndpoint::DEFAULT_CHUNK_SIZE),
            confirmations: optional_u64("CONFIRMATIONS", 5),
        };

        let price_anchor_token = optional_addr("PRICE_ANCHOR_TOKEN")
            .unwrap_or_else(|| {
                eprintln!("FATAL: PRICE_ANCHOR_TOKEN environment variable is not set. Refusing to start.");
                std::process::exit(1);
            });

        Self {
            database_url,
            chain,
            staking_contract: optional_addr("STAKING_CONTRACT_ADDRESS"),
            bridge_contract: optional_addr("BRIDGE_CONTRACT_ADDRESS"),
            hunt_contract: optional_addr("HUNT_CONTRACT_ADDRESS"),
            tournament_contract: optional_addr("TOURNAMENT_CONTRACT_ADDRESS"),
            deposit_token_contract: optional_addr("DEPOSIT_TOKEN_CONTRACT_ADDRESS"),
            deposit_address: optional_addr("DEPOSIT_ADDRESS"),
            price_anchor_token,
            game_api_base_url: env::var("GAME_API_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string()),
        }
    }
}
