//! Config loaded from environment (spec §6 "CLI / environment variables").
//! Missing required secrets are a hard exit at startup, not a runtime error.

use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub session_secret: Vec<u8>,
    pub admin_discord_ids: HashSet<String>,
    pub bind_address: String,
}

impl ApiConfig {
    /// Reads the subset of spec §6's env vars this crate needs directly.
    /// `SESSION_SECRET` is required whenever OAuth/cookie auth is enabled,
    /// which this API always assumes (admin routes are cookie-gated).
    pub fn from_env() -> Result<Self, String> {
        let session_secret = std::env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET is required".to_string())?
            .into_bytes();
        if session_secret.is_empty() {
            return Err("SESSION_SECRET must not be empty".to_string());
        }

        let admin_discord_ids = std::env::var("ADMIN_DISCORD_IDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let bind_address = std::env::var("API_BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        Ok(Self {
            session_secret,
            admin_discord_ids,
            bind_address,
        })
    }
}
