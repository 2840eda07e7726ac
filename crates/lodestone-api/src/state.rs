use crate::config::ApiConfig;
use crate::debug_handle::DebugHandle;
use lodestone_db::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Storage>,
    pub config: Arc<ApiConfig>,
    pub debug: DebugHandle,
}

impl AppState {
    pub fn is_admin(&self, discord_id: &str) -> bool {
        self.config.admin_discord_ids.contains(discord_id)
    }
}
