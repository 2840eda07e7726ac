//! Startup feature probing (spec §9 redesign: the expedition-detection view
//! function may not exist on all contract versions; silent failure is
//! replaced with an explicit probe).

use crate::ids::ChainId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFeature {
    ExpeditionView,
    V1LegacyStaking,
    BridgeV2,
}

/// Per-chain feature availability, populated once at supervisor startup by
/// `ChainClient::probe_features` and consulted by indexers before calling
/// an optional view function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureMap {
    available: HashMap<ChainId, HashMap<ChainFeature, bool>>,
}

impl FeatureMap {
    pub fn set(&mut self, chain_id: ChainId, feature: ChainFeature, available: bool) {
        self.available
            .entry(chain_id)
            .or_default()
            .insert(feature, available);
    }

    pub fn is_available(&self, chain_id: ChainId, feature: ChainFeature) -> bool {
        self.available
            .get(&chain_id)
            .and_then(|m| m.get(&feature))
            .copied()
            .unwrap_or(false)
    }
}
