//! Orchestrates one classification run (spec §4.J): gathers the
//! `WalletActivity` and `WalletBridgeMetrics` rollups for every wallet in
//! the player's cluster, folds them into one pair of inputs, scores them
//! with [`crate::scoring::classify`], and persists the result. Scoring
//! itself is pure; this module is the I/O shell around it.

use crate::error::{PlayersError, Result};
use crate::scoring::classify;
use lodestone_db::Storage;
use lodestone_types::activity::WalletActivity;
use lodestone_types::bridge::WalletBridgeMetrics;
use lodestone_types::classification::{ClassificationResult, ReclassifyTrigger};
use lodestone_types::ids::Address;
use tracing::info;

/// Runs one classification cycle for `player_id` and persists the result
/// (spec §4.J reclassification triggers: new bridge-metric rollup,
/// operator request, nightly schedule — `trigger` records which one).
/// `message_topic_count` is supplied by the caller since the conversation
/// surface that produces it is out of scope here (spec §1).
pub async fn run_classification(
    db: &Storage,
    player_id: i64,
    message_topic_count: u32,
    trigger: ReclassifyTrigger,
) -> Result<ClassificationResult> {
    let player = db
        .get_player(player_id)
        .await?
        .ok_or(PlayersError::PlayerNotFound(player_id))?;

    let mut activity = WalletActivity::empty(primary_or_placeholder(&player.wallets));
    let mut bridge = WalletBridgeMetrics::empty(primary_or_placeholder(&player.wallets));
    let mut per_wallet_bridge = Vec::new();

    for wallet in &player.wallets {
        let wallet_activity = db.wallet_activity(wallet).await?;
        activity = activity.merge(wallet_activity);

        if let Some(wallet_bridge) = db.get_wallet_bridge_metrics(wallet).await? {
            bridge = merge_bridge_metrics(bridge, wallet_bridge.clone());
            per_wallet_bridge.push(wallet_bridge);
        }
    }

    let result = classify(&activity, &bridge, message_topic_count);
    let extractor_flags: Vec<String> = result
        .behavior_tags
        .iter()
        .filter(|t| t.starts_with("bridge_"))
        .cloned()
        .collect();

    // Write the freshly-computed extractor score/flags back onto each
    // wallet's own bridge-metrics row, so the indexer's next rebuild (which
    // preserves these two fields verbatim) carries the classification
    // forward instead of stale zeros. The per-wallet rows, not the merged
    // `bridge` total, are the ones with real identity in the store.
    for mut wallet_bridge in per_wallet_bridge {
        wallet_bridge.extractor_score = result.intent_scores.investment_extraction;
        wallet_bridge.extractor_flags = extractor_flags.clone();
        db.upsert_wallet_bridge_metrics(&wallet_bridge).await?;
    }

    db.upsert_classification_result(player_id, &result, trigger).await?;
    info!(player_id, archetype = ?result.archetype, tier = result.tier, ?trigger, "player reclassified");

    Ok(result)
}

fn primary_or_placeholder(wallets: &[Address]) -> Address {
    wallets.first().cloned().unwrap_or_else(|| Address::from(String::new()))
}

fn merge_bridge_metrics(mut a: WalletBridgeMetrics, b: WalletBridgeMetrics) -> WalletBridgeMetrics {
    a.bridged_in_usd += b.bridged_in_usd;
    a.bridged_out_usd += b.bridged_out_usd;
    a.net_extracted_usd += b.net_extracted_usd;
    a.heroes_in += b.heroes_in;
    a.heroes_out += b.heroes_out;
    a.last_processed_block = a.last_processed_block.max(b.last_processed_block);
    for (token, amount) in b.by_token_in {
        *a.by_token_in.entry(token).or_insert_with(|| bigdecimal::BigDecimal::from(0)) += amount;
    }
    for (token, amount) in b.by_token_out {
        *a.by_token_out.entry(token).or_insert_with(|| bigdecimal::BigDecimal::from(0)) += amount;
    }
    a
}
