//! Pure scoring function (spec §4.J, §8: "Classification is deterministic:
//! same inputs → same `{archetype, tier, flags, scores}`"). Everything here
//! is plain arithmetic over already-fetched rollups; no I/O, so the whole
//! module is testable without a database.

use num_traits::ToPrimitive;
use lodestone_types::bridge::WalletBridgeMetrics;
use lodestone_types::classification::{Archetype, ClassificationFlags, ClassificationResult, IntentScores};
use lodestone_types::activity::WalletActivity;
use lodestone_types::player::EngagementState;

/// Threshold ladder over `netExtractedUsd` (spec §4.J: "explicit ladder is
/// in §8", but §8 gives only one data point — $900 net extracted sets the
/// flag). $500 is the chosen floor: below it, a wallet that bridges more
/// out than in is assumed to be cashing out normal play income rather than
/// farming-and-dumping.
const EXTRACTOR_FLAG_THRESHOLD_USD: f64 = 500.0;
/// Net-extracted USD at which the extraction score saturates to 100.
const EXTRACTOR_SCORE_SATURATION_USD: f64 = 1000.0;

/// Raw staked LP units (not USD — the engine has no price graph snapshot
/// of its own, spec §9 open-question decision recorded in `DESIGN.md`)
/// above which a wallet is flagged `whale` regardless of other signals.
const WHALE_STAKE_THRESHOLD_LP: f64 = 5000.0;
const WHALE_BRIDGE_THRESHOLD_USD: f64 = 5000.0;

const HIGH_POTENTIAL_GROWTH_THRESHOLD: f64 = 60.0;

fn to_f64(v: &bigdecimal::BigDecimal) -> f64 {
    v.to_f64().unwrap_or(0.0)
}

/// Folds one player's activity + bridge + conversation signals into a
/// classification result. `message_topic_count` stands in for "recent
/// message topics" (spec §4.J); the Discord chat surface that produces
/// them is an out-of-scope external collaborator (spec §1), so this
/// function takes the count rather than owning any chat storage.
pub fn classify(
    activity: &WalletActivity,
    bridge: &WalletBridgeMetrics,
    message_topic_count: u32,
) -> ClassificationResult {
    let staked_lp = to_f64(&activity.total_staked_lp);
    let net_extracted = to_f64(&bridge.net_extracted_usd);
    let bridged_in = to_f64(&bridge.bridged_in_usd);

    let progression = (activity.tournament_participations as f64 * 12.0)
        + (activity.pools_staked as f64 * 5.0)
        + activity
            .best_tournament_placement
            .map(|p| (20 - p.clamp(0, 20)) as f64 * 2.0)
            .unwrap_or(0.0);

    let investment_growth =
        (staked_lp.min(10_000.0) / 100.0) + (activity.summon_sessions as f64 * 6.0) + (bridged_in.min(2_000.0) / 40.0);

    let investment_extraction = (net_extracted / EXTRACTOR_SCORE_SATURATION_USD) * 100.0;

    let social = message_topic_count as f64 * 5.0;

    let exploration = (activity.hunts_count as f64 * 4.0)
        + (activity.tavern_listings_count as f64 * 3.0)
        + distinct_activity_kinds(activity) as f64 * 8.0;

    let intent_scores = IntentScores {
        progression,
        investment_growth,
        investment_extraction,
        social,
        exploration,
    }
    .clamp_all();

    let intent_archetype = intent_scores.argmax_archetype();

    let extractor = net_extracted >= EXTRACTOR_FLAG_THRESHOLD_USD;
    let whale = staked_lp >= WHALE_STAKE_THRESHOLD_LP || bridged_in >= WHALE_BRIDGE_THRESHOLD_USD;
    let high_potential = !extractor && investment_growth >= HIGH_POTENTIAL_GROWTH_THRESHOLD;

    let flags = ClassificationFlags {
        extractor,
        whale,
        high_potential,
    };

    // The headline `archetype` favors the extractor flag over whatever the
    // argmax would otherwise say, since a wallet actively cashing out is a
    // distinct operational concern worth surfacing even when another
    // dimension scores higher (e.g. a whale who also farms-and-dumps).
    let archetype = if extractor {
        Archetype::Extractor
    } else {
        intent_archetype
    };

    let signal_count = activity.pools_staked
        + activity.hunts_count
        + activity.tournament_participations
        + activity.summon_sessions
        + activity.tavern_listings_count;
    let state = engagement_state(signal_count);
    let tier = state as u8;

    ClassificationResult {
        archetype,
        intent_archetype,
        intent_scores,
        tier,
        state,
        flags,
        behavior_tags: behavior_tags(activity, &flags),
    }
}

fn distinct_activity_kinds(activity: &WalletActivity) -> u32 {
    [
        activity.pools_staked > 0,
        activity.hunts_count > 0,
        activity.tournament_participations > 0,
        activity.summon_sessions > 0,
        activity.tavern_listings_count > 0,
    ]
    .into_iter()
    .filter(|&has_kind| has_kind)
    .count() as u32
}

fn engagement_state(signal_count: i64) -> EngagementState {
    match signal_count {
        0 => EngagementState::Visitor,
        1..=2 => EngagementState::Explorer,
        3..=5 => EngagementState::Participant,
        6..=9 => EngagementState::Player,
        10..=19 => EngagementState::Active,
        _ => EngagementState::Committed,
    }
}

fn behavior_tags(activity: &WalletActivity, flags: &ClassificationFlags) -> Vec<String> {
    let mut tags = Vec::new();
    if activity.pools_staked > 0 {
        tags.push("staker".to_string());
    }
    if activity.tournament_participations > 0 {
        tags.push("tournament_grinder".to_string());
    }
    if activity.hunts_count > 0 {
        tags.push("hunter".to_string());
    }
    if activity.summon_sessions > 0 {
        tags.push("breeder".to_string());
    }
    if activity.tavern_listings_count > 0 {
        tags.push("market_seller".to_string());
    }
    if flags.extractor {
        tags.push("bridge_extractor".to_string());
    }
    if flags.whale {
        tags.push("whale".to_string());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_types::ids::Address;

    fn wallet() -> Address {
        Address::from("0xabc0000000000000000000000000000000000a".to_string())
    }

    #[test]
    fn extractor_classification_matches_spec_example() {
        // spec §8 scenario 5: bridgedIn=$100, bridgedOut=$1000 => netExtracted=$900.
        let activity = WalletActivity::empty(wallet());
        let mut bridge = WalletBridgeMetrics::empty(wallet());
        bridge.bridged_in_usd = "100".parse().unwrap();
        bridge.bridged_out_usd = "1000".parse().unwrap();
        bridge.net_extracted_usd = "900".parse().unwrap();
        bridge.heroes_in = 5;
        bridge.heroes_out = 0;

        let result = classify(&activity, &bridge, 0);

        assert!(result.flags.extractor);
        assert_eq!(result.archetype, Archetype::Extractor);
        assert!(result.intent_scores.investment_extraction >= result.intent_scores.progression);
    }

    #[test]
    fn below_threshold_does_not_flag_extractor() {
        let activity = WalletActivity::empty(wallet());
        let mut bridge = WalletBridgeMetrics::empty(wallet());
        bridge.net_extracted_usd = "200".parse().unwrap();

        let result = classify(&activity, &bridge, 0);
        assert!(!result.flags.extractor);
    }

    #[test]
    fn classification_is_deterministic() {
        let mut activity = WalletActivity::empty(wallet());
        activity.pools_staked = 2;
        activity.total_staked_lp = "1200".parse().unwrap();
        let bridge = WalletBridgeMetrics::empty(wallet());

        let a = classify(&activity, &bridge, 3);
        let b = classify(&activity, &bridge, 3);
        assert_eq!(a.tier, b.tier);
        assert_eq!(a.archetype, b.archetype);
        assert_eq!(a.intent_scores.progression, b.intent_scores.progression);
    }

    #[test]
    fn zero_signals_is_visitor() {
        let activity = WalletActivity::empty(wallet());
        let bridge = WalletBridgeMetrics::empty(wallet());
        let result = classify(&activity, &bridge, 0);
        assert_eq!(result.state, EngagementState::Visitor);
        assert_eq!(result.tier, 0);
    }
}
