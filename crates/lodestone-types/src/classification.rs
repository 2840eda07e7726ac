//! Classification & scoring output shapes (spec §4.J).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Progression,
    GrowthInvestor,
    Extractor,
    Social,
    Exploration,
}

impl Archetype {
    /// Tie-break preference order from spec §4.J.
    pub const TIE_BREAK_ORDER: [Archetype; 5] = [
        Archetype::Progression,
        Archetype::GrowthInvestor,
        Archetype::Extractor,
        Archetype::Social,
        Archetype::Exploration,
    ];
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IntentScores {
    pub progression: f64,
    pub investment_growth: f64,
    pub investment_extraction: f64,
    pub social: f64,
    pub exploration: f64,
}

impl IntentScores {
    /// Scores are additive and clamped to `[0, 100]` (spec §4.J).
    pub fn clamp_all(mut self) -> Self {
        self.progression = self.progression.clamp(0.0, 100.0);
        self.investment_growth = self.investment_growth.clamp(0.0, 100.0);
        self.investment_extraction = self.investment_extraction.clamp(0.0, 100.0);
        self.social = self.social.clamp(0.0, 100.0);
        self.exploration = self.exploration.clamp(0.0, 100.0);
        self
    }

    fn dimension(&self, a: Archetype) -> f64 {
        match a {
            Archetype::Progression => self.progression,
            Archetype::GrowthInvestor => self.investment_growth,
            Archetype::Extractor => self.investment_extraction,
            Archetype::Social => self.social,
            Archetype::Exploration => self.exploration,
        }
    }

    /// Argmax over dimensions with the tie-break preference list from spec
    /// §4.J: `progression > growth > extraction > social > exploration`.
    pub fn argmax_archetype(&self) -> Archetype {
        let mut best = Archetype::TIE_BREAK_ORDER[0];
        let mut best_score = self.dimension(best);
        for &candidate in &Archetype::TIE_BREAK_ORDER[1..] {
            let score = self.dimension(candidate);
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }
        best
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationFlags {
    pub extractor: bool,
    pub whale: bool,
    pub high_potential: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub archetype: Archetype,
    pub intent_archetype: Archetype,
    pub intent_scores: IntentScores,
    pub tier: u8,
    pub state: crate::player::EngagementState,
    pub flags: ClassificationFlags,
    pub behavior_tags: Vec<String>,
}

/// Why a (re)classification run fired (spec §4.J: "new bridge-metric
/// rollup; operator request; nightly schedule").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclassifyTrigger {
    NewBridgeRollup,
    OperatorRequest,
    NightlySchedule,
}

impl ReclassifyTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReclassifyTrigger::NewBridgeRollup => "new_bridge_rollup",
            ReclassifyTrigger::OperatorRequest => "operator_request",
            ReclassifyTrigger::NightlySchedule => "nightly_schedule",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_progression_on_tie() {
        let scores = IntentScores {
            progression: 50.0,
            investment_growth: 50.0,
            investment_extraction: 50.0,
            social: 50.0,
            exploration: 50.0,
        };
        assert_eq!(scores.argmax_archetype(), Archetype::Progression);
    }

    #[test]
    fn argmax_prefers_extraction_over_social_on_tie() {
        let scores = IntentScores {
            progression: 10.0,
            investment_growth: 10.0,
            investment_extraction: 70.0,
            social: 70.0,
            exploration: 10.0,
        };
        assert_eq!(scores.argmax_archetype(), Archetype::Extractor);
    }

    #[test]
    fn clamp_bounds_scores() {
        let scores = IntentScores {
            progression: 150.0,
            investment_growth: -10.0,
            ..Default::default()
        }
        .clamp_all();
        assert_eq!(scores.progression, 100.0);
        assert_eq!(scores.investment_growth, 0.0);
    }
}
