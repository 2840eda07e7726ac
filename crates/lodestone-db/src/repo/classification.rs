//! Persists the classification engine's output (spec §4.J). The `players`
//! row keeps the lightweight `state`/`flags` columns the rest of the store
//! already reads; this table is the full, auditable result (scores,
//! archetype, tie-broken intent archetype, trigger) kept one row per
//! player, last-write-wins.

use crate::error::Result;
use crate::storage::Storage;
use chrono::Utc;
use lodestone_types::classification::{
    Archetype, ClassificationFlags, ClassificationResult, IntentScores, ReclassifyTrigger,
};
use lodestone_types::player::EngagementState;
use sqlx::Row;

fn archetype_to_str(a: Archetype) -> &'static str {
    match a {
        Archetype::Progression => "progression",
        Archetype::GrowthInvestor => "growth_investor",
        Archetype::Extractor => "extractor",
        Archetype::Social => "social",
        Archetype::Exploration => "exploration",
    }
}

fn archetype_from_str(s: &str) -> Archetype {
    match s {
        "growth_investor" => Archetype::GrowthInvestor,
        "extractor" => Archetype::Extractor,
        "social" => Archetype::Social,
        "exploration" => Archetype::Exploration,
        _ => Archetype::Progression,
    }
}

fn state_to_str(s: EngagementState) -> &'static str {
    match s {
        EngagementState::Visitor => "visitor",
        EngagementState::Explorer => "explorer",
        EngagementState::Participant => "participant",
        EngagementState::Player => "player",
        EngagementState::Active => "active",
        EngagementState::Committed => "committed",
    }
}

fn state_from_str(s: &str) -> EngagementState {
    match s {
        "explorer" => EngagementState::Explorer,
        "participant" => EngagementState::Participant,
        "player" => EngagementState::Player,
        "active" => EngagementState::Active,
        "committed" => EngagementState::Committed,
        _ => EngagementState::Visitor,
    }
}

impl Storage {
    /// Writes the full result row and mirrors `state`/`flags` onto the
    /// `players` table so existing readers of those columns stay current.
    pub async fn upsert_classification_result(
        &self,
        player_id: i64,
        result: &ClassificationResult,
        trigger: ReclassifyTrigger,
    ) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO classification_results
                (player_id, archetype, intent_archetype, intent_scores, tier, state, flags,
                 behavior_tags, classified_at, trigger_kind)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (player_id) DO UPDATE SET
                archetype = EXCLUDED.archetype,
                intent_archetype = EXCLUDED.intent_archetype,
                intent_scores = EXCLUDED.intent_scores,
                tier = EXCLUDED.tier,
                state = EXCLUDED.state,
                flags = EXCLUDED.flags,
                behavior_tags = EXCLUDED.behavior_tags,
                classified_at = EXCLUDED.classified_at,
                trigger_kind = EXCLUDED.trigger_kind
            "#,
        )
        .bind(player_id)
        .bind(archetype_to_str(result.archetype))
        .bind(archetype_to_str(result.intent_archetype))
        .bind(serde_json::to_value(result.intent_scores).expect("IntentScores always serializes"))
        .bind(result.tier as i16)
        .bind(state_to_str(result.state))
        .bind(serde_json::to_value(&result.flags).expect("ClassificationFlags always serializes"))
        .bind(&result.behavior_tags)
        .bind(now)
        .bind(trigger.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE players SET state = $2, flags = $3, updated_at = $4 WHERE id = $1")
            .bind(player_id)
            .bind(state_to_str(result.state))
            .bind(classification_flag_list(&result.flags))
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_classification_result(&self, player_id: i64) -> Result<Option<ClassificationResult>> {
        let row = sqlx::query("SELECT * FROM classification_results WHERE player_id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| {
            let intent_scores_json: serde_json::Value = r.get("intent_scores");
            let intent_scores: IntentScores = serde_json::from_value(intent_scores_json).unwrap_or_default();
            let flags_json: serde_json::Value = r.get("flags");
            let flags: ClassificationFlags = serde_json::from_value(flags_json).unwrap_or(ClassificationFlags {
                extractor: false,
                whale: false,
                high_potential: false,
            });
            ClassificationResult {
                archetype: archetype_from_str(r.get::<String, _>("archetype").as_str()),
                intent_archetype: archetype_from_str(r.get::<String, _>("intent_archetype").as_str()),
                intent_scores,
                tier: r.get::<i16, _>("tier") as u8,
                state: state_from_str(r.get::<String, _>("state").as_str()),
                flags,
                behavior_tags: r.get("behavior_tags"),
            }
        }))
    }

    pub async fn classified_before(&self, cutoff: chrono::DateTime<Utc>, limit: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT player_id FROM classification_results WHERE classified_at < $1 ORDER BY classified_at LIMIT $2",
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("player_id")).collect())
    }

    /// Players with no `classification_results` row at all — never swept by
    /// [`Storage::classified_before`], which only matches existing rows.
    pub async fn never_classified(&self, limit: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id FROM players p
            LEFT JOIN classification_results c ON c.player_id = p.id
            WHERE c.player_id IS NULL
            ORDER BY p.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("id")).collect())
    }
}

fn classification_flag_list(flags: &ClassificationFlags) -> Vec<String> {
    let mut out = Vec::new();
    if flags.extractor {
        out.push("extractor".to_string());
    }
    if flags.whale {
        out.push("whale".to_string());
    }
    if flags.high_potential {
        out.push("high_potential".to_string());
    }
    out
}
