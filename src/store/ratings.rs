//! Human ratings and AI evaluations
//!
//! Both are upserts: one human rating per (content, user) and one AI
//! evaluation per (content, evaluator model). Validation always runs before
//! the transaction opens, so a rejected input never reaches the table.

use rusqlite::types::Type;
use rusqlite::Error::FromSqlConversionFailure;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{now, Store};
use crate::error::{check_range, Error, Result};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 100;
pub const MIN_SUB_SCORE: i64 = 1;
pub const MAX_SUB_SCORE: i64 = 10;

impl Store {
    /// Insert or update the rating for `(content_history_id, user_id)`.
    /// `None` user ids share one anonymous rating per content item.
    pub fn save_rating(
        &self,
        content_history_id: i64,
        user_id: Option<&str>,
        input: &RatingInput,
    ) -> Result<RatingRow> {
        input.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM content_ratings WHERE content_history_id = ? AND user_id IS ?",
                params![content_history_id, user_id],
                |row| row.get(0),
            )
            .optional()?;

        let timestamp = now();
        let id = match existing {
            Some(id) => {
                tx.execute(
                    r#"UPDATE content_ratings SET
                           overall_rating = ?, instagram_rating = ?, tiktok_rating = ?,
                           youtube_rating = ?, twitter_rating = ?, notes = ?, updated_at = ?
                       WHERE id = ?"#,
                    params![
                        input.overall_rating,
                        input.instagram_rating,
                        input.tiktok_rating,
                        input.youtube_rating,
                        input.twitter_rating,
                        input.notes,
                        timestamp,
                        id,
                    ],
                )?;
                id
            }
            None => tx.query_row(
                r#"INSERT INTO content_ratings
                   (content_history_id, user_id, overall_rating, instagram_rating, tiktok_rating,
                    youtube_rating, twitter_rating, notes, rated_at, updated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                   RETURNING id"#,
                params![
                    content_history_id,
                    user_id,
                    input.overall_rating,
                    input.instagram_rating,
                    input.tiktok_rating,
                    input.youtube_rating,
                    input.twitter_rating,
                    input.notes,
                    timestamp,
                    timestamp,
                ],
                |row| row.get(0),
            )?,
        };
        tx.commit()?;

        self.rating_by_id(id)
    }

    pub fn get_rating(
        &self,
        content_history_id: i64,
        user_id: Option<&str>,
    ) -> Result<Option<RatingRow>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM content_ratings WHERE content_history_id = ? AND user_id IS ?",
                    RATING_ROW_COLUMNS
                ),
                params![content_history_id, user_id],
                rating_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn list_ratings_for_content(&self, content_history_id: i64) -> Result<Vec<RatingRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM content_ratings WHERE content_history_id = ? ORDER BY updated_at DESC",
            RATING_ROW_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![content_history_id], rating_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn rating_by_id(&self, id: i64) -> Result<RatingRow> {
        let row = self.conn.query_row(
            &format!("SELECT {} FROM content_ratings WHERE id = ?", RATING_ROW_COLUMNS),
            params![id],
            rating_from_row,
        )?;
        Ok(row)
    }

    // ============================================
    // AI EVALUATIONS
    // ============================================

    /// Insert or update the evaluation for `(content_history_id, evaluator_model)`.
    /// The overall score is always derived from the four sub-scores.
    pub fn store_ai_evaluation(
        &self,
        content_history_id: i64,
        evaluator_model: &str,
        input: &EvaluationInput,
    ) -> Result<EvaluationRow> {
        input.validate()?;
        if evaluator_model.trim().is_empty() {
            return Err(Error::validation("evaluator_model", "must not be empty"));
        }

        let overall = format!("{:.1}", input.overall_score());
        self.conn.execute(
            r#"INSERT INTO content_evaluations
               (content_history_id, evaluator_model,
                virality_score, virality_justification,
                clarity_score, clarity_justification,
                persuasiveness_score, persuasiveness_justification,
                creativity_score, creativity_justification,
                overall_score, needs_revision, improvement_suggestions, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(content_history_id, evaluator_model) DO UPDATE SET
                   virality_score = excluded.virality_score,
                   virality_justification = excluded.virality_justification,
                   clarity_score = excluded.clarity_score,
                   clarity_justification = excluded.clarity_justification,
                   persuasiveness_score = excluded.persuasiveness_score,
                   persuasiveness_justification = excluded.persuasiveness_justification,
                   creativity_score = excluded.creativity_score,
                   creativity_justification = excluded.creativity_justification,
                   overall_score = excluded.overall_score,
                   needs_revision = excluded.needs_revision,
                   improvement_suggestions = excluded.improvement_suggestions"#,
            params![
                content_history_id,
                evaluator_model,
                input.virality.score,
                input.virality.justification,
                input.clarity.score,
                input.clarity.justification,
                input.persuasiveness.score,
                input.persuasiveness.justification,
                input.creativity.score,
                input.creativity.justification,
                overall,
                input.needs_revision,
                input.improvement_suggestions,
                now(),
            ],
        )?;

        self.get_evaluation(content_history_id, evaluator_model)?
            .ok_or_else(|| Error::NotFound(format!("evaluation for content {}", content_history_id)))
    }

    pub fn get_evaluation(
        &self,
        content_history_id: i64,
        evaluator_model: &str,
    ) -> Result<Option<EvaluationRow>> {
        let row = self
            .conn
            .query_row(
                r#"SELECT id, content_history_id, evaluator_model,
                          virality_score, virality_justification,
                          clarity_score, clarity_justification,
                          persuasiveness_score, persuasiveness_justification,
                          creativity_score, creativity_justification,
                          overall_score, needs_revision, improvement_suggestions, created_at
                   FROM content_evaluations
                   WHERE content_history_id = ? AND evaluator_model = ?"#,
                params![content_history_id, evaluator_model],
                |row| {
                    let overall: String = row.get(11)?;
                    Ok(EvaluationRow {
                        id: row.get(0)?,
                        content_history_id: row.get(1)?,
                        evaluator_model: row.get(2)?,
                        virality: SubScore::new(row.get(3)?, row.get::<_, String>(4)?),
                        clarity: SubScore::new(row.get(5)?, row.get::<_, String>(6)?),
                        persuasiveness: SubScore::new(row.get(7)?, row.get::<_, String>(8)?),
                        creativity: SubScore::new(row.get(9)?, row.get::<_, String>(10)?),
                        overall_score: overall
                            .parse::<f64>()
                            .map_err(|e| FromSqlConversionFailure(11, Type::Text, Box::new(e)))?,
                        needs_revision: row.get(12)?,
                        improvement_suggestions: row.get(13)?,
                        created_at: row.get(14)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

const RATING_ROW_COLUMNS: &str = "id, content_history_id, user_id, overall_rating, instagram_rating, \
     tiktok_rating, youtube_rating, twitter_rating, notes, rated_at, updated_at";

fn rating_from_row(row: &Row) -> rusqlite::Result<RatingRow> {
    Ok(RatingRow {
        id: row.get(0)?,
        content_history_id: row.get(1)?,
        user_id: row.get(2)?,
        overall_rating: row.get(3)?,
        instagram_rating: row.get(4)?,
        tiktok_rating: row.get(5)?,
        youtube_rating: row.get(6)?,
        twitter_rating: row.get(7)?,
        notes: row.get(8)?,
        rated_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

// ============================================
// INPUT & ROW TYPES
// ============================================

/// Fields a user can set when rating content. Every present score must be 1-100.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingInput {
    pub overall_rating: Option<i64>,
    pub instagram_rating: Option<i64>,
    pub tiktok_rating: Option<i64>,
    pub youtube_rating: Option<i64>,
    pub twitter_rating: Option<i64>,
    pub notes: Option<String>,
}

impl RatingInput {
    pub fn validate(&self) -> Result<()> {
        check_range("overall_rating", self.overall_rating, MIN_RATING, MAX_RATING)?;
        check_range("instagram_rating", self.instagram_rating, MIN_RATING, MAX_RATING)?;
        check_range("tiktok_rating", self.tiktok_rating, MIN_RATING, MAX_RATING)?;
        check_range("youtube_rating", self.youtube_rating, MIN_RATING, MAX_RATING)?;
        check_range("twitter_rating", self.twitter_rating, MIN_RATING, MAX_RATING)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRow {
    pub id: i64,
    pub content_history_id: i64,
    pub user_id: Option<String>,
    pub overall_rating: Option<i64>,
    pub instagram_rating: Option<i64>,
    pub tiktok_rating: Option<i64>,
    pub youtube_rating: Option<i64>,
    pub twitter_rating: Option<i64>,
    pub notes: Option<String>,
    pub rated_at: String,
    pub updated_at: String,
}

/// One 1-10 evaluator score with the model's reasoning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub score: i64,
    #[serde(default)]
    pub justification: String,
}

impl SubScore {
    pub fn new(score: i64, justification: impl Into<String>) -> Self {
        Self {
            score,
            justification: justification.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub virality: SubScore,
    pub clarity: SubScore,
    pub persuasiveness: SubScore,
    pub creativity: SubScore,
    #[serde(default)]
    pub needs_revision: bool,
    #[serde(default)]
    pub improvement_suggestions: Option<String>,
}

impl EvaluationInput {
    pub fn validate(&self) -> Result<()> {
        let scores = [
            ("virality", &self.virality),
            ("clarity", &self.clarity),
            ("persuasiveness", &self.persuasiveness),
            ("creativity", &self.creativity),
        ];
        for (field, sub) in scores {
            check_range(field, Some(sub.score), MIN_SUB_SCORE, MAX_SUB_SCORE)?;
        }
        Ok(())
    }

    /// Mean of the four sub-scores, rounded half-up to one decimal
    pub fn overall_score(&self) -> f64 {
        let sum = self.virality.score
            + self.clarity.score
            + self.persuasiveness.score
            + self.creativity.score;
        (sum as f64 / 4.0 * 10.0).round() / 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    pub id: i64,
    pub content_history_id: i64,
    pub evaluator_model: String,
    pub virality: SubScore,
    pub clarity: SubScore,
    pub persuasiveness: SubScore,
    pub creativity: SubScore,
    /// Mean of the four sub-scores, 1-10 scale
    pub overall_score: f64,
    pub needs_revision: bool,
    pub improvement_suggestions: Option<String>,
    pub created_at: String,
}
