//! Derived content patterns and pattern applications

use rusqlite::types::Type;
use rusqlite::Error::FromSqlConversionFailure;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{now, Store};
use crate::error::{Error, Result};
use crate::learning::{ContentPattern, PatternSink};
use crate::model::Niche;

impl PatternSink for Store {
    /// Overwrite by group key: a pattern replaces whatever was stored for the
    /// same (niche, template_type, tone, platform), keeping its id.
    fn save_patterns(&self, patterns: &[ContentPattern]) -> Result<Vec<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let timestamp = now();
            let id: String = tx.query_row(
                r#"INSERT INTO content_patterns
                   (id, pattern_name, niche, template_type, tone, platform, average_rating,
                    sample_count, confidence, average_word_count, common_phrases, emotional_tone,
                    hook_type, call_to_action_style, best_performing_elements, avoidance_patterns,
                    is_active, created_at, updated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, TRUE, ?, ?)
                   ON CONFLICT(niche, template_type, tone, platform) DO UPDATE SET
                       pattern_name = excluded.pattern_name,
                       average_rating = excluded.average_rating,
                       sample_count = excluded.sample_count,
                       confidence = excluded.confidence,
                       average_word_count = excluded.average_word_count,
                       common_phrases = excluded.common_phrases,
                       emotional_tone = excluded.emotional_tone,
                       hook_type = excluded.hook_type,
                       call_to_action_style = excluded.call_to_action_style,
                       best_performing_elements = excluded.best_performing_elements,
                       avoidance_patterns = excluded.avoidance_patterns,
                       is_active = TRUE,
                       updated_at = excluded.updated_at
                   RETURNING id"#,
                params![
                    Uuid::new_v4().to_string(),
                    pattern.pattern_name,
                    pattern.niche,
                    pattern.template_type,
                    pattern.tone,
                    pattern.platform,
                    pattern.average_rating,
                    pattern.sample_count as i64,
                    pattern.confidence,
                    pattern.average_word_count as i64,
                    serde_json::to_string(&pattern.common_phrases)?,
                    pattern.emotional_tone.as_str(),
                    pattern.hook_type.as_str(),
                    pattern.call_to_action_style.as_str(),
                    serde_json::to_string(&pattern.best_performing_elements)?,
                    serde_json::to_string(&pattern.avoidance_patterns)?,
                    timestamp,
                    timestamp,
                ],
                |row| row.get(0),
            )?;
            ids.push(id);
        }

        tx.commit()?;
        info!("[PatternStore] Saved {} patterns", ids.len());
        Ok(ids)
    }
}

impl Store {
    pub fn list_patterns(&self, niche: Option<Niche>, active_only: bool) -> Result<Vec<PatternRow>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT {} FROM content_patterns
               WHERE (?1 IS NULL OR niche = ?1) AND (?2 = 0 OR is_active)
               ORDER BY average_rating DESC, sample_count DESC"#,
            PATTERN_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![niche.map(|n| n.as_str()), active_only], pattern_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_pattern(&self, id: &str) -> Result<Option<PatternRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM content_patterns WHERE id = ?", PATTERN_COLUMNS),
                params![id],
                pattern_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn deactivate_pattern(&self, id: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE content_patterns SET is_active = FALSE, updated_at = ? WHERE id = ?",
            params![now(), id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("pattern {}", id)));
        }
        Ok(())
    }

    // ============================================
    // PATTERN APPLICATIONS
    // ============================================

    /// Append a record of `pattern_id` being applied to a content item
    pub fn record_pattern_application(
        &self,
        pattern_id: &str,
        content_history_id: i64,
        application_strength: f64,
        modified_attributes: &[String],
    ) -> Result<i64> {
        if !(0.0..=1.0).contains(&application_strength) {
            return Err(Error::validation(
                "application_strength",
                format!("must be between 0 and 1, got {}", application_strength),
            ));
        }
        if self.get_pattern(pattern_id)?.is_none() {
            return Err(Error::NotFound(format!("pattern {}", pattern_id)));
        }

        let id = self.conn.query_row(
            r#"INSERT INTO pattern_applications
               (pattern_id, content_history_id, application_strength, modified_attributes, applied_at)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id"#,
            params![
                pattern_id,
                content_history_id,
                application_strength,
                serde_json::to_string(modified_attributes)?,
                now(),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn list_pattern_applications(&self, pattern_id: &str) -> Result<Vec<PatternApplicationRow>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT id, pattern_id, content_history_id, application_strength,
                      modified_attributes, applied_at
               FROM pattern_applications
               WHERE pattern_id = ?
               ORDER BY id"#,
        )?;
        let rows = stmt
            .query_map(params![pattern_id], |row| {
                let attributes: String = row.get(4)?;
                Ok(PatternApplicationRow {
                    id: row.get(0)?,
                    pattern_id: row.get(1)?,
                    content_history_id: row.get(2)?,
                    application_strength: row.get(3)?,
                    modified_attributes: serde_json::from_str(&attributes)
                        .map_err(|e| FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
                    applied_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

const PATTERN_COLUMNS: &str = "id, pattern_name, niche, template_type, tone, platform, average_rating, \
     sample_count, confidence, average_word_count, common_phrases, emotional_tone, hook_type, \
     call_to_action_style, best_performing_elements, is_active, created_at, updated_at";

fn pattern_from_row(row: &Row) -> rusqlite::Result<PatternRow> {
    let phrases: String = row.get(10)?;
    let elements: Option<String> = row.get(14)?;
    Ok(PatternRow {
        id: row.get(0)?,
        pattern_name: row.get(1)?,
        niche: row.get(2)?,
        template_type: row.get(3)?,
        tone: row.get(4)?,
        platform: row.get(5)?,
        average_rating: row.get(6)?,
        sample_count: row.get(7)?,
        confidence: row.get(8)?,
        average_word_count: row.get(9)?,
        common_phrases: serde_json::from_str(&phrases)
            .map_err(|e| FromSqlConversionFailure(10, Type::Text, Box::new(e)))?,
        emotional_tone: row.get(11)?,
        hook_type: row.get(12)?,
        call_to_action_style: row.get(13)?,
        best_performing_elements: elements
            .map(|e| serde_json::from_str::<serde_json::Value>(&e))
            .transpose()
            .map_err(|e| FromSqlConversionFailure(14, Type::Text, Box::new(e)))?
            .unwrap_or(serde_json::Value::Null),
        is_active: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

// ============================================
// ROW TYPES
// ============================================

#[derive(Debug, Clone, Serialize)]
pub struct PatternRow {
    pub id: String,
    pub pattern_name: String,
    pub niche: String,
    pub template_type: String,
    pub tone: String,
    pub platform: String,
    pub average_rating: f64,
    pub sample_count: i64,
    pub confidence: f64,
    pub average_word_count: i64,
    pub common_phrases: Vec<String>,
    pub emotional_tone: Option<String>,
    pub hook_type: Option<String>,
    pub call_to_action_style: Option<String>,
    pub best_performing_elements: serde_json::Value,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternApplicationRow {
    pub id: i64,
    pub pattern_id: String,
    pub content_history_id: i64,
    pub application_strength: f64,
    pub modified_attributes: Vec<String>,
    pub applied_at: String,
}
