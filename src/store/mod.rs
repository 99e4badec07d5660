//! SQLite-backed store for generated content, ratings, patterns and preferences
//!
//! The store is split by concern:
//! - `mod.rs`: connection lifecycle, content history, rated-content queries
//! - `ratings.rs`: human ratings and AI evaluations (upserts + validation)
//! - `patterns.rs`: derived content patterns and their applications
//! - `preferences.rs`: per-user learning preferences

mod patterns;
mod preferences;
mod ratings;
mod schema;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::model::{Niche, Platform, TemplateType};

pub use patterns::{PatternApplicationRow, PatternRow};
pub use preferences::{PreferencesPatch, UserPreferences};
pub use ratings::{EvaluationInput, EvaluationRow, RatingInput, RatingRow, SubScore};
pub use schema::SCHEMA;

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ============================================
    // CONTENT HISTORY
    // ============================================

    /// Record a generated piece of content and return its id
    pub fn record_content(&self, content: &NewContent) -> Result<i64> {
        let id = self.conn.query_row(
            r#"INSERT INTO content_history
               (user_id, niche, tone, content_type, product_name, prompt_text, hook,
                output_text, model_used, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING id"#,
            params![
                content.user_id,
                content.niche.as_str(),
                content.tone,
                content.content_type.as_str(),
                content.product_name,
                content.prompt_text,
                content.hook,
                content.output_text,
                content.model_used,
                now(),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_content(&self, id: i64) -> Result<Option<ContentRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM content_history h WHERE h.id = ?", CONTENT_COLUMNS),
                params![id],
                |row| content_from_row(row),
            )
            .optional()?;
        Ok(row)
    }

    // ============================================
    // RATED CONTENT QUERIES
    // ============================================

    /// Every (content, rating) pair at or above `min_rating`, best and newest first.
    /// Ratings without an overall score never qualify.
    pub fn rated_content(&self, min_rating: i64) -> Result<Vec<RatedContent>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT {}, {}
               FROM content_ratings r
               JOIN content_history h ON h.id = r.content_history_id
               WHERE r.overall_rating >= ?1
               ORDER BY r.overall_rating DESC, h.created_at DESC, h.id DESC"#,
            CONTENT_COLUMNS, RATING_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![min_rating], rated_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("[Store] {} rated items at or above {}", rows.len(), min_rating);
        Ok(rows)
    }

    /// Content rated by `filter.user_id` at or above `min_rating`
    pub fn user_rated_content(
        &self,
        filter: &ContentFilter,
        min_rating: i64,
        limit: usize,
    ) -> Result<Vec<RatedContent>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT {}, {}
               FROM content_ratings r
               JOIN content_history h ON h.id = r.content_history_id
               WHERE r.overall_rating >= ?1
                 AND r.user_id = ?2
                 AND (?3 IS NULL OR h.niche = ?3)
                 AND (?4 IS NULL OR h.content_type = ?4)
                 AND (?5 IS NULL OR h.tone = ?5)
               ORDER BY r.overall_rating DESC, h.created_at DESC, h.id DESC
               LIMIT ?6"#,
            CONTENT_COLUMNS, RATING_COLUMNS
        ))?;

        let rows = stmt
            .query_map(
                params![
                    min_rating,
                    filter.user_id,
                    filter.niche.map(|n| n.as_str()),
                    filter.template_type.map(|t| t.as_str()),
                    filter.tone,
                    limit as i64,
                ],
                rated_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// AI-evaluated content owned by `filter.user_id` with an overall score
    /// (1-10 scale) at or above `min_score`
    pub fn ai_rated_content(
        &self,
        filter: &ContentFilter,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<EvaluatedContent>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT {}, CAST(e.overall_score AS REAL), e.evaluator_model
               FROM content_evaluations e
               JOIN content_history h ON h.id = e.content_history_id
               WHERE CAST(e.overall_score AS REAL) >= ?1
                 AND h.user_id = ?2
                 AND (?3 IS NULL OR h.niche = ?3)
                 AND (?4 IS NULL OR h.content_type = ?4)
                 AND (?5 IS NULL OR h.tone = ?5)
               ORDER BY CAST(e.overall_score AS REAL) DESC, h.created_at DESC, h.id DESC
               LIMIT ?6"#,
            CONTENT_COLUMNS
        ))?;

        let rows = stmt
            .query_map(
                params![
                    min_score,
                    filter.user_id,
                    filter.niche.map(|n| n.as_str()),
                    filter.template_type.map(|t| t.as_str()),
                    filter.tone,
                    limit as i64,
                ],
                |row| {
                    Ok(EvaluatedContent {
                        content: content_from_row(row)?,
                        overall_score: row.get(CONTENT_COLUMN_COUNT)?,
                        evaluator_model: row.get(CONTENT_COLUMN_COUNT + 1)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

pub(crate) fn now() -> String {
    Utc::now().to_rfc3339()
}

const CONTENT_COLUMNS: &str = "h.id, h.user_id, h.niche, h.tone, h.content_type, h.product_name, \
     h.prompt_text, h.hook, h.output_text, h.model_used, h.created_at";
const CONTENT_COLUMN_COUNT: usize = 11;

const RATING_COLUMNS: &str =
    "r.overall_rating, r.instagram_rating, r.tiktok_rating, r.youtube_rating, r.twitter_rating";

fn content_from_row(row: &Row) -> rusqlite::Result<ContentRow> {
    Ok(ContentRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        niche: row.get(2)?,
        tone: row.get(3)?,
        content_type: row.get(4)?,
        product_name: row.get(5)?,
        prompt_text: row.get(6)?,
        hook: row.get(7)?,
        output_text: row.get(8)?,
        model_used: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn rated_from_row(row: &Row) -> rusqlite::Result<RatedContent> {
    let base = CONTENT_COLUMN_COUNT;
    Ok(RatedContent {
        content: content_from_row(row)?,
        overall_rating: row.get(base)?,
        platform_ratings: PlatformRatings {
            instagram: row.get(base + 1)?,
            tiktok: row.get(base + 2)?,
            youtube: row.get(base + 3)?,
            twitter: row.get(base + 4)?,
        },
    })
}

// ============================================
// ROW TYPES
// ============================================

/// A generated piece of content as handed over by the generation pipeline
#[derive(Debug, Clone)]
pub struct NewContent {
    pub user_id: Option<String>,
    pub niche: Niche,
    pub tone: String,
    pub content_type: TemplateType,
    pub product_name: String,
    pub prompt_text: Option<String>,
    pub hook: Option<String>,
    pub output_text: String,
    pub model_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentRow {
    pub id: i64,
    pub user_id: Option<String>,
    pub niche: String,
    pub tone: String,
    pub content_type: String,
    pub product_name: String,
    pub prompt_text: Option<String>,
    pub hook: Option<String>,
    pub output_text: String,
    pub model_used: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformRatings {
    pub instagram: Option<i64>,
    pub tiktok: Option<i64>,
    pub youtube: Option<i64>,
    pub twitter: Option<i64>,
}

impl PlatformRatings {
    pub fn get(&self, platform: Platform) -> Option<i64> {
        match platform {
            Platform::Instagram => self.instagram,
            Platform::Tiktok => self.tiktok,
            Platform::Youtube => self.youtube,
            Platform::Twitter => self.twitter,
        }
    }
}

/// Content joined with one human rating
#[derive(Debug, Clone)]
pub struct RatedContent {
    pub content: ContentRow,
    pub overall_rating: i64,
    pub platform_ratings: PlatformRatings,
}

/// Content joined with one AI evaluation
#[derive(Debug, Clone)]
pub struct EvaluatedContent {
    pub content: ContentRow,
    /// 1-10 scale
    pub overall_score: f64,
    pub evaluator_model: String,
}

/// Filters shared by the user-rated and AI-rated queries
#[derive(Debug, Clone, Copy)]
pub struct ContentFilter<'a> {
    pub user_id: &'a str,
    pub niche: Option<Niche>,
    pub template_type: Option<TemplateType>,
    pub tone: Option<&'a str>,
}
