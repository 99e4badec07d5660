//! Per-user learning preferences

use rusqlite::types::Type;
use rusqlite::Error::FromSqlConversionFailure;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{now, Store};
use crate::error::{check_range, Error, Result};
use crate::model::LearningIntensity;

pub const DEFAULT_MIN_OVERALL_RATING: i64 = 70;
pub const DEFAULT_MIN_PLATFORM_RATING: i64 = 65;

impl Store {
    /// Preferences for `user_id`, without creating a row
    pub fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM user_content_preferences WHERE user_id = ?",
                    PREFERENCE_COLUMNS
                ),
                params![user_id],
                preferences_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Preferences for `user_id`, inserting the defaults on first access.
    /// The primary key plus `ON CONFLICT DO NOTHING` keeps concurrent first
    /// calls down to a single row.
    pub fn get_or_create_preferences(&self, user_id: &str) -> Result<UserPreferences> {
        if user_id.trim().is_empty() {
            return Err(Error::validation("user_id", "must not be empty"));
        }

        let timestamp = now();
        self.conn.execute(
            r#"INSERT INTO user_content_preferences
               (user_id, use_smart_learning, learning_intensity, min_overall_rating,
                min_platform_rating, personalized_weights, created_at, updated_at)
               VALUES (?, TRUE, ?, ?, ?, NULL, ?, ?)
               ON CONFLICT(user_id) DO NOTHING"#,
            params![
                user_id,
                LearningIntensity::default().as_str(),
                DEFAULT_MIN_OVERALL_RATING,
                DEFAULT_MIN_PLATFORM_RATING,
                timestamp,
                timestamp,
            ],
        )?;

        self.get_preferences(user_id)?
            .ok_or_else(|| Error::NotFound(format!("preferences for {}", user_id)))
    }

    /// Apply the present fields of `patch` and stamp `updated_at`
    pub fn update_preferences(
        &self,
        user_id: &str,
        patch: &PreferencesPatch,
    ) -> Result<UserPreferences> {
        patch.validate()?;
        let current = self.get_or_create_preferences(user_id)?;

        let weights = match &patch.personalized_weights {
            Some(w) => Some(serde_json::to_string(w)?),
            None => current
                .personalized_weights
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        };

        self.conn.execute(
            r#"UPDATE user_content_preferences SET
                   use_smart_learning = ?, learning_intensity = ?, min_overall_rating = ?,
                   min_platform_rating = ?, personalized_weights = ?, updated_at = ?
               WHERE user_id = ?"#,
            params![
                patch.use_smart_learning.unwrap_or(current.use_smart_learning),
                patch
                    .learning_intensity
                    .unwrap_or(current.learning_intensity)
                    .as_str(),
                patch.min_overall_rating.unwrap_or(current.min_overall_rating),
                patch.min_platform_rating.unwrap_or(current.min_platform_rating),
                weights,
                now(),
                user_id,
            ],
        )?;

        self.get_preferences(user_id)?
            .ok_or_else(|| Error::NotFound(format!("preferences for {}", user_id)))
    }
}

const PREFERENCE_COLUMNS: &str = "user_id, use_smart_learning, learning_intensity, \
     min_overall_rating, min_platform_rating, personalized_weights, created_at, updated_at";

fn preferences_from_row(row: &Row) -> rusqlite::Result<UserPreferences> {
    let intensity: String = row.get(2)?;
    let weights: Option<String> = row.get(5)?;

    Ok(UserPreferences {
        user_id: row.get(0)?,
        use_smart_learning: row.get(1)?,
        learning_intensity: intensity
            .parse::<LearningIntensity>()
            .map_err(|e| FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        min_overall_rating: row.get(3)?,
        min_platform_rating: row.get(4)?,
        personalized_weights: weights
            .map(|w| serde_json::from_str::<serde_json::Value>(&w))
            .transpose()
            .map_err(|e| FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Stored learning preferences for one user.
///
/// Recommendations only consult `use_smart_learning`. The intensity, the two
/// rating floors and the weights are persisted and validated for callers that
/// build their own selection on top; the recommendation thresholds (69 / 6.9
/// and 85 / 8.5) are fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPreferences {
    pub user_id: String,
    pub use_smart_learning: bool,
    /// Stored only
    pub learning_intensity: LearningIntensity,
    /// Stored only
    pub min_overall_rating: i64,
    /// Stored only
    pub min_platform_rating: i64,
    /// Stored only, free-form JSON
    pub personalized_weights: Option<serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesPatch {
    pub use_smart_learning: Option<bool>,
    pub learning_intensity: Option<LearningIntensity>,
    pub min_overall_rating: Option<i64>,
    pub min_platform_rating: Option<i64>,
    pub personalized_weights: Option<serde_json::Value>,
}

impl PreferencesPatch {
    pub fn validate(&self) -> Result<()> {
        check_range("min_overall_rating", self.min_overall_rating, 1, 100)?;
        check_range("min_platform_rating", self.min_platform_rating, 1, 100)?;
        Ok(())
    }
}
