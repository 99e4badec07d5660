//! SQLite schema definition
//!
//! - content_history is written by the generation pipeline; only read here
//! - one rating per (content, user), NULL user = shared anonymous bucket
//! - one AI evaluation per (content, evaluator model)
//! - content_patterns are derived rows, replaced per group key on each run

pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- ============================================
-- CONTENT HISTORY
-- ============================================

CREATE TABLE IF NOT EXISTS content_history (
    id INTEGER PRIMARY KEY,
    user_id TEXT,
    niche TEXT NOT NULL,                   -- 'skincare', 'tech', ...
    tone TEXT NOT NULL,                    -- free-form: 'friendly', 'professional', ...
    content_type TEXT NOT NULL,            -- 'caption', 'seo_blog', ...
    product_name TEXT NOT NULL,
    prompt_text TEXT,
    hook TEXT,
    output_text TEXT NOT NULL,
    model_used TEXT,
    created_at DATETIME NOT NULL
);

-- ============================================
-- RATINGS
-- ============================================

-- Human ratings, 1-100
CREATE TABLE IF NOT EXISTS content_ratings (
    id INTEGER PRIMARY KEY,
    content_history_id INTEGER NOT NULL,
    user_id TEXT,                          -- NULL = anonymous/global rating
    overall_rating INTEGER,
    instagram_rating INTEGER,
    tiktok_rating INTEGER,
    youtube_rating INTEGER,
    twitter_rating INTEGER,
    notes TEXT,
    rated_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL,
    FOREIGN KEY(content_history_id) REFERENCES content_history(id) ON DELETE CASCADE
);

-- AI evaluator ratings, sub-scores 1-10
CREATE TABLE IF NOT EXISTS content_evaluations (
    id INTEGER PRIMARY KEY,
    content_history_id INTEGER NOT NULL,
    evaluator_model TEXT NOT NULL,
    virality_score INTEGER NOT NULL,
    virality_justification TEXT NOT NULL DEFAULT '',
    clarity_score INTEGER NOT NULL,
    clarity_justification TEXT NOT NULL DEFAULT '',
    persuasiveness_score INTEGER NOT NULL,
    persuasiveness_justification TEXT NOT NULL DEFAULT '',
    creativity_score INTEGER NOT NULL,
    creativity_justification TEXT NOT NULL DEFAULT '',
    overall_score TEXT NOT NULL,           -- mean of the four, one decimal
    needs_revision BOOLEAN DEFAULT FALSE,
    improvement_suggestions TEXT,
    created_at DATETIME NOT NULL,
    UNIQUE(content_history_id, evaluator_model),
    FOREIGN KEY(content_history_id) REFERENCES content_history(id) ON DELETE CASCADE
);

-- ============================================
-- LEARNED PATTERNS
-- ============================================

CREATE TABLE IF NOT EXISTS content_patterns (
    id TEXT PRIMARY KEY,                   -- UUID
    pattern_name TEXT NOT NULL,
    niche TEXT NOT NULL,
    template_type TEXT NOT NULL,
    tone TEXT NOT NULL,
    platform TEXT NOT NULL DEFAULT 'all',
    average_rating REAL NOT NULL,
    sample_count INTEGER NOT NULL,
    confidence REAL NOT NULL,              -- 0.0 to 1.0
    average_word_count INTEGER NOT NULL,
    common_phrases TEXT NOT NULL,          -- JSON array
    emotional_tone TEXT,
    hook_type TEXT,
    call_to_action_style TEXT,
    best_performing_elements TEXT,         -- JSON object
    avoidance_patterns TEXT,               -- JSON array, reserved
    is_active BOOLEAN DEFAULT TRUE,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL,
    UNIQUE(niche, template_type, tone, platform)
);

-- Append-only record of a pattern being applied to generated content
CREATE TABLE IF NOT EXISTS pattern_applications (
    id INTEGER PRIMARY KEY,
    pattern_id TEXT NOT NULL,
    content_history_id INTEGER NOT NULL,
    application_strength REAL NOT NULL,    -- 0.0 to 1.0
    modified_attributes TEXT NOT NULL,     -- JSON array
    applied_at DATETIME NOT NULL,
    FOREIGN KEY(pattern_id) REFERENCES content_patterns(id) ON DELETE CASCADE,
    FOREIGN KEY(content_history_id) REFERENCES content_history(id) ON DELETE CASCADE
);

-- ============================================
-- PREFERENCES
-- ============================================

CREATE TABLE IF NOT EXISTS user_content_preferences (
    user_id TEXT PRIMARY KEY,
    use_smart_learning BOOLEAN NOT NULL DEFAULT TRUE,
    learning_intensity TEXT NOT NULL DEFAULT 'moderate',
    min_overall_rating INTEGER NOT NULL DEFAULT 70,
    min_platform_rating INTEGER NOT NULL DEFAULT 65,
    personalized_weights TEXT,             -- opaque JSON
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL
);

-- ============================================
-- INDEXES
-- ============================================

-- NULL user ids collapse into one anonymous bucket
CREATE UNIQUE INDEX IF NOT EXISTS idx_ratings_content_user
    ON content_ratings(content_history_id, IFNULL(user_id, ''));
CREATE INDEX IF NOT EXISTS idx_ratings_overall ON content_ratings(overall_rating DESC);
CREATE INDEX IF NOT EXISTS idx_ratings_user ON content_ratings(user_id);

CREATE INDEX IF NOT EXISTS idx_evaluations_content ON content_evaluations(content_history_id);

CREATE INDEX IF NOT EXISTS idx_history_niche ON content_history(niche);
CREATE INDEX IF NOT EXISTS idx_history_created ON content_history(created_at DESC);

CREATE INDEX IF NOT EXISTS idx_patterns_niche ON content_patterns(niche);
CREATE INDEX IF NOT EXISTS idx_applications_pattern ON pattern_applications(pattern_id);
"#;
