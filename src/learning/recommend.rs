//! Style recommendations from a user's best-rated content
//!
//! Human ratings (1-100) and AI evaluations (1-10) are normalized onto one
//! 0-100 scale before they are merged, so a 7.0 evaluation and a 70 rating
//! carry the same weight.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::analyzer::analyze;
use super::{ranked_by_frequency, unique};
use crate::error::Result;
use crate::model::{Niche, Platform, TemplateType};
use crate::store::{ContentFilter, ContentRow, EvaluatedContent, PlatformRatings, RatedContent, Store};

pub const USER_RATING_THRESHOLD: i64 = 69;
pub const AI_SCORE_THRESHOLD: f64 = 6.9;
pub const STYLE_USER_RATING_THRESHOLD: i64 = 85;
pub const STYLE_AI_SCORE_THRESHOLD: f64 = 8.5;

const SOURCE_LIMIT: usize = 15;
const MERGED_LIMIT: usize = 10;
const BEST_CONTENT_COUNT: usize = 3;
const TOP_HASHTAG_COUNT: usize = 5;
const EXAMPLE_CAPTION_CHARS: usize = 200;

pub const NO_DATA_RECOMMENDATION: &str =
    "Not enough rated content yet. Generate more content and rate it to unlock personalized recommendations.";

lazy_static! {
    static ref HASHTAG: Regex = Regex::new(r"#\w+").expect("hashtag pattern is valid");
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationQuery<'a> {
    pub user_id: &'a str,
    pub niche: Niche,
    pub template_type: Option<TemplateType>,
    pub tone: Option<&'a str>,
    pub platform: Option<Platform>,
}

impl<'a> RecommendationQuery<'a> {
    fn filter(&self) -> ContentFilter<'a> {
        ContentFilter {
            user_id: self.user_id,
            niche: Some(self.niche),
            template_type: self.template_type,
            tone: self.tone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingSource {
    UserRatings,
    AiEvaluations,
}

impl RatingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingSource::UserRatings => "user_ratings",
            RatingSource::AiEvaluations => "ai_evaluations",
        }
    }
}

/// One content item with its rating on the common 0-100 scale
#[derive(Debug, Clone)]
pub struct ScoredContent {
    pub content: ContentRow,
    pub normalized_rating: f64,
    pub source: RatingSource,
    /// Only human ratings carry per-platform scores
    pub platform_ratings: PlatformRatings,
}

impl From<RatedContent> for ScoredContent {
    fn from(item: RatedContent) -> Self {
        Self {
            content: item.content,
            normalized_rating: item.overall_rating as f64,
            source: RatingSource::UserRatings,
            platform_ratings: item.platform_ratings,
        }
    }
}

impl From<EvaluatedContent> for ScoredContent {
    fn from(item: EvaluatedContent) -> Self {
        Self {
            content: item.content,
            normalized_rating: item.overall_score * 10.0,
            source: RatingSource::AiEvaluations,
            platform_ratings: PlatformRatings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformAverage {
    pub platform: Platform,
    pub source: RatingSource,
    pub average_rating: i64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleStats {
    pub common_tones: Vec<String>,
    pub successful_templates: Vec<String>,
    pub average_rating: i64,
    pub best_content: Vec<String>,
    pub top_performing_structures: Vec<String>,
    pub platform_averages: Vec<PlatformAverage>,
    pub user_rated_samples: usize,
    pub ai_evaluated_samples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub recommendation: String,
    pub stats: StyleStats,
}

/// Condensed style hints for feeding straight into prompt construction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleGuide {
    pub dominant_tone: Option<String>,
    pub dominant_structure: Option<String>,
    pub top_hashtags: Vec<String>,
    pub example_caption: String,
    pub sample_count: usize,
}

/// Recommend a style for `query`, or `None` when nothing qualifies
pub fn recommend(store: &Store, query: &RecommendationQuery) -> Result<Option<Recommendation>> {
    if !smart_learning_enabled(store, query.user_id)? {
        return Ok(None);
    }

    let merged = merged_top_content(store, query, USER_RATING_THRESHOLD, AI_SCORE_THRESHOLD)?;
    if merged.is_empty() {
        return Ok(None);
    }

    let stats = style_stats(&merged, query.platform);
    let recommendation = describe(&stats);
    Ok(Some(Recommendation {
        recommendation,
        stats,
    }))
}

/// Like [`recommend`] at stricter thresholds (85 / 8.5), reduced to the single
/// most common tone and structure, the top hashtags and one example caption
pub fn top_rated_content_for_style(
    store: &Store,
    query: &RecommendationQuery,
) -> Result<Option<StyleGuide>> {
    if !smart_learning_enabled(store, query.user_id)? {
        return Ok(None);
    }

    let merged = merged_top_content(
        store,
        query,
        STYLE_USER_RATING_THRESHOLD,
        STYLE_AI_SCORE_THRESHOLD,
    )?;
    let Some(best) = merged.first() else {
        return Ok(None);
    };

    let dominant_tone = ranked_by_frequency(merged.iter().map(|m| m.content.tone.clone()))
        .into_iter()
        .next()
        .map(|(tone, _)| tone);

    let dominant_structure = ranked_by_frequency(merged.iter().map(|m| {
        analyze(&m.content.output_text, m.content.hook.as_deref()).structure()
    }))
    .into_iter()
    .next()
    .map(|(structure, _)| structure);

    let top_hashtags = ranked_by_frequency(
        merged
            .iter()
            .flat_map(|m| HASHTAG.find_iter(&m.content.output_text))
            .map(|tag| tag.as_str().to_string()),
    )
    .into_iter()
    .take(TOP_HASHTAG_COUNT)
    .map(|(tag, _)| tag)
    .collect();

    Ok(Some(StyleGuide {
        dominant_tone,
        dominant_structure,
        top_hashtags,
        example_caption: truncate(&best.content.output_text, EXAMPLE_CAPTION_CHARS),
        sample_count: merged.len(),
    }))
}

fn smart_learning_enabled(store: &Store, user_id: &str) -> Result<bool> {
    let enabled = store
        .get_preferences(user_id)?
        .map_or(true, |p| p.use_smart_learning);
    if !enabled {
        debug!("[Recommendation] Smart learning disabled for {}", user_id);
    }
    Ok(enabled)
}

fn merged_top_content(
    store: &Store,
    query: &RecommendationQuery,
    min_rating: i64,
    min_score: f64,
) -> Result<Vec<ScoredContent>> {
    let filter = query.filter();
    let user_rated = store.user_rated_content(&filter, min_rating, SOURCE_LIMIT)?;
    let ai_rated = store.ai_rated_content(&filter, min_score, SOURCE_LIMIT)?;
    debug!(
        "[Recommendation] {} user-rated, {} AI-evaluated candidates for {}/{}",
        user_rated.len(),
        ai_rated.len(),
        query.user_id,
        query.niche
    );

    Ok(merge_sources(
        user_rated.into_iter().map(ScoredContent::from),
        ai_rated.into_iter().map(ScoredContent::from),
        MERGED_LIMIT,
    ))
}

/// Merge both sources, keep the higher rating when a content item appears
/// twice, then sort descending. Equal ratings keep user ratings first.
pub fn merge_sources(
    user_rated: impl IntoIterator<Item = ScoredContent>,
    ai_rated: impl IntoIterator<Item = ScoredContent>,
    limit: usize,
) -> Vec<ScoredContent> {
    let mut merged: Vec<ScoredContent> = vec![];
    let mut index: HashMap<i64, usize> = HashMap::new();

    for item in user_rated.into_iter().chain(ai_rated) {
        match index.get(&item.content.id) {
            Some(&i) => {
                if item.normalized_rating > merged[i].normalized_rating {
                    merged[i] = item;
                }
            }
            None => {
                index.insert(item.content.id, merged.len());
                merged.push(item);
            }
        }
    }

    merged.sort_by(|a, b| b.normalized_rating.total_cmp(&a.normalized_rating));
    merged.truncate(limit);
    merged
}

fn style_stats(merged: &[ScoredContent], platform: Option<Platform>) -> StyleStats {
    let user_rated: Vec<&ScoredContent> = merged
        .iter()
        .filter(|m| m.source == RatingSource::UserRatings)
        .collect();
    let ai_rated: Vec<&ScoredContent> = merged
        .iter()
        .filter(|m| m.source == RatingSource::AiEvaluations)
        .collect();

    let average_rating =
        (merged.iter().map(|m| m.normalized_rating).sum::<f64>() / merged.len() as f64).round() as i64;

    let mut platform_averages = vec![];
    if let Some(platform) = platform {
        let scores: Vec<f64> = user_rated
            .iter()
            .filter_map(|m| m.platform_ratings.get(platform))
            .map(|r| r as f64)
            .collect();
        if let Some(avg) = platform_average(platform, RatingSource::UserRatings, &scores) {
            platform_averages.push(avg);
        }

        let scores: Vec<f64> = ai_rated.iter().map(|m| m.normalized_rating).collect();
        if let Some(avg) = platform_average(platform, RatingSource::AiEvaluations, &scores) {
            platform_averages.push(avg);
        }
    }

    StyleStats {
        common_tones: unique(merged.iter().map(|m| m.content.tone.clone())),
        successful_templates: unique(merged.iter().map(|m| m.content.content_type.clone())),
        average_rating,
        best_content: merged
            .iter()
            .take(BEST_CONTENT_COUNT)
            .map(|m| m.content.output_text.clone())
            .collect(),
        top_performing_structures: unique(merged.iter().map(|m| {
            analyze(&m.content.output_text, m.content.hook.as_deref()).structure()
        })),
        platform_averages,
        user_rated_samples: user_rated.len(),
        ai_evaluated_samples: ai_rated.len(),
    }
}

fn platform_average(platform: Platform, source: RatingSource, scores: &[f64]) -> Option<PlatformAverage> {
    if scores.is_empty() {
        return None;
    }
    Some(PlatformAverage {
        platform,
        source,
        average_rating: (scores.iter().sum::<f64>() / scores.len() as f64).round() as i64,
        sample_count: scores.len(),
    })
}

fn describe(stats: &StyleStats) -> String {
    let mut facts = vec![];

    let tones: Vec<&str> = stats
        .common_tones
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();
    if !tones.is_empty() {
        facts.push(format!("Use a {} tone", tones.join(" or ")));
    }
    if !stats.successful_templates.is_empty() {
        facts.push(format!(
            "Formats that perform well: {}",
            stats.successful_templates.join(", ")
        ));
    }
    if !stats.top_performing_structures.is_empty() {
        facts.push(format!(
            "Proven structures: {}",
            stats.top_performing_structures.join("; ")
        ));
    }
    for avg in &stats.platform_averages {
        facts.push(format!(
            "{} average {}/100 across {} {}",
            avg.platform,
            avg.average_rating,
            avg.sample_count,
            avg.source.as_str()
        ));
    }

    if facts.is_empty() {
        return NO_DATA_RECOMMENDATION.to_string();
    }

    format!(
        "{}. Top content averages {}/100 (from {} user-rated, {} AI-evaluated samples).",
        facts.join(". "),
        stats.average_rating,
        stats.user_rated_samples,
        stats.ai_evaluated_samples
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::content;
    use crate::store::{EvaluationInput, PreferencesPatch, RatingInput, SubScore};

    const USER: &str = "user-1";

    fn query(platform: Option<Platform>) -> RecommendationQuery<'static> {
        RecommendationQuery {
            user_id: USER,
            niche: Niche::Skincare,
            template_type: None,
            tone: None,
            platform,
        }
    }

    fn add(store: &Store, tone: &str, text: &str) -> i64 {
        store
            .record_content(&content(Niche::Skincare, tone, TemplateType::Caption, text))
            .unwrap()
    }

    fn rate(store: &Store, id: i64, overall: i64, tiktok: Option<i64>) {
        store
            .save_rating(
                id,
                Some(USER),
                &RatingInput {
                    overall_rating: Some(overall),
                    tiktok_rating: tiktok,
                    ..Default::default()
                },
            )
            .unwrap();
    }

    fn evaluate(store: &Store, id: i64, score: i64) {
        store
            .store_ai_evaluation(
                id,
                "gpt-4o",
                &EvaluationInput {
                    virality: SubScore::new(score, ""),
                    clarity: SubScore::new(score, ""),
                    persuasiveness: SubScore::new(score, ""),
                    creativity: SubScore::new(score, ""),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    fn scored(id: i64, rating: f64, source: RatingSource) -> ScoredContent {
        ScoredContent {
            content: ContentRow {
                id,
                user_id: None,
                niche: "skincare".into(),
                tone: "friendly".into(),
                content_type: "caption".into(),
                product_name: "Serum".into(),
                prompt_text: None,
                hook: None,
                output_text: format!("content {}", id),
                model_used: None,
                created_at: String::new(),
            },
            normalized_rating: rating,
            source,
            platform_ratings: PlatformRatings::default(),
        }
    }

    #[test]
    fn test_empty_returns_none() {
        let store = Store::open_in_memory().unwrap();
        let id = add(&store, "friendly", "meh");
        rate(&store, id, 68, None);
        evaluate(&store, id, 6);
        assert!(recommend(&store, &query(None)).unwrap().is_none());
        assert!(top_rated_content_for_style(&store, &query(None)).unwrap().is_none());
    }

    #[test]
    fn test_cross_scale_normalization_is_equal_strength() {
        let store = Store::open_in_memory().unwrap();
        let rated = add(&store, "friendly", "user rated");
        let evaluated = add(&store, "bold", "ai rated");
        rate(&store, rated, 70, None);
        evaluate(&store, evaluated, 7);

        let merged = merged_top_content(&store, &query(None), 69, 6.9).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].normalized_rating, 70.0);
        assert_eq!(merged[1].normalized_rating, 70.0);
        assert_eq!(merged[0].source, RatingSource::UserRatings);
        assert_eq!(merged[1].source, RatingSource::AiEvaluations);
    }

    #[test]
    fn test_merge_dedupes_keeping_higher_rating() {
        let merged = merge_sources(
            vec![scored(1, 72.0, RatingSource::UserRatings), scored(2, 90.0, RatingSource::UserRatings)],
            vec![scored(1, 95.0, RatingSource::AiEvaluations), scored(2, 80.0, RatingSource::AiEvaluations)],
            10,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].content.id, 1);
        assert_eq!(merged[0].source, RatingSource::AiEvaluations);
        assert_eq!(merged[1].content.id, 2);
        assert_eq!(merged[1].source, RatingSource::UserRatings);
    }

    #[test]
    fn test_merge_truncates_to_limit() {
        let user: Vec<_> = (0..15).map(|i| scored(i, 70.0 + i as f64, RatingSource::UserRatings)).collect();
        let ai: Vec<_> = (15..30).map(|i| scored(i, 50.0 + i as f64, RatingSource::AiEvaluations)).collect();
        let merged = merge_sources(user, ai, 10);
        assert_eq!(merged.len(), 10);
        assert_eq!(merged[0].normalized_rating, 84.0);
        assert!(merged.windows(2).all(|w| w[0].normalized_rating >= w[1].normalized_rating));
    }

    #[test]
    fn test_recommendation_stats_and_text() {
        let store = Store::open_in_memory().unwrap();
        let a = add(&store, "friendly", "Glow like never before. Try it");
        let b = add(&store, "friendly", "Your skin deserves this. Shop now");
        let c = add(&store, "playful", "Would you try this serum?");
        rate(&store, a, 90, Some(80));
        rate(&store, b, 80, None);
        evaluate(&store, c, 9);

        let rec = recommend(&store, &query(Some(Platform::Tiktok))).unwrap().unwrap();
        let stats = &rec.stats;
        assert_eq!(stats.common_tones, vec!["friendly", "playful"]);
        assert_eq!(stats.successful_templates, vec!["caption"]);
        assert_eq!(stats.average_rating, 87);
        assert_eq!(stats.best_content.len(), 3);
        assert_eq!(stats.user_rated_samples, 2);
        assert_eq!(stats.ai_evaluated_samples, 1);
        assert_eq!(
            stats.top_performing_structures,
            vec!["statement → 2 sentences → direct", "statement → 1 sentences → question"]
        );

        assert_eq!(stats.platform_averages.len(), 2);
        assert_eq!(stats.platform_averages[0].source, RatingSource::UserRatings);
        assert_eq!(stats.platform_averages[0].average_rating, 80);
        assert_eq!(stats.platform_averages[0].sample_count, 1);
        assert_eq!(stats.platform_averages[1].source, RatingSource::AiEvaluations);
        assert_eq!(stats.platform_averages[1].average_rating, 90);

        assert!(rec.recommendation.contains("from 2 user-rated, 1 AI-evaluated samples"));
        assert!(rec.recommendation.contains("friendly or playful"));
    }

    #[test]
    fn test_smart_learning_disabled_returns_none() {
        let store = Store::open_in_memory().unwrap();
        let id = add(&store, "friendly", "great stuff");
        rate(&store, id, 95, None);
        assert!(recommend(&store, &query(None)).unwrap().is_some());

        store
            .update_preferences(
                USER,
                &PreferencesPatch {
                    use_smart_learning: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(recommend(&store, &query(None)).unwrap().is_none());
    }

    #[test]
    fn test_rating_floor_preferences_do_not_filter() {
        let store = Store::open_in_memory().unwrap();
        let id = add(&store, "friendly", "great stuff");
        rate(&store, id, 72, Some(66));
        store
            .update_preferences(
                USER,
                &PreferencesPatch {
                    min_overall_rating: Some(95),
                    min_platform_rating: Some(95),
                    ..Default::default()
                },
            )
            .unwrap();

        let rec = recommend(&store, &query(Some(Platform::Tiktok))).unwrap().unwrap();
        assert_eq!(rec.stats.average_rating, 72);
        assert_eq!(rec.stats.user_rated_samples, 1);
    }

    #[test]
    fn test_describe_without_facts() {
        let stats = StyleStats {
            common_tones: vec![String::new()],
            successful_templates: vec![],
            average_rating: 0,
            best_content: vec![],
            top_performing_structures: vec![],
            platform_averages: vec![],
            user_rated_samples: 0,
            ai_evaluated_samples: 0,
        };
        assert_eq!(describe(&stats), NO_DATA_RECOMMENDATION);
    }

    #[test]
    fn test_style_guide() {
        let store = Store::open_in_memory().unwrap();
        let long = format!("Best serum ever #glow #skincare {}", "x".repeat(300));
        let a = add(&store, "friendly", &long);
        let b = add(&store, "friendly", "Love it #glow #routine");
        let c = add(&store, "bold", "Simply works #glow #skincare #spf");
        let d = add(&store, "friendly", "not good enough #ignored");
        rate(&store, a, 99, None);
        rate(&store, b, 90, None);
        evaluate(&store, c, 9);
        rate(&store, d, 84, None);

        let guide = top_rated_content_for_style(&store, &query(None)).unwrap().unwrap();
        assert_eq!(guide.sample_count, 3);
        assert_eq!(guide.dominant_tone.as_deref(), Some("friendly"));
        assert_eq!(guide.top_hashtags, vec!["#glow", "#skincare", "#routine", "#spf"]);
        assert_eq!(guide.example_caption.chars().count(), 200);
        assert!(guide.example_caption.starts_with("Best serum ever"));
        assert!(guide.example_caption.ends_with("..."));
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("short", 200), "short");
    }
}
