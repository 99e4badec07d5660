//! Pattern extraction: mine high-rated content into reusable style patterns
//!
//! Rated content is grouped by `niche|tone|content_type`. Groups with fewer
//! than [`MIN_SAMPLES`] qualifying ratings are dropped. Tone, hook and CTA
//! tags come from the first (highest rated, newest) member of each group.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::analyzer::{analyze, CallToActionStyle, EmotionalTone, HookType};
use super::ranked_by_frequency;
use crate::error::Result;
use crate::store::{RatedContent, Store};

pub const DEFAULT_MIN_RATING: i64 = 70;
pub const MIN_SAMPLES: usize = 3;
const MAX_COMMON_PHRASES: usize = 10;
const MAX_TOP_PHRASES: usize = 5;

/// A mined description of what good content looks like for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPattern {
    pub pattern_name: String,
    pub niche: String,
    pub template_type: String,
    pub tone: String,
    pub platform: String,
    pub average_rating: f64,
    pub sample_count: usize,
    pub confidence: f64,
    pub average_word_count: usize,
    pub common_phrases: Vec<String>,
    pub emotional_tone: EmotionalTone,
    pub hook_type: HookType,
    pub call_to_action_style: CallToActionStyle,
    pub best_performing_elements: BestPerformingElements,
    /// Reserved; extraction never fills it
    pub avoidance_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPerformingElements {
    pub avg_rating: f64,
    pub top_phrases: Vec<String>,
    pub sample_ids: Vec<i64>,
}

/// Where extracted patterns go. The store implementation overwrites any
/// previous pattern with the same group key.
pub trait PatternSink {
    /// Persist `patterns`, returning their ids in the same order
    fn save_patterns(&self, patterns: &[ContentPattern]) -> Result<Vec<String>>;
}

/// Mine every rating at or above `min_rating` into patterns. Nothing is
/// written; a store error aborts the whole run.
pub fn extract_patterns(store: &Store, min_rating: i64) -> Result<Vec<ContentPattern>> {
    let rated = store.rated_content(min_rating)?;

    // One sample per content item; rows arrive best rating first
    let mut seen = HashSet::new();
    let mut order: Vec<String> = vec![];
    let mut groups: HashMap<String, Vec<&RatedContent>> = HashMap::new();
    for item in rated.iter().filter(|r| seen.insert(r.content.id)) {
        let key = format!(
            "{}|{}|{}",
            item.content.niche, item.content.tone, item.content.content_type
        );
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                vec![]
            })
            .push(item);
    }

    let mut patterns = vec![];
    for key in &order {
        let members = &groups[key];
        if members.len() < MIN_SAMPLES {
            debug!(
                "[PatternExtractor] Skipping {} ({} samples, need {})",
                key,
                members.len(),
                MIN_SAMPLES
            );
            continue;
        }
        patterns.push(build_pattern(members));
    }

    info!(
        "[PatternExtractor] Extracted {} patterns from {} rated items (min rating {})",
        patterns.len(),
        rated.len(),
        min_rating
    );
    Ok(patterns)
}

/// Extract and hand the result to `sink`
pub fn extract_and_save(
    store: &Store,
    sink: &dyn PatternSink,
    min_rating: i64,
) -> Result<Vec<ContentPattern>> {
    let patterns = extract_patterns(store, min_rating)?;
    sink.save_patterns(&patterns)?;
    Ok(patterns)
}

fn build_pattern(members: &[&RatedContent]) -> ContentPattern {
    let analyses: Vec<_> = members
        .iter()
        .map(|m| analyze(&m.content.output_text, m.content.hook.as_deref()))
        .collect();

    let n = members.len() as f64;
    let average_rating = round2(members.iter().map(|m| m.overall_rating as f64).sum::<f64>() / n);
    let average_word_count = (analyses.iter().map(|a| a.word_count as f64).sum::<f64>() / n).round() as usize;

    let common_phrases = frequent_phrases(analyses.iter().flat_map(|a| a.phrases.iter()));

    let first = &members[0].content;
    let representative = &analyses[0];

    ContentPattern {
        pattern_name: format!("{}_{}_{}_pattern", first.niche, first.tone, first.content_type),
        niche: first.niche.clone(),
        template_type: first.content_type.clone(),
        tone: first.tone.clone(),
        platform: "all".to_string(),
        average_rating,
        sample_count: members.len(),
        confidence: (n / 10.0).min(1.0),
        average_word_count,
        best_performing_elements: BestPerformingElements {
            avg_rating: average_rating,
            top_phrases: common_phrases.iter().take(MAX_TOP_PHRASES).cloned().collect(),
            sample_ids: members.iter().map(|m| m.content.id).collect(),
        },
        common_phrases,
        emotional_tone: representative.emotional_tone,
        hook_type: representative.hook_type,
        call_to_action_style: representative.call_to_action_style,
        avoidance_patterns: vec![],
    }
}

/// Phrases seen at least twice, most frequent first, ties in first-seen order
fn frequent_phrases<'a>(phrases: impl Iterator<Item = &'a String>) -> Vec<String> {
    ranked_by_frequency(phrases)
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .take(MAX_COMMON_PHRASES)
        .map(|(phrase, _)| phrase.clone())
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Niche, TemplateType};
    use crate::store::test_support::{content, rate};

    fn seed(store: &Store, niche: Niche, tone: &str, text: &str, rating: i64) -> i64 {
        let id = store
            .record_content(&content(niche, tone, TemplateType::Caption, text))
            .unwrap();
        rate(store, id, Some("user-1"), rating);
        id
    }

    #[test]
    fn test_group_floor() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, Niche::Tech, "bold", "fast chip inside", 80);
        seed(&store, Niche::Tech, "bold", "fast chip inside", 85);
        assert!(extract_patterns(&store, 70).unwrap().is_empty());

        seed(&store, Niche::Tech, "bold", "fast chip inside", 90);
        let patterns = extract_patterns(&store, 70).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].sample_count, 3);
        assert_eq!(patterns[0].confidence, 0.3);
    }

    #[test]
    fn test_one_item_rated_by_many_users_is_one_sample() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .record_content(&content(
                Niche::Tech,
                "bold",
                TemplateType::Caption,
                "one unique caption text here",
            ))
            .unwrap();
        rate(&store, id, None, 90);
        rate(&store, id, Some("a"), 90);
        rate(&store, id, Some("b"), 90);
        assert!(extract_patterns(&store, 70).unwrap().is_empty());

        seed(&store, Niche::Tech, "bold", "another caption", 80);
        seed(&store, Niche::Tech, "bold", "third caption", 75);
        let patterns = extract_patterns(&store, 70).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].sample_count, 3);
        assert_eq!(patterns[0].average_rating, 81.67);
        assert!(patterns[0].common_phrases.is_empty());
    }

    #[test]
    fn test_confidence_caps_at_one() {
        let store = Store::open_in_memory().unwrap();
        for _ in 0..12 {
            seed(&store, Niche::Fitness, "energetic", "move every day", 88);
        }
        let patterns = extract_patterns(&store, 70).unwrap();
        assert_eq!(patterns[0].confidence, 1.0);
        assert_eq!(patterns[0].sample_count, 12);
    }

    #[test]
    fn test_groups_split_by_tone() {
        let store = Store::open_in_memory().unwrap();
        for _ in 0..3 {
            seed(&store, Niche::Food, "friendly", "tasty and quick", 75);
            seed(&store, Niche::Food, "luxury", "tasty and quick", 95);
        }
        let patterns = extract_patterns(&store, 70).unwrap();
        assert_eq!(patterns.len(), 2);
        // Highest rated group is seen first
        assert_eq!(patterns[0].tone, "luxury");
        assert_eq!(patterns[1].tone, "friendly");
    }

    #[test]
    fn test_common_phrases_and_representative_tags() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, Niche::Skincare, "friendly", "Glow up with this serum. Ready?", 95);
        seed(&store, Niche::Skincare, "friendly", "glow up with this cream today", 90);
        seed(&store, Niche::Skincare, "friendly", "a calm gentle routine", 85);

        let patterns = extract_patterns(&store, 70).unwrap();
        let pattern = &patterns[0];
        assert_eq!(pattern.common_phrases, vec!["glow up with", "up with this"]);
        assert_eq!(pattern.call_to_action_style, CallToActionStyle::Question);
        assert_eq!(pattern.emotional_tone, EmotionalTone::Neutral);
        assert_eq!(pattern.average_word_count, 5);
        assert_eq!(pattern.best_performing_elements.sample_ids.len(), 3);
        assert!(pattern.avoidance_patterns.is_empty());
    }

    #[test]
    fn test_frequent_phrases_truncates_to_ten() {
        let phrases: Vec<String> = (0..12)
            .flat_map(|i| {
                let p = format!("phrase number {}", i);
                std::iter::repeat(p).take(if i == 11 { 5 } else { 2 })
            })
            .collect();
        let top = frequent_phrases(phrases.iter());
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], "phrase number 11");
        assert_eq!(top[1], "phrase number 0");
    }

    #[test]
    fn test_save_overwrites_by_group_key() {
        let store = Store::open_in_memory().unwrap();
        for rating in [80, 85, 90] {
            seed(&store, Niche::Tech, "bold", "fast chip inside", rating);
        }
        let first = extract_and_save(&store, &store, 70).unwrap();
        assert_eq!(first.len(), 1);
        let stored = store.list_patterns(Some(Niche::Tech), true).unwrap();
        assert_eq!(stored.len(), 1);
        let id = stored[0].id.clone();

        seed(&store, Niche::Tech, "bold", "fast chip inside", 100);
        extract_and_save(&store, &store, 70).unwrap();
        let stored = store.list_patterns(Some(Niche::Tech), true).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].sample_count, 4);
        assert_eq!(stored[0].average_rating, 88.75);
        assert_eq!(stored[0].hook_type.as_deref(), Some("statement"));
    }

    #[test]
    fn test_deactivate_and_applications() {
        let store = Store::open_in_memory().unwrap();
        let mut last = 0;
        for rating in [80, 85, 90] {
            last = seed(&store, Niche::Tech, "bold", "fast chip inside", rating);
        }
        extract_and_save(&store, &store, 70).unwrap();
        let id = store.list_patterns(None, true).unwrap()[0].id.clone();

        let err = store
            .record_pattern_application(&id, last, 1.5, &[])
            .unwrap_err();
        assert!(err.is_client_error());

        store
            .record_pattern_application(&id, last, 0.5, &["tone".to_string()])
            .unwrap();
        let applications = store.list_pattern_applications(&id).unwrap();
        assert_eq!(applications.len(), 1);
        assert_eq!(applications[0].modified_attributes, vec!["tone"]);

        store.deactivate_pattern(&id).unwrap();
        assert!(store.list_patterns(None, true).unwrap().is_empty());
        assert_eq!(store.list_patterns(None, false).unwrap().len(), 1);
        assert!(store.deactivate_pattern("missing").is_err());
    }
}
