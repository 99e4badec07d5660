//! Feedback-learning components built on top of the store
//!
//! - `analyzer`: text → structural features
//! - `patterns`: rated content → ContentPatterns
//! - `recommend`: user + AI ratings → style recommendations

pub mod analyzer;
pub mod patterns;
pub mod recommend;

pub use analyzer::{analyze, CallToActionStyle, ContentAnalysis, EmotionalTone, HookType};
pub use patterns::{
    extract_and_save, extract_patterns, BestPerformingElements, ContentPattern, PatternSink,
};
pub use recommend::{
    recommend, top_rated_content_for_style, PlatformAverage, RatingSource, Recommendation,
    RecommendationQuery, StyleGuide, StyleStats,
};

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Count occurrences, most frequent first. Ties keep first-seen order.
pub(crate) fn ranked_by_frequency<T: Eq + Hash + Clone>(
    items: impl IntoIterator<Item = T>,
) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = vec![];
    let mut index: HashMap<T, usize> = HashMap::new();
    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Unique values in first-seen order
pub(crate) fn unique<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}
