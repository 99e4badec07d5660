//! Pattern command implementations

use anyhow::Result;

use crate::learning::{extract_and_save, extract_patterns};
use crate::model::Niche;
use crate::store::Store;

use super::preview;

pub fn extract(store: &Store, min_rating: i64, save: bool) -> Result<()> {
    let patterns = if save {
        extract_and_save(store, store, min_rating)?
    } else {
        extract_patterns(store, min_rating)?
    };

    if patterns.is_empty() {
        println!(
            "No patterns found. Each niche/tone/type group needs at least 3 ratings of {} or more.",
            min_rating
        );
        return Ok(());
    }

    println!(
        "{:<40} {:<8} {:<8} {:<6} {:<10} {}",
        "Pattern", "Rating", "Samples", "Conf", "Hook", "Top phrases"
    );
    println!("{}", "-".repeat(100));
    for p in &patterns {
        println!(
            "{:<40} {:<8.2} {:<8} {:<6.1} {:<10} {}",
            preview(&p.pattern_name, 40),
            p.average_rating,
            p.sample_count,
            p.confidence,
            p.hook_type.as_str(),
            preview(&p.common_phrases.join(", "), 40),
        );
    }

    if save {
        println!("\n✅ Saved {} patterns", patterns.len());
    }
    Ok(())
}

pub fn list(store: &Store, niche: Option<String>, all: bool) -> Result<()> {
    let niche = niche.map(|n| n.parse::<Niche>()).transpose()?;
    let patterns = store.list_patterns(niche, !all)?;
    if patterns.is_empty() {
        println!("No patterns stored. Run 'copyloop patterns extract' first.");
        return Ok(());
    }

    println!(
        "{:<10} {:<40} {:<8} {:<8} {:<8}",
        "ID", "Pattern", "Rating", "Samples", "Active"
    );
    println!("{}", "-".repeat(80));
    for p in patterns {
        println!(
            "{:<10} {:<40} {:<8.2} {:<8} {:<8}",
            &p.id[..8.min(p.id.len())],
            preview(&p.pattern_name, 40),
            p.average_rating,
            p.sample_count,
            if p.is_active { "yes" } else { "no" },
        );
    }
    Ok(())
}

pub fn apply(
    store: &Store,
    pattern_query: &str,
    content_id: i64,
    strength: f64,
    attributes: Vec<String>,
) -> Result<()> {
    let patterns = store.list_patterns(None, false)?;
    let pattern = patterns
        .iter()
        .find(|p| p.id.starts_with(pattern_query) || p.pattern_name == pattern_query)
        .ok_or_else(|| anyhow::anyhow!("Pattern not found: {}", pattern_query))?;

    let id = store.record_pattern_application(&pattern.id, content_id, strength, &attributes)?;
    println!(
        "Recorded application #{} of '{}' to content {}",
        id, pattern.pattern_name, content_id
    );
    Ok(())
}

pub fn deactivate(store: &Store, pattern_query: &str) -> Result<()> {
    let patterns = store.list_patterns(None, false)?;
    let pattern = patterns
        .iter()
        .find(|p| p.id.starts_with(pattern_query) || p.pattern_name == pattern_query)
        .ok_or_else(|| anyhow::anyhow!("Pattern not found: {}", pattern_query))?;

    store.deactivate_pattern(&pattern.id)?;
    println!("Deactivated pattern '{}'", pattern.pattern_name);
    Ok(())
}
