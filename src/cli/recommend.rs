//! Recommendation command implementations

use anyhow::Result;

use crate::learning::{recommend, top_rated_content_for_style, RecommendationQuery};
use crate::store::Store;

use super::preview;

pub fn run(store: &Store, query: &RecommendationQuery, json: bool) -> Result<()> {
    let rec = match recommend(store, query)? {
        Some(r) => r,
        None => {
            println!(
                "No recommendation for {} yet. Rate some {} content first.",
                query.user_id, query.niche
            );
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rec)?);
        return Ok(());
    }

    println!("{}\n", rec.recommendation);
    println!("Average rating: {}/100", rec.stats.average_rating);
    println!("Best content:");
    for (i, text) in rec.stats.best_content.iter().enumerate() {
        println!("  {}. {}", i + 1, preview(text, 70));
    }
    Ok(())
}

pub fn style(store: &Store, query: &RecommendationQuery, json: bool) -> Result<()> {
    let guide = match top_rated_content_for_style(store, query)? {
        Some(g) => g,
        None => {
            println!("No content rated 85+ yet for {} in {}.", query.user_id, query.niche);
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&guide)?);
        return Ok(());
    }

    println!("Samples:   {}", guide.sample_count);
    println!("Tone:      {}", guide.dominant_tone.as_deref().unwrap_or("-"));
    println!("Structure: {}", guide.dominant_structure.as_deref().unwrap_or("-"));
    println!("Hashtags:  {}", guide.top_hashtags.join(" "));
    println!("Example:   {}", guide.example_caption);
    Ok(())
}
