//! Rating and evaluation command implementations

use anyhow::Result;

use crate::store::{EvaluationInput, RatingInput, Store, SubScore};

pub fn rate(store: &Store, content_id: i64, user: Option<String>, input: RatingInput) -> Result<()> {
    let row = store.save_rating(content_id, user.as_deref(), &input)?;
    println!(
        "Saved rating for content {} ({}): overall {}",
        row.content_history_id,
        row.user_id.as_deref().unwrap_or("anonymous"),
        row.overall_rating.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}

pub fn show(store: &Store, content_id: i64, user: Option<String>) -> Result<()> {
    match store.get_rating(content_id, user.as_deref())? {
        Some(row) => println!("{}", serde_json::to_string_pretty(&row)?),
        None => println!("No rating yet for content {}.", content_id),
    }
    Ok(())
}

pub fn evaluate(
    store: &Store,
    content_id: i64,
    model: &str,
    scores: [i64; 4],
    needs_revision: bool,
    suggestions: Option<String>,
) -> Result<()> {
    let input = EvaluationInput {
        virality: SubScore::new(scores[0], ""),
        clarity: SubScore::new(scores[1], ""),
        persuasiveness: SubScore::new(scores[2], ""),
        creativity: SubScore::new(scores[3], ""),
        needs_revision,
        improvement_suggestions: suggestions,
    };
    let row = store.store_ai_evaluation(content_id, model, &input)?;
    println!(
        "Stored {} evaluation for content {}: overall {:.1}{}",
        row.evaluator_model,
        row.content_history_id,
        row.overall_score,
        if row.needs_revision { " (needs revision)" } else { "" }
    );
    Ok(())
}

/// Evaluation read from a JSON file, justifications included
pub fn evaluate_from_file(store: &Store, content_id: i64, model: &str, path: &str) -> Result<()> {
    let input: EvaluationInput = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let row = store.store_ai_evaluation(content_id, model, &input)?;
    println!(
        "Stored {} evaluation for content {}: overall {:.1}",
        row.evaluator_model, row.content_history_id, row.overall_score
    );
    Ok(())
}
