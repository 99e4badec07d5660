//! Content command implementation

use anyhow::Result;

use crate::model::{Niche, TemplateType};
use crate::store::{NewContent, Store};

pub fn add(store: &Store, content: NewContent) -> Result<()> {
    let id = store.record_content(&content)?;
    println!(
        "Recorded {} {} content for '{}' with ID: {}",
        content.niche, content.content_type, content.product_name, id
    );
    Ok(())
}

pub fn show(store: &Store, id: i64) -> Result<()> {
    let content = match store.get_content(id)? {
        Some(c) => c,
        None => {
            println!("Content {} not found.", id);
            return Ok(());
        }
    };

    println!("\n{}", "=".repeat(80));
    println!("Content #{} | {} | {} | {}", content.id, content.niche, content.content_type, content.tone);
    println!("Product: {}", content.product_name);
    if let Some(hook) = &content.hook {
        println!("Hook: {}", hook);
    }
    println!("{}", "=".repeat(80));
    println!("{}", content.output_text);

    let ratings = store.list_ratings_for_content(id)?;
    if !ratings.is_empty() {
        println!("\n{:<16} {:<8} {:<10} {:<8} {:<8} {:<8}", "User", "Overall", "Instagram", "TikTok", "YouTube", "Twitter");
        println!("{}", "-".repeat(64));
        for r in ratings {
            println!(
                "{:<16} {:<8} {:<10} {:<8} {:<8} {:<8}",
                r.user_id.as_deref().unwrap_or("(anonymous)"),
                score(r.overall_rating),
                score(r.instagram_rating),
                score(r.tiktok_rating),
                score(r.youtube_rating),
                score(r.twitter_rating),
            );
        }
    }

    Ok(())
}

fn score(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Build a [`NewContent`] from raw CLI arguments
#[allow(clippy::too_many_arguments)]
pub fn new_content(
    niche: &str,
    content_type: &str,
    tone: String,
    product: String,
    text: String,
    hook: Option<String>,
    user: Option<String>,
    model: Option<String>,
) -> Result<NewContent> {
    Ok(NewContent {
        user_id: user,
        niche: niche.parse::<Niche>()?,
        tone,
        content_type: content_type.parse::<TemplateType>()?,
        product_name: product,
        prompt_text: None,
        hook,
        output_text: text,
        model_used: model,
    })
}
