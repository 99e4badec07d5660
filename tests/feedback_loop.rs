//! End-to-end tests for the rating → pattern → recommendation loop
//!
//! Library tests run against a temporary database file; CLI tests drive the
//! `copyloop` binary with a config pointing at that database.

use std::path::Path;
use std::process::Command;

use copyloop::store::{NewContent, RatingInput};
use copyloop::{
    extract_and_save, extract_patterns, recommend, Niche, RecommendationQuery, Store,
    TemplateType,
};
use tempfile::TempDir;

fn skincare_caption(text: &str) -> NewContent {
    NewContent {
        user_id: Some("maya".to_string()),
        niche: Niche::Skincare,
        tone: "friendly".to_string(),
        content_type: TemplateType::Caption,
        product_name: "Glow Serum".to_string(),
        prompt_text: Some("Write a caption".to_string()),
        hook: Some("Ever wondered why your skin looks dull?".to_string()),
        output_text: text.to_string(),
        model_used: Some("gpt-4o".to_string()),
    }
}

fn rate(store: &Store, id: i64, overall: i64) {
    store
        .save_rating(
            id,
            Some("maya"),
            &RatingInput {
                overall_rating: Some(overall),
                ..Default::default()
            },
        )
        .unwrap();
}

#[test]
fn test_skincare_scenario_extracts_one_pattern() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(&dir.path().join("copyloop.db")).unwrap();

    let texts = [
        "Your skin will love this serum. Try it tonight",
        "This serum brings the glow back. Try it tonight",
        "A serum that works while you sleep. Try it tonight",
        "Serum. Buy.",
    ];
    let ratings = [75, 80, 90, 60];
    for (text, rating) in texts.iter().zip(ratings) {
        let id = store.record_content(&skincare_caption(text)).unwrap();
        rate(&store, id, rating);
    }

    let patterns = extract_patterns(&store, 70).unwrap();
    assert_eq!(patterns.len(), 1);
    let pattern = &patterns[0];
    assert_eq!(pattern.niche, "skincare");
    assert_eq!(pattern.tone, "friendly");
    assert_eq!(pattern.template_type, "caption");
    assert_eq!(pattern.sample_count, 3);
    assert_eq!(pattern.average_rating, 81.67);
    assert_eq!(pattern.common_phrases[0], "try it tonight");
    assert_eq!(pattern.hook_type.as_str(), "question");
}

#[test]
fn test_patterns_persist_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("copyloop.db");
    {
        let store = Store::open(&path).unwrap();
        for rating in [75, 80, 90] {
            let id = store
                .record_content(&skincare_caption("Glow all day. Try it tonight"))
                .unwrap();
            rate(&store, id, rating);
        }
        extract_and_save(&store, &store, 70).unwrap();
    }

    let store = Store::open(&path).unwrap();
    let stored = store.list_patterns(Some(Niche::Skincare), true).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sample_count, 3);
    assert!((stored[0].confidence - 0.3).abs() < 1e-9);
}

#[test]
fn test_recommendation_for_rated_user() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(&dir.path().join("copyloop.db")).unwrap();
    let id = store
        .record_content(&skincare_caption("Glow all day. Try it tonight"))
        .unwrap();
    rate(&store, id, 92);

    let query = RecommendationQuery {
        user_id: "maya",
        niche: Niche::Skincare,
        template_type: None,
        tone: None,
        platform: None,
    };
    let rec = recommend(&store, &query).unwrap().unwrap();
    assert_eq!(rec.stats.average_rating, 92);
    assert!(rec.recommendation.contains("from 1 user-rated, 0 AI-evaluated samples"));

    let other = RecommendationQuery {
        niche: Niche::Tech,
        ..query
    };
    assert!(recommend(&store, &other).unwrap().is_none());
}

// =============================================================================
// CLI
// =============================================================================

fn write_config(dir: &Path) -> String {
    let config_path = dir.join("copyloop.yaml");
    let db_path = dir.join("cli.db");
    std::fs::write(
        &config_path,
        format!("database:\n  path: {}\n", db_path.display()),
    )
    .unwrap();
    config_path.to_string_lossy().to_string()
}

fn run_copyloop(args: &[&str], config: &str) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_copyloop"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("Failed to execute copyloop")
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_cli_rate_and_reject_out_of_range() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let output = run_copyloop(
        &[
            "content", "add", "--niche", "skincare", "--type", "caption", "--tone", "friendly",
            "--product", "Glow Serum", "--text", "Glow all day.",
        ],
        &config,
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("with ID: 1"));

    let output = run_copyloop(&["rate", "1", "--user", "maya", "--overall", "101"], &config);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("overall_rating"));

    let output = run_copyloop(&["rate", "1", "--user", "maya", "--overall", "100"], &config);
    assert!(output.status.success());
    assert!(stdout(&output).contains("overall 100"));
}

#[test]
fn test_cli_template_fallback_levels() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let output = run_copyloop(
        &["template", "--niche", "tech", "--type", "seo_blog", "--product", "Pixel Buds"],
        &config,
    );
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Fallback level: default"));
    assert!(out.contains("Pixel Buds"));

    let output = run_copyloop(
        &["template", "--niche", "techh", "--type", "seo_blog", "--product", "Pixel Buds"],
        &config,
    );
    assert!(!output.status.success());
}
