//! Command implementations for the `copyloop` binary

pub mod content;
pub mod patterns;
pub mod prefs;
pub mod rate;
pub mod recommend;
pub mod template;

/// Shorten `text` to its first line and at most `max` characters
pub(crate) fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or(text);
    if line.chars().count() > max {
        format!("{}...", line.chars().take(max.saturating_sub(3)).collect::<String>())
    } else {
        line.to_string()
    }
}
