//! Shallow structural analysis of generated copy
//!
//! Pure and infallible: the same text and hook always produce the same
//! analysis.

use serde::Serialize;

const EXCITED_KEYWORDS: &[&str] = &["amazing", "incredible", "wow", "fantastic", "love", "obsessed", "!"];
const URGENT_KEYWORDS: &[&str] = &["now", "hurry", "limited", "urgent", "don't miss", "today only", "last chance"];
const CALM_KEYWORDS: &[&str] = &["relax", "calm", "gentle", "peaceful", "soothing", "soft"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
    Excited,
    Urgent,
    Calm,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    Question,
    Stat,
    Story,
    Statement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallToActionStyle {
    Question,
    Subtle,
    Direct,
}

impl EmotionalTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalTone::Excited => "excited",
            EmotionalTone::Urgent => "urgent",
            EmotionalTone::Calm => "calm",
            EmotionalTone::Neutral => "neutral",
        }
    }
}

impl HookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookType::Question => "question",
            HookType::Stat => "stat",
            HookType::Story => "story",
            HookType::Statement => "statement",
        }
    }
}

impl CallToActionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallToActionStyle::Question => "question",
            CallToActionStyle::Subtle => "subtle",
            CallToActionStyle::Direct => "direct",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAnalysis {
    pub word_count: usize,
    pub sentences: Vec<String>,
    /// Every 3-word window of the lower-cased text, duplicates kept
    pub phrases: Vec<String>,
    pub emotional_tone: EmotionalTone,
    pub hook_type: HookType,
    pub call_to_action_style: CallToActionStyle,
}

impl ContentAnalysis {
    /// `"{hook} → {n} sentences → {cta}"`
    pub fn structure(&self) -> String {
        format!(
            "{} → {} sentences → {}",
            self.hook_type.as_str(),
            self.sentences.len(),
            self.call_to_action_style.as_str()
        )
    }
}

pub fn analyze(text: &str, hook: Option<&str>) -> ContentAnalysis {
    let lower = text.to_lowercase();

    let sentences = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let words: Vec<&str> = lower.split_whitespace().collect();
    let phrases = words.windows(3).map(|w| w.join(" ")).collect();

    ContentAnalysis {
        word_count: words.len(),
        sentences,
        phrases,
        emotional_tone: emotional_tone(&lower),
        hook_type: hook.map(hook_type).unwrap_or(HookType::Statement),
        call_to_action_style: call_to_action_style(&lower),
    }
}

/// First matching category wins: excited, then urgent, then calm
fn emotional_tone(lower: &str) -> EmotionalTone {
    let matches = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if matches(EXCITED_KEYWORDS) {
        EmotionalTone::Excited
    } else if matches(URGENT_KEYWORDS) {
        EmotionalTone::Urgent
    } else if matches(CALM_KEYWORDS) {
        EmotionalTone::Calm
    } else {
        EmotionalTone::Neutral
    }
}

fn hook_type(hook: &str) -> HookType {
    let lower = hook.to_lowercase();
    if hook.contains('?') {
        HookType::Question
    } else if hook.chars().any(|c| c.is_ascii_digit()) {
        HookType::Stat
    } else if lower.contains("story") || lower.contains("when") {
        HookType::Story
    } else {
        HookType::Statement
    }
}

fn call_to_action_style(lower: &str) -> CallToActionStyle {
    if lower.contains('?') {
        CallToActionStyle::Question
    } else if lower.contains("maybe") || lower.contains("consider") {
        CallToActionStyle::Subtle
    } else {
        CallToActionStyle::Direct
    }
}
