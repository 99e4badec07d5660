pub mod cli;
pub mod config;
pub mod error;
pub mod learning;
pub mod model;
pub mod store;
pub mod templates;

pub use config::Config;
pub use error::{Error, Result};
pub use learning::{
    analyze, extract_and_save, extract_patterns, recommend, top_rated_content_for_style,
    ContentPattern, PatternSink, Recommendation, RecommendationQuery, StyleGuide,
};
pub use model::{LearningIntensity, Niche, Platform, TemplateType};
pub use store::Store;
pub use templates::{FallbackLevel, ResolvedTemplate, TemplateContext, TemplateResolver, TemplateSource};
