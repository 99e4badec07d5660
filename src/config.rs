//! Configuration management with YAML support

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::learning::patterns::DEFAULT_MIN_RATING;
use crate::templates::TemplateSource;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub patterns: PatternsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Prompt template source; built-in templates when no path is set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default)]
    pub path: Option<String>,
}

/// Pattern extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsConfig {
    #[serde(default = "default_min_rating")]
    pub min_rating: i64,

    /// Persist patterns after `patterns extract`
    #[serde(default = "default_enabled")]
    pub auto_store: bool,
}

/// Logging configuration; `RUST_LOG` takes precedence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/copyloop/copyloop.db".to_string()
}

fn default_min_rating() -> i64 {
    DEFAULT_MIN_RATING
}

fn default_enabled() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            min_rating: default_min_rating(),
            auto_store: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./copyloop.yaml (current directory)
    /// 3. ~/.config/copyloop/copyloop.yaml
    pub fn load(path: &str) -> Result<Self> {
        Self::load_from(&[
            shellexpand::tilde(path).to_string(),
            "copyloop.yaml".to_string(),
            shellexpand::tilde("~/.config/copyloop/copyloop.yaml").to_string(),
        ])
    }

    /// Load the first existing file in `search_paths`, or the defaults
    pub fn load_from(search_paths: &[String]) -> Result<Self> {
        for search_path in search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)
                    .with_context(|| format!("Failed to read config {}", search_path))?;
                let config: Config = serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse config {}", search_path))?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.database.path).to_string();
        PathBuf::from(expanded)
    }

    pub fn template_source(&self) -> TemplateSource {
        match &self.templates.path {
            Some(path) => TemplateSource::File(PathBuf::from(shellexpand::tilde(path).to_string())),
            None => TemplateSource::Builtin,
        }
    }
}
