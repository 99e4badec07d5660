//! Error types shared by the store and the learning components

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before anything was written
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template source error: {0}")]
    Template(String),
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's input (4xx-equivalent).
    /// Everything else is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::NotFound(_))
    }
}

/// Check that an optional score lies within `[min, max]`
pub(crate) fn check_range(field: &str, value: Option<i64>, min: i64, max: i64) -> Result<()> {
    match value {
        Some(v) if v < min || v > max => Err(Error::validation(
            field,
            format!("must be between {} and {}, got {}", min, max, v),
        )),
        _ => Ok(()),
    }
}
