//! Error types for readmore operations.
//!
//! The truncation pipeline itself never fails; errors come from the edges:
//! reading input, parsing selectors, patterns, templates and config files.

use thiserror::Error;

/// Errors that can occur while configuring or driving truncation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid boundary pattern: {0}")]
    InvalidPattern(#[from] regex_lite::Error),

    #[error("Invalid expand control template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "serde")]
    #[error("Config parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
