// src/error.rs

//! Unified error handling for the results pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Results URL does not follow the positional Clarity path scheme
    #[error("Malformed results URL '{url}': {message}")]
    MalformedUrl { url: String, message: String },

    /// Report document violates the contest/choice/vote shape
    #[error("Decode error at {path}: {message}")]
    Decode { path: String, message: String },

    /// Report document is not a recognizable Clarity report at all
    #[error("Unrecognized report schema: {0}")]
    UnknownSchema(String),

    /// Archive or redirect page lacks the expected content
    #[error("Extraction error for {context}: {message}")]
    Extraction { context: String, message: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV output failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a malformed URL error.
    pub fn malformed_url(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a decode error at an element path.
    pub fn decode(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error with context.
    pub fn extraction(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extraction {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came from the fetch layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }

    /// Whether the error makes every remaining jurisdiction unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MalformedUrl { .. } | Self::UnknownSchema(_))
    }
}
