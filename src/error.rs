//! Error types for Synheart Digest
//!
//! The slimming transforms themselves never fail: bad samples degrade to
//! missing values. These errors only cover the document boundary and
//! configuration.

use thiserror::Error;

/// Errors that can occur while building a digest
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Failed to parse provider document: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported payload for metric {metric}: expected {expected}")]
    UnsupportedPayload { metric: String, expected: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
