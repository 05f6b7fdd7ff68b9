//! Error types for docverify-types

use thiserror::Error;

/// Errors that can occur in docverify-types
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Unknown verification level
    #[error("Invalid verification level: {0}")]
    InvalidLevel(String),

    /// Invalid hash algorithm
    #[error("Invalid hash algorithm: {0}")]
    InvalidHashAlgorithm(String),

    /// Invalid encoding
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Result type for docverify-types operations
pub type Result<T> = std::result::Result<T, Error>;
