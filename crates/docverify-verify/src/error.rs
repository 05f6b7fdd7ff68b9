//! Error types for docverify-verify

use thiserror::Error;

/// Errors that can occur while verifying a signed document
#[derive(Error, Debug)]
pub enum Error {
    /// The engine could not read the document at all
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The engine failed while validating
    #[error("Validation engine error: {0}")]
    Engine(String),
}

/// Result type for verification operations
pub type Result<T> = std::result::Result<T, Error>;
