//! Error types for docverify

use docverify_types::{ErrorCode, ErrorResponse};
use thiserror::Error;

/// Message shown to callers for internal failures
const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Errors that can occur in docverify operations
#[derive(Error, Debug)]
pub enum Error {
    /// Types error
    #[error("Types error: {0}")]
    Types(#[from] docverify_types::Error),

    /// Certificate error
    #[error("Certificate error: {0}")]
    Crypto(#[from] docverify_crypto::Error),

    /// Trust root error
    #[error("Trust root error: {0}")]
    TrustRoot(#[from] docverify_trust_root::Error),

    /// Timestamp error
    #[error("Timestamp error: {0}")]
    Timestamp(#[from] docverify_tsa::Error),

    /// Signature verification error
    #[error("Verification error: {0}")]
    Verification(#[from] docverify_verify::Error),

    /// Upload above the configured ceiling
    #[error("File too large: {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    /// Missing or malformed request input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything the caller cannot act on
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Taxonomy code surfaced to callers
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Types(_) | Error::InvalidArgument(_) | Error::Config(_) => {
                ErrorCode::InvalidArgument
            }
            Error::Crypto(_) => ErrorCode::CertificateError,
            Error::TrustRoot(docverify_trust_root::Error::Certificate(_)) => {
                ErrorCode::CertificateError
            }
            Error::TrustRoot(_) => ErrorCode::InternalError,
            Error::Timestamp(_) => ErrorCode::TimestampError,
            Error::Verification(docverify_verify::Error::InvalidDocument(_)) => {
                ErrorCode::InvalidDocument
            }
            Error::Verification(_) => ErrorCode::VerificationError,
            Error::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Client-facing body for this error.
    ///
    /// Internal failures are logged in full and answered with a generic
    /// message.
    pub fn to_response(&self, path: Option<&str>) -> ErrorResponse {
        let code = self.code();
        let response = match self {
            _ if code == ErrorCode::InternalError => {
                tracing::error!("internal error: {}", self);
                ErrorResponse::new(code, INTERNAL_MESSAGE)
            }
            Error::FileTooLarge { limit, .. } => ErrorResponse::new(code, "File too large")
                .with_details(format!("maximum file size: {}", megabytes(*limit))),
            _ => ErrorResponse::new(code, self.to_string()),
        };
        match path {
            Some(path) => response.with_path(path),
            None => response,
        }
    }
}

pub(crate) fn megabytes(bytes: usize) -> String {
    let mib = bytes / (1024 * 1024);
    if mib > 0 && mib * 1024 * 1024 == bytes {
        format!("{}MB", mib)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Result type for docverify operations
pub type Result<T> = std::result::Result<T, Error>;
