//! Error types for docverify-crypto

use thiserror::Error;

/// Errors that can occur while handling certificates
#[derive(Error, Debug)]
pub enum Error {
    /// PEM encoding/decoding error
    #[error("PEM error: {0}")]
    Pem(String),

    /// DER encoding/decoding error
    #[error("DER error: {0}")]
    Der(String),

    /// Certificate parsing error
    #[error("Certificate error: {0}")]
    InvalidCertificate(String),

    /// Unsupported algorithm
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl From<der::Error> for Error {
    fn from(e: der::Error) -> Self {
        Error::Der(e.to_string())
    }
}

/// Result type for certificate operations
pub type Result<T> = std::result::Result<T, Error>;
