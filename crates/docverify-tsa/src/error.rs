//! Error types for docverify-tsa

use thiserror::Error;

/// Errors raised while checking a timestamp token
#[derive(Error, Debug)]
pub enum Error {
    /// The token bytes are not a timestamp token
    #[error("Failed to parse timestamp token: {0}")]
    Parse(String),

    /// The response carries a status other than granted
    #[error("Timestamp response not granted (status {0})")]
    NotGranted(u8),

    /// Response without a timeStampToken
    #[error("No timestamp token in response")]
    NoToken,

    /// SignedData without encapsulated TSTInfo
    #[error("No TSTInfo in timestamp token")]
    NoTstInfo,

    /// CMS signature or signed attribute check failed
    #[error("Failed to verify timestamp signature: {0}")]
    SignatureVerification(String),

    /// A digest did not match its expected value
    #[error("Message imprint mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Digest or signature algorithm outside the supported set
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// TSA certificate path could not be built
    #[error("TSA certificate validation failed: {0}")]
    CertificateValidation(String),

    /// OCSP or CRL lookup failed
    #[error("Revocation lookup failed: {0}")]
    Revocation(String),
}

impl From<der::Error> for Error {
    fn from(e: der::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// Result type for timestamp operations
pub type Result<T> = std::result::Result<T, Error>;
