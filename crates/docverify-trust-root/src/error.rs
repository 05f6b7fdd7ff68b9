//! Error types for trust anchor operations

use thiserror::Error;

/// Errors that can occur while resolving or storing trust anchors
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error while fetching the repository
    #[error("HTTP error: {0}")]
    Http(String),

    /// Repository XML could not be read
    #[error("failed to parse repository XML: {0}")]
    Xml(String),

    /// Certificate parsing error
    #[error("failed to parse certificate: {0}")]
    Certificate(String),

    /// PKCS#12 keystore could not be opened
    #[error("failed to read keystore: {0}")]
    Keystore(String),

    /// Resolver configuration problem (missing or invalid path)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No trust data could be loaded on the first refresh
    #[error("initial trust root load failed: {0}")]
    InitialLoad(String),
}

impl From<docverify_crypto::Error> for Error {
    fn from(e: docverify_crypto::Error) -> Self {
        Error::Certificate(e.to_string())
    }
}

/// Result type for trust anchor operations
pub type Result<T> = std::result::Result<T, Error>;
