//! Base64 wrapper used for binary report fields and repository payloads

use crate::error::{Error, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Base64-encoded data (standard alphabet, padded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Base64(String);

impl Base64 {
    /// Wrap an already-encoded string without validating it
    pub fn new(s: String) -> Self {
        Base64(s)
    }

    /// Encode raw bytes
    pub fn encode(bytes: &[u8]) -> Self {
        Base64(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Decode to bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.0)
            .map_err(|e| Error::InvalidEncoding(format!("invalid base64: {}", e)))
    }

    /// Decode a MIME formatted body.
    ///
    /// Repository payloads wrap the base64 text at 76 columns and indent it,
    /// so every whitespace character (spaces, tabs, CR, LF) is dropped before
    /// the standard decoder runs.
    pub fn decode_mime(text: &str) -> Result<Vec<u8>> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Base64 {
    fn from(s: String) -> Self {
        Base64(s)
    }
}

impl AsRef<str> for Base64 {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Base64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
