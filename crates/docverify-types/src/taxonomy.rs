//! Client-facing error taxonomy
//!
//! Every failure surfaced to a caller carries one [`ErrorCode`], and each code
//! belongs to exactly one [`StatusClass`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    VerificationError,
    CertificateError,
    TimestampError,
    InvalidDocument,
    FileTooLarge,
    InvalidArgument,
    InternalError,
}

/// Coarse status class of an error, as a transport would map it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusClass {
    ClientError,
    PayloadTooLarge,
    ServerError,
}

impl StatusClass {
    /// Conventional HTTP status code for the class
    pub fn http_status(&self) -> u16 {
        match self {
            StatusClass::ClientError => 400,
            StatusClass::PayloadTooLarge => 413,
            StatusClass::ServerError => 500,
        }
    }
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::VerificationError => "VERIFICATION_ERROR",
            ErrorCode::CertificateError => "CERTIFICATE_ERROR",
            ErrorCode::TimestampError => "TIMESTAMP_ERROR",
            ErrorCode::InvalidDocument => "INVALID_DOCUMENT",
            ErrorCode::FileTooLarge => "FILE_TOO_LARGE",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            ErrorCode::FileTooLarge => StatusClass::PayloadTooLarge,
            ErrorCode::InternalError => StatusClass::ServerError,
            _ => StatusClass::ClientError,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
            path: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn status_class(&self) -> StatusClass {
        self.error.status_class()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes_are_distinct() {
        assert_eq!(ErrorCode::FileTooLarge.status_class().http_status(), 413);
        assert_eq!(ErrorCode::InternalError.status_class().http_status(), 500);
        for code in [
            ErrorCode::VerificationError,
            ErrorCode::CertificateError,
            ErrorCode::TimestampError,
            ErrorCode::InvalidDocument,
            ErrorCode::InvalidArgument,
        ] {
            assert_eq!(code.status_class(), StatusClass::ClientError);
        }
    }

    #[test]
    fn test_response_serialization() {
        let resp = ErrorResponse::new(ErrorCode::FileTooLarge, "file too large")
            .with_details("maximum file size: 200MB");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["error"], "FILE_TOO_LARGE");
        assert_eq!(json["details"], "maximum file size: 200MB");
        assert!(json.get("path").is_none());
        assert!(json.get("timestamp").is_some());
    }
}
