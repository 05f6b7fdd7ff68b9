//! Core types for document signature and timestamp verification
//!
//! This crate holds the report models shared by every other crate of the
//! workspace: certificate summaries, signature and timestamp reports, the
//! verification level, hash algorithms and the client-facing error taxonomy.

pub mod encoding;
pub mod error;
pub mod hash;
pub mod report;
pub mod taxonomy;

pub(crate) use hash::base64_bytes;

pub use encoding::Base64;
pub use error::{Error, Result};
pub use hash::HashAlgorithm;
pub use report::{
    CertificateSummary, ChainLink, ChainReport, ChainRole, ChainStatus, QualificationDetails,
    SignatureRecord, SignatureType, TimestampRecord, TimestampReport, TimestampStatus,
    ValidationDetailSet, VerificationLevel, VerificationReport, VerificationStatus,
};
pub use taxonomy::{ErrorCode, ErrorResponse, StatusClass};
