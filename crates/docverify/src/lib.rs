//! Electronic signature and timestamp verification
//!
//! This is the main entry point of docverify. [`VerificationService`] ties the
//! workspace together: it keeps the trusted root certificates current,
//! verifies PAdES, XAdES and CAdES documents through a pluggable validation
//! engine, and verifies RFC 3161 timestamp tokens on its own.
//!
//! ```no_run
//! use std::sync::Arc;
//! use docverify::{
//!     SignatureVerificationRequest, TimestampVerificationRequest, VerificationService,
//!     VerifierConfig,
//! };
//!
//! # async fn example(engine: Arc<dyn docverify::verify::ValidationEngine>) -> docverify::Result<()> {
//! let config = VerifierConfig::from_env()?;
//! docverify::logging::init_tracing(config.log_filter.as_deref())?;
//! let service = VerificationService::start(config, engine).await?;
//!
//! let pdf = std::fs::read("contract.pdf").map_err(|e| docverify::Error::InvalidArgument(e.to_string()))?;
//! let report = service
//!     .verify_signature(SignatureVerificationRequest::new(pdf).with_level("COMPREHENSIVE"))
//!     .await?;
//! println!("valid: {}", report.valid);
//!
//! let token = std::fs::read("contract.tsr").map_err(|e| docverify::Error::InvalidArgument(e.to_string()))?;
//! let ts = service.verify_timestamp(TimestampVerificationRequest::new(token)).await?;
//! println!("timestamp: {:?}", ts.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod service;

// Re-export core crates
pub use docverify_crypto as crypto;
pub use docverify_trust_root as trust_root;
pub use docverify_tsa as tsa;
pub use docverify_types as types;
pub use docverify_verify as verify;

pub use config::VerifierConfig;
pub use error::{Error, Result};
pub use service::{
    parse_level, HealthStatus, ServiceInfo, SignatureVerificationRequest,
    TimestampVerificationRequest, VerificationService,
};
