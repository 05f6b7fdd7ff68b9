//! Signature verification for docverify
//!
//! Signed documents are validated by an external engine (see
//! [`ValidationEngine`]). This crate owns what happens around it: building
//! the engine request from the current trust anchors, deriving validity from
//! the engine's indications, and assembling a level-dependent
//! [`VerificationReport`](docverify_types::VerificationReport) with
//! certificate summaries, chain diagnostics and validation matrices.
//!
//! ```no_run
//! use std::sync::Arc;
//! use docverify_types::VerificationLevel;
//! use docverify_verify::{SignatureRequest, SignatureVerifier, ValidationEngine};
//!
//! # fn example(engine: Arc<dyn ValidationEngine>, pdf: &[u8]) -> docverify_verify::Result<()> {
//! let verifier = SignatureVerifier::new(engine);
//! let request = SignatureRequest::new(pdf).with_level(VerificationLevel::Comprehensive);
//! let report = verifier.verify(&request, Vec::new())?;
//! println!("{:?}: {} signatures", report.status, report.signature_count);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod report_log;
pub mod verify;

pub use engine::{
    EngineCertificate, EngineQualification, EngineReport, EngineSignature, EngineTimestamp,
    ValidationEngine, ValidationRequest,
};
pub use error::{Error, Result};
pub use report_log::log_detailed_report;
pub use verify::{is_passing, SignatureRequest, SignatureVerifier, PASSING_INDICATIONS};
