//! RFC 3161 timestamp verification for docverify
//!
//! Tokens are accepted as full `TimeStampResp` messages or as the bare CMS
//! `ContentInfo` embedded in signatures. The verifier checks the CMS
//! signature over the TSTInfo, optionally binds the token to the original
//! data through its message imprint, and diagnoses the TSA certificate
//! against the current trust anchors.
//!
//! ```no_run
//! use std::sync::Arc;
//! use docverify_trust_root::TrustAnchorStore;
//! use docverify_tsa::{TimestampVerifier, VerifyOpts};
//!
//! # async fn example(store: Arc<TrustAnchorStore>, token: &[u8], data: &[u8]) {
//! let verifier = TimestampVerifier::new(store);
//! let report = verifier
//!     .verify(token, VerifyOpts::new().with_original_data(data))
//!     .await;
//! println!("valid: {} ({:?})", report.valid, report.status);
//! # }
//! ```

pub mod asn1;
pub mod error;
pub mod parse;
pub mod revocation;
pub mod verify;

pub use asn1::{PkiStatus, TimeStampResp, TstInfo};
pub use error::{Error, Result};
pub use parse::ParsedToken;
pub use revocation::{RevocationChecker, RevocationSource, RevocationStatus};
pub use verify::{
    verify_cms_signature, verify_message_imprint, TimestampVerifier, VerifyOpts,
};
