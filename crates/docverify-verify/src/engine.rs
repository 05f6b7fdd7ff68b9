//! The external signature validation engine
//!
//! Container parsing, cryptographic checks and certificate path validation
//! for PAdES, XAdES and CAdES are done by an engine behind
//! [`ValidationEngine`]. Its answer is a typed [`EngineReport`] that the
//! orchestrator turns into a [`VerificationReport`](docverify_types::VerificationReport).

use chrono::{DateTime, Utc};
use docverify_crypto::{ChainCertificate, IssuerLookup, ParsedCertificate};

use crate::error::Result;

/// Everything the engine needs for one document
#[derive(Debug, Clone)]
pub struct ValidationRequest<'a> {
    pub document: &'a [u8],
    /// Original content for detached signatures
    pub detached_content: Option<&'a [u8]>,
    pub document_name: Option<&'a str>,
    /// Current trust anchors
    pub trusted_certificates: Vec<ParsedCertificate>,
    /// Allow OCSP/CRL and AIA lookups
    pub online_validation: bool,
}

/// A certificate the engine encountered, keyed by an engine-chosen id
#[derive(Debug, Clone, Default)]
pub struct EngineCertificate {
    pub id: String,
    pub der: Vec<u8>,
    /// Id of the issuing certificate when the engine resolved it
    pub issuer_id: Option<String>,
    /// Whether the engine considers this certificate a trust anchor
    pub trusted: bool,
    pub revoked: bool,
    pub revocation_reason: Option<String>,
    pub revocation_time: Option<DateTime<Utc>>,
}

impl EngineCertificate {
    pub fn parsed(&self) -> Option<ParsedCertificate> {
        ParsedCertificate::from_der(&self.der).ok()
    }
}

impl ChainCertificate for EngineCertificate {
    fn identity(&self) -> String {
        self.id.clone()
    }

    fn is_self_signed(&self) -> bool {
        if self.issuer_id.as_deref() == Some(self.id.as_str()) {
            return true;
        }
        self.parsed().map(|c| c.is_self_issued()).unwrap_or(false)
    }

    fn issuer_name(&self) -> String {
        self.parsed()
            .map(|c| c.issuer())
            .unwrap_or_else(|| "unknown issuer".to_string())
    }
}

/// A timestamp the engine found on a signature
#[derive(Debug, Clone, Default)]
pub struct EngineTimestamp {
    pub production_time: Option<DateTime<Utc>>,
    /// e.g. `SIGNATURE_TIMESTAMP`, `ARCHIVE_TIMESTAMP`
    pub timestamp_type: Option<String>,
    pub tsa_certificate_id: Option<String>,
    pub tsa_name: Option<String>,
    pub digest_algorithm: Option<String>,
    pub message_imprint: Vec<u8>,
    pub serial_number: Option<String>,
    pub message_imprint_found: bool,
    pub message_imprint_intact: bool,
    pub signature_intact: bool,
    pub errors: Vec<String>,
}

impl EngineTimestamp {
    pub fn is_valid(&self) -> bool {
        self.message_imprint_found && self.message_imprint_intact && self.signature_intact
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineQualification {
    pub level: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

/// The engine's conclusion for one signature
#[derive(Debug, Clone, Default)]
pub struct EngineSignature {
    pub id: String,
    /// `TOTAL_PASSED`, `PASSED`, `INDETERMINATE`, `TOTAL_FAILED`, `FAILED`
    pub indication: String,
    pub sub_indication: Option<String>,
    /// e.g. `PAdES-BASELINE-LT`
    pub format: Option<String>,
    pub level: Option<String>,
    /// Best signing time the engine could prove
    pub signing_time: Option<DateTime<Utc>>,
    /// Signing time claimed by the signer
    pub claimed_signing_time: Option<DateTime<Utc>>,
    pub signing_certificate_id: Option<String>,
    /// Certificate ids, signing certificate first
    pub certificate_chain: Vec<String>,
    pub timestamps: Vec<EngineTimestamp>,
    pub signature_algorithm: Option<String>,
    pub digest_algorithm: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub qualification: Option<EngineQualification>,
    pub policy_identifier: Option<String>,
    /// The signature value verifies against the signed data
    pub signature_intact: bool,
    /// The path ends in a trust anchor
    pub trusted_chain: bool,
}

/// Full engine output for one document
#[derive(Debug, Clone, Default)]
pub struct EngineReport {
    pub signatures: Vec<EngineSignature>,
    pub certificates: Vec<EngineCertificate>,
}

impl EngineReport {
    pub fn certificate(&self, id: &str) -> Option<&EngineCertificate> {
        self.certificates.iter().find(|c| c.id == id)
    }
}

impl IssuerLookup<EngineCertificate> for EngineReport {
    fn find_issuer(&self, cert: &EngineCertificate) -> Option<EngineCertificate> {
        cert.issuer_id
            .as_deref()
            .and_then(|id| self.certificate(id))
            .cloned()
    }
}

/// Signature validation capability.
///
/// Implementations are synchronous; callers run them on a blocking thread.
pub trait ValidationEngine: Send + Sync {
    fn validate(&self, request: &ValidationRequest<'_>) -> Result<EngineReport>;
}
