//! Verification report models
//!
//! These are the values handed back to callers. Every optional field is
//! omitted from the serialized form when absent, and every timestamp is an
//! RFC 3339 UTC instant.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;

/// How much detail a signature report carries.
///
/// The level never changes whether a signature is valid, only which optional
/// fields are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationLevel {
    #[default]
    Simple,
    Comprehensive,
}

impl VerificationLevel {
    pub fn is_comprehensive(&self) -> bool {
        matches!(self, VerificationLevel::Comprehensive)
    }
}

impl FromStr for VerificationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(VerificationLevel::Simple),
            "COMPREHENSIVE" => Ok(VerificationLevel::Comprehensive),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationLevel::Simple => f.write_str("SIMPLE"),
            VerificationLevel::Comprehensive => f.write_str("COMPREHENSIVE"),
        }
    }
}

/// Signature family of a verified document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureType {
    #[serde(rename = "PAdES")]
    Pades,
    #[serde(rename = "XAdES")]
    Xades,
    #[serde(rename = "CAdES")]
    Cades,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl SignatureType {
    /// Derive the family from an engine format string such as `PAdES-BASELINE-LT`
    /// or `XAdES-A`.
    pub fn from_format(format: &str) -> Self {
        let upper = format.to_ascii_uppercase();
        if upper.contains("PADES") {
            SignatureType::Pades
        } else if upper.contains("XADES") {
            SignatureType::Xades
        } else if upper.contains("CADES") {
            SignatureType::Cades
        } else {
            SignatureType::Unknown
        }
    }
}

/// Overall status of a signature report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Valid,
    Invalid,
    NoSignatureFound,
}

/// Overall status of a timestamp report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimestampStatus {
    Valid,
    Invalid,
    InvalidFormat,
}

/// Display and decision friendly view of one X.509 certificate.
///
/// `expired` and `trusted` are computed relative to the verification time of
/// the report that carries the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSummary {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(rename = "issuerDN")]
    pub issuer_dn: String,
    /// Uppercase hex without leading zeros
    pub serial_number: String,
    /// The subject `serialNumber` attribute (national identity number for
    /// qualified certificates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    pub trusted: bool,
    pub expired: bool,
    pub revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_time: Option<DateTime<Utc>>,
}

/// How a chain walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainStatus {
    /// Reached a self-signed certificate, or an issuer that was already visited
    Complete,
    /// An issuer could not be found
    Broken,
    /// Stopped at the depth ceiling
    Truncated,
}

/// Position of a certificate within a walked chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainRole {
    EndEntity,
    Intermediate,
    Root,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainLink {
    pub role: ChainRole,
    pub certificate: CertificateSummary,
}

/// Diagnostic result of walking a certificate's issuer chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReport {
    pub status: ChainStatus,
    pub cycle_detected: bool,
    /// Expected issuer DN when the chain is broken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_issuer: Option<String>,
    pub links: Vec<ChainLink>,
}

/// Boolean validation matrix of a signature (or of a whole report)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetailSet {
    pub signature_intact: bool,
    pub certificate_chain_valid: bool,
    pub certificate_not_expired: bool,
    pub certificate_not_revoked: bool,
    pub trust_anchor_reached: bool,
    pub timestamp_valid: bool,
    pub cryptographic_verification_successful: bool,
    pub revocation_check_performed: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_details: BTreeMap<String, String>,
}

impl ValidationDetailSet {
    /// Field-wise AND, used for the report-level aggregate
    pub fn and(&self, other: &ValidationDetailSet) -> ValidationDetailSet {
        ValidationDetailSet {
            signature_intact: self.signature_intact && other.signature_intact,
            certificate_chain_valid: self.certificate_chain_valid && other.certificate_chain_valid,
            certificate_not_expired: self.certificate_not_expired && other.certificate_not_expired,
            certificate_not_revoked: self.certificate_not_revoked && other.certificate_not_revoked,
            trust_anchor_reached: self.trust_anchor_reached && other.trust_anchor_reached,
            timestamp_valid: self.timestamp_valid && other.timestamp_valid,
            cryptographic_verification_successful: self.cryptographic_verification_successful
                && other.cryptographic_verification_successful,
            revocation_check_performed: self.revocation_check_performed
                && other.revocation_check_performed,
            additional_details: BTreeMap::new(),
        }
    }

    /// Identity element for [`ValidationDetailSet::and`]
    pub fn all_true() -> ValidationDetailSet {
        ValidationDetailSet {
            signature_intact: true,
            certificate_chain_valid: true,
            certificate_not_expired: true,
            certificate_not_revoked: true,
            trust_anchor_reached: true,
            timestamp_valid: true,
            cryptographic_verification_successful: true,
            revocation_check_performed: true,
            additional_details: BTreeMap::new(),
        }
    }
}

/// Legal qualification of a signature (QES, AdES/QC, AdES, NA)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification_level: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

/// A timestamp attached to a signature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampRecord {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsa_certificate: Option<CertificateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    #[serde(
        with = "crate::base64_bytes",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub message_imprint: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsa_name: Option<String>,
    pub validation_errors: Vec<String>,
}

/// Per-signature report entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub signature_id: String,
    pub valid: bool,
    /// Engine indication, passed through verbatim
    pub indication: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_indication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_signing_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_certificate: Option<CertificateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_chain: Option<Vec<CertificateSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_report: Option<ChainReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_info: Option<TimestampRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    pub validation_errors: Vec<String>,
    pub validation_warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification_details: Option<QualificationDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_details: Option<ValidationDetailSet>,
}

/// Report for one submitted signed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub valid: bool,
    pub status: VerificationStatus,
    pub signature_type: SignatureType,
    pub verification_time: DateTime<Utc>,
    pub signature_count: usize,
    pub signatures: Vec<SignatureRecord>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_details: Option<ValidationDetailSet>,
}

impl VerificationReport {
    /// Build a report from per-signature records.
    ///
    /// `valid` is the AND over every record and is false when there are no
    /// records at all, in which case the status is `NO_SIGNATURE_FOUND`. The
    /// signature type comes from the first record's format.
    pub fn from_records(signatures: Vec<SignatureRecord>, verification_time: DateTime<Utc>) -> Self {
        let (valid, status) = if signatures.is_empty() {
            (false, VerificationStatus::NoSignatureFound)
        } else if signatures.iter().all(|s| s.valid) {
            (true, VerificationStatus::Valid)
        } else {
            (false, VerificationStatus::Invalid)
        };

        let signature_type = signatures
            .first()
            .and_then(|s| s.signature_format.as_deref())
            .map(SignatureType::from_format)
            .unwrap_or(SignatureType::Unknown);

        Self {
            valid,
            status,
            signature_type,
            verification_time,
            signature_count: signatures.len(),
            signatures,
            errors: Vec::new(),
            warnings: Vec::new(),
            validation_details: None,
        }
    }
}

/// Report for a standalone timestamp token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampReport {
    pub valid: bool,
    pub status: TimestampStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsa_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<HashAlgorithm>,
    #[serde(
        with = "crate::base64_bytes",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub message_imprint: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// `trusted` here means the certificate is itself a trust anchor, or
    /// chains to one through the token's embedded certificates with the
    /// timestamping extended key usage. Chain entries below are trusted only
    /// when they are anchors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsa_certificate: Option<CertificateSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tsa_chain: Vec<CertificateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_report: Option<ChainReport>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub verification_time: DateTime<Utc>,
}

impl TimestampReport {
    /// A report for input that could not be parsed as a timestamp token
    pub fn invalid_format(reason: impl Into<String>, verification_time: DateTime<Utc>) -> Self {
        Self {
            valid: false,
            status: TimestampStatus::InvalidFormat,
            timestamp_time: None,
            tsa_name: None,
            digest_algorithm: None,
            message_imprint: Vec::new(),
            serial_number: None,
            tsa_certificate: None,
            tsa_chain: Vec::new(),
            chain_report: None,
            errors: vec![reason.into()],
            warnings: Vec::new(),
            verification_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, valid: bool, format: Option<&str>) -> SignatureRecord {
        SignatureRecord {
            signature_id: id.to_string(),
            valid,
            indication: if valid { "TOTAL_PASSED" } else { "TOTAL_FAILED" }.to_string(),
            sub_indication: None,
            signature_format: format.map(str::to_string),
            signature_level: None,
            signing_time: None,
            claimed_signing_time: None,
            signer_certificate: None,
            certificate_chain: None,
            chain_report: None,
            timestamp_info: None,
            timestamp_count: None,
            signature_algorithm: None,
            digest_algorithm: None,
            validation_errors: Vec::new(),
            validation_warnings: Vec::new(),
            qualification_details: None,
            policy_identifier: None,
            validation_details: None,
        }
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(
            "comprehensive".parse::<VerificationLevel>().unwrap(),
            VerificationLevel::Comprehensive
        );
        assert_eq!(" SIMPLE ".parse::<VerificationLevel>().unwrap(), VerificationLevel::Simple);
        assert!("FULL".parse::<VerificationLevel>().is_err());
        assert_eq!(VerificationLevel::default(), VerificationLevel::Simple);
    }

    #[test]
    fn test_signature_type_from_format() {
        assert_eq!(SignatureType::from_format("PAdES-BASELINE-LTA"), SignatureType::Pades);
        assert_eq!(SignatureType::from_format("XAdES-A"), SignatureType::Xades);
        assert_eq!(SignatureType::from_format("CAdES-BASELINE-B"), SignatureType::Cades);
        assert_eq!(SignatureType::from_format("PKCS7-B"), SignatureType::Unknown);
    }

    #[test]
    fn test_no_signature_found() {
        let report = VerificationReport::from_records(Vec::new(), Utc::now());
        assert!(!report.valid);
        assert_eq!(report.status, VerificationStatus::NoSignatureFound);
        assert_eq!(report.signature_type, SignatureType::Unknown);
        assert_eq!(report.signature_count, 0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "NO_SIGNATURE_FOUND");
        assert!(json.get("validationDetails").is_none());
    }

    #[test]
    fn test_valid_is_and_over_records() {
        let all_good = VerificationReport::from_records(
            vec![record("a", true, Some("XAdES-BES")), record("b", true, None)],
            Utc::now(),
        );
        assert!(all_good.valid);
        assert_eq!(all_good.status, VerificationStatus::Valid);
        assert_eq!(all_good.signature_type, SignatureType::Xades);

        let one_bad = VerificationReport::from_records(
            vec![record("a", true, Some("PAdES-BASELINE-B")), record("b", false, None)],
            Utc::now(),
        );
        assert!(!one_bad.valid);
        assert_eq!(one_bad.status, VerificationStatus::Invalid);
        assert_eq!(one_bad.signature_type, SignatureType::Pades);
    }

    #[test]
    fn test_absent_fields_omitted() {
        let json = serde_json::to_value(CertificateSummary::default()).unwrap();
        assert!(json.get("notBefore").is_none());
        assert!(json.get("revocationReason").is_none());
        assert_eq!(json["issuerDN"], "");

        let ts = TimestampRecord {
            message_imprint: vec![1, 2, 3],
            ..Default::default()
        };
        let json = serde_json::to_value(&ts).unwrap();
        assert_eq!(json["messageImprint"], "AQID");
        assert!(json.get("tsaName").is_none());
    }

    #[test]
    fn test_detail_set_and() {
        let mut partial = ValidationDetailSet::all_true();
        partial.timestamp_valid = false;
        let combined = ValidationDetailSet::all_true().and(&partial);
        assert!(!combined.timestamp_valid);
        assert!(combined.signature_intact);
    }
}
