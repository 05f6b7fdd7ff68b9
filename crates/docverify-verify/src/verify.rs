//! Signature verification orchestration
//!
//! [`SignatureVerifier`] submits a document to the engine and turns its
//! per-signature indications into a [`VerificationReport`]. Validity depends
//! on the indication alone, so a document gets the same verdict at every
//! [`VerificationLevel`]; the level only decides how much detail is attached.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use docverify_crypto::{extract_summary, walk_chain, ParsedCertificate};
use docverify_types::{
    CertificateSummary, ChainReport, ChainStatus, QualificationDetails, SignatureRecord,
    TimestampRecord, ValidationDetailSet, VerificationLevel, VerificationReport,
};

use crate::engine::{
    EngineCertificate, EngineReport, EngineSignature, EngineTimestamp, ValidationEngine,
    ValidationRequest,
};
use crate::error::Result;
use crate::report_log::log_detailed_report;

/// Indications that mean the signature is valid
pub const PASSING_INDICATIONS: &[&str] = &["TOTAL_PASSED", "PASSED"];

pub fn is_passing(indication: &str) -> bool {
    PASSING_INDICATIONS.contains(&indication)
}

/// One signed document to verify
#[derive(Debug, Clone, Copy)]
pub struct SignatureRequest<'a> {
    pub document: &'a [u8],
    pub detached_content: Option<&'a [u8]>,
    pub document_name: Option<&'a str>,
    pub level: VerificationLevel,
}

impl<'a> SignatureRequest<'a> {
    pub fn new(document: &'a [u8]) -> Self {
        Self {
            document,
            detached_content: None,
            document_name: None,
            level: VerificationLevel::Simple,
        }
    }

    pub fn with_detached_content(mut self, content: &'a [u8]) -> Self {
        self.detached_content = Some(content);
        self
    }

    pub fn with_document_name(mut self, name: &'a str) -> Self {
        self.document_name = Some(name);
        self
    }

    pub fn with_level(mut self, level: VerificationLevel) -> Self {
        self.level = level;
        self
    }
}

/// Verifies signed documents through a [`ValidationEngine`]
#[derive(Clone)]
pub struct SignatureVerifier {
    engine: Arc<dyn ValidationEngine>,
    online_validation: bool,
    detailed_logging: bool,
}

impl SignatureVerifier {
    pub fn new(engine: Arc<dyn ValidationEngine>) -> Self {
        Self {
            engine,
            online_validation: true,
            detailed_logging: false,
        }
    }

    pub fn with_online_validation(mut self, enabled: bool) -> Self {
        self.online_validation = enabled;
        self
    }

    /// Dump the engine report at debug level for every request
    pub fn with_detailed_logging(mut self, enabled: bool) -> Self {
        self.detailed_logging = enabled;
        self
    }

    /// Verify a document against `anchors` at the current time
    pub fn verify(
        &self,
        request: &SignatureRequest<'_>,
        anchors: Vec<ParsedCertificate>,
    ) -> Result<VerificationReport> {
        self.verify_at(request, anchors, Utc::now())
    }

    pub fn verify_at(
        &self,
        request: &SignatureRequest<'_>,
        anchors: Vec<ParsedCertificate>,
        now: DateTime<Utc>,
    ) -> Result<VerificationReport> {
        tracing::debug!(
            "submitting {} byte document (detached content: {}) at level {}",
            request.document.len(),
            request.detached_content.is_some(),
            request.level
        );

        let engine_request = ValidationRequest {
            document: request.document,
            detached_content: request.detached_content,
            document_name: request.document_name,
            trusted_certificates: anchors,
            online_validation: self.online_validation,
        };
        let engine_report = self.engine.validate(&engine_request)?;

        if self.detailed_logging {
            log_detailed_report(&engine_report, now);
        }

        let records: Vec<SignatureRecord> = engine_report
            .signatures
            .iter()
            .map(|sig| self.build_record(sig, &engine_report, request.level, now))
            .collect();

        let mut report = VerificationReport::from_records(records, now);
        if report.signature_count == 0 {
            report.errors.push("no signature found in document".to_string());
        }
        if request.level.is_comprehensive() && report.signature_count > 0 {
            let aggregate = report
                .signatures
                .iter()
                .filter_map(|s| s.validation_details.as_ref())
                .fold(ValidationDetailSet::all_true(), |acc, d| acc.and(d));
            report.validation_details = Some(aggregate);
        }

        tracing::info!(
            "verified {} signatures: valid={} status={:?} type={:?}",
            report.signature_count,
            report.valid,
            report.status,
            report.signature_type
        );
        Ok(report)
    }

    fn build_record(
        &self,
        sig: &EngineSignature,
        engine_report: &EngineReport,
        level: VerificationLevel,
        now: DateTime<Utc>,
    ) -> SignatureRecord {
        let valid = is_passing(&sig.indication);

        let mut errors = Vec::new();
        if !valid {
            let mut message = format!("signature invalid: {}", sig.indication);
            if let Some(sub) = &sig.sub_indication {
                message.push_str(&format!(" ({})", sub));
            }
            errors.push(message);
        }
        errors.extend(sig.errors.iter().cloned());

        let signing_cert = sig
            .signing_certificate_id
            .as_deref()
            .and_then(|id| engine_report.certificate(id));

        let mut record = SignatureRecord {
            signature_id: sig.id.clone(),
            valid,
            indication: sig.indication.clone(),
            sub_indication: sig.sub_indication.clone(),
            signature_format: sig.format.clone(),
            signature_level: sig.level.clone(),
            signing_time: sig.signing_time,
            claimed_signing_time: sig.claimed_signing_time,
            signer_certificate: signing_cert.map(|c| summarize(c, now)),
            certificate_chain: None,
            chain_report: None,
            timestamp_info: sig
                .timestamps
                .first()
                .map(|ts| timestamp_record(ts, engine_report, now)),
            timestamp_count: Some(sig.timestamps.len()),
            signature_algorithm: sig.signature_algorithm.clone(),
            digest_algorithm: sig.digest_algorithm.clone(),
            validation_errors: errors,
            validation_warnings: sig.warnings.clone(),
            qualification_details: sig.qualification.as_ref().map(|q| QualificationDetails {
                qualification_level: q.level.clone(),
                errors: q.errors.clone(),
                warnings: q.warnings.clone(),
                info: q.info.clone(),
            }),
            policy_identifier: None,
            validation_details: None,
        };

        if level.is_comprehensive() {
            record.certificate_chain = Some(
                sig.certificate_chain
                    .iter()
                    .filter_map(|id| engine_report.certificate(id))
                    .map(|c| summarize(c, now))
                    .collect(),
            );
            let chain_report = signing_cert.map(|leaf| {
                walk_chain(leaf.clone(), engine_report).to_report(|c| summarize(c, now))
            });
            record.policy_identifier = sig.policy_identifier.clone();
            record.validation_details = Some(self.detail_set(
                &record,
                sig,
                signing_cert,
                chain_report.as_ref(),
                now,
            ));
            record.chain_report = chain_report;
        }

        record
    }

    fn detail_set(
        &self,
        record: &SignatureRecord,
        sig: &EngineSignature,
        signing_cert: Option<&EngineCertificate>,
        chain_report: Option<&ChainReport>,
        now: DateTime<Utc>,
    ) -> ValidationDetailSet {
        let mut additional_details = BTreeMap::new();
        additional_details.insert("indication".to_string(), sig.indication.clone());
        if let Some(sub) = &sig.sub_indication {
            additional_details.insert("subIndication".to_string(), sub.clone());
        }

        ValidationDetailSet {
            signature_intact: record.valid,
            certificate_chain_valid: chain_report
                .map(|c| c.status == ChainStatus::Complete)
                .unwrap_or(false),
            certificate_not_expired: signing_cert
                .and_then(|c| c.parsed())
                .map(|c| c.is_valid_at(now))
                .unwrap_or(false),
            certificate_not_revoked: signing_cert.map(|c| !c.revoked).unwrap_or(false),
            trust_anchor_reached: sig.trusted_chain,
            timestamp_valid: !sig.timestamps.is_empty()
                && sig.timestamps.iter().all(EngineTimestamp::is_valid),
            cryptographic_verification_successful: sig.signature_intact,
            revocation_check_performed: self.online_validation,
            additional_details,
        }
    }
}

/// Summary of an engine certificate with the engine's trust and revocation
/// verdicts applied
fn summarize(cert: &EngineCertificate, now: DateTime<Utc>) -> CertificateSummary {
    let mut summary = extract_summary(&cert.der, now);
    summary.trusted = cert.trusted;
    summary.revoked = cert.revoked;
    summary.revocation_reason = cert.revocation_reason.clone();
    summary.revocation_time = cert.revocation_time;
    summary
}

fn timestamp_record(
    ts: &EngineTimestamp,
    engine_report: &EngineReport,
    now: DateTime<Utc>,
) -> TimestampRecord {
    let tsa_certificate = ts
        .tsa_certificate_id
        .as_deref()
        .and_then(|id| engine_report.certificate(id))
        .map(|c| summarize(c, now));

    TimestampRecord {
        valid: ts.is_valid(),
        timestamp_time: ts.production_time,
        timestamp_type: ts.timestamp_type.clone(),
        tsa_name: ts
            .tsa_name
            .clone()
            .or_else(|| tsa_certificate.as_ref().and_then(|c| c.common_name.clone())),
        tsa_certificate,
        digest_algorithm: ts.digest_algorithm.clone(),
        message_imprint: ts.message_imprint.clone(),
        serial_number: ts.serial_number.clone(),
        validation_errors: ts.errors.clone(),
    }
}
