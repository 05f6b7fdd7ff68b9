//! Orchestrator tests against a scripted validation engine

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use docverify_crypto::ParsedCertificate;
use docverify_types::{
    ChainRole, ChainStatus, SignatureType, VerificationLevel, VerificationStatus,
};
use docverify_verify::{
    EngineCertificate, EngineQualification, EngineReport, EngineSignature, EngineTimestamp, Error,
    SignatureRequest, SignatureVerifier, ValidationEngine, ValidationRequest,
};

const ROOT_DER: &[u8] = include_bytes!("../../docverify-crypto/test_data/root.der");
const INTER_DER: &[u8] = include_bytes!("../../docverify-crypto/test_data/inter.der");
const LEAF_DER: &[u8] = include_bytes!("../../docverify-crypto/test_data/leaf.der");
const TSA_DER: &[u8] = include_bytes!("../../docverify-crypto/test_data/tsa.der");

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

/// Returns a fixed report and remembers what it was asked
struct ScriptedEngine {
    result: std::result::Result<EngineReport, String>,
    seen: Mutex<Vec<(usize, Option<usize>, usize, bool)>>,
}

impl ScriptedEngine {
    fn new(report: EngineReport) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(report),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl ValidationEngine for ScriptedEngine {
    fn validate(&self, request: &ValidationRequest<'_>) -> docverify_verify::Result<EngineReport> {
        self.seen.lock().unwrap().push((
            request.document.len(),
            request.detached_content.map(<[u8]>::len),
            request.trusted_certificates.len(),
            request.online_validation,
        ));
        self.result.clone().map_err(Error::Engine)
    }
}

fn cert(id: &str, der: &[u8], issuer: Option<&str>, trusted: bool) -> EngineCertificate {
    EngineCertificate {
        id: id.to_string(),
        der: der.to_vec(),
        issuer_id: issuer.map(str::to_string),
        trusted,
        ..Default::default()
    }
}

fn certificates() -> Vec<EngineCertificate> {
    vec![
        cert("C-LEAF", LEAF_DER, Some("C-INTER"), false),
        cert("C-INTER", INTER_DER, Some("C-ROOT"), false),
        cert("C-ROOT", ROOT_DER, Some("C-ROOT"), true),
        cert("C-TSA", TSA_DER, Some("C-ROOT"), false),
    ]
}

fn timestamp(intact: bool) -> EngineTimestamp {
    EngineTimestamp {
        production_time: Some(at()),
        timestamp_type: Some("SIGNATURE_TIMESTAMP".to_string()),
        tsa_certificate_id: Some("C-TSA".to_string()),
        digest_algorithm: Some("SHA256".to_string()),
        message_imprint: vec![0xAB; 32],
        serial_number: Some("3A7F02".to_string()),
        message_imprint_found: true,
        message_imprint_intact: intact,
        signature_intact: true,
        ..Default::default()
    }
}

fn signature(id: &str, indication: &str, sub: Option<&str>) -> EngineSignature {
    EngineSignature {
        id: id.to_string(),
        indication: indication.to_string(),
        sub_indication: sub.map(str::to_string),
        format: Some("PAdES-BASELINE-LT".to_string()),
        level: Some("PAdES-BASELINE-LT".to_string()),
        signing_time: Some(at()),
        signing_certificate_id: Some("C-LEAF".to_string()),
        certificate_chain: vec!["C-LEAF".into(), "C-INTER".into(), "C-ROOT".into()],
        timestamps: vec![timestamp(true)],
        signature_algorithm: Some("SHA256withECDSA".to_string()),
        digest_algorithm: Some("SHA256".to_string()),
        qualification: Some(EngineQualification {
            level: Some("QESig".to_string()),
            ..Default::default()
        }),
        policy_identifier: Some("2.16.792.1.61.0.1.5070.3.1.1".to_string()),
        signature_intact: indication != "TOTAL_FAILED",
        trusted_chain: true,
        ..Default::default()
    }
}

fn report(signatures: Vec<EngineSignature>) -> EngineReport {
    EngineReport {
        signatures,
        certificates: certificates(),
    }
}

fn verify(
    engine: Arc<ScriptedEngine>,
    level: VerificationLevel,
) -> docverify_types::VerificationReport {
    SignatureVerifier::new(engine)
        .verify_at(&SignatureRequest::new(b"%PDF-1.7").with_level(level), Vec::new(), at())
        .unwrap()
}

// ==== Validity ====

#[test]
fn test_passing_signature() {
    let engine = ScriptedEngine::new(report(vec![signature("S-1", "TOTAL_PASSED", None)]));
    let report = verify(engine, VerificationLevel::Simple);

    assert!(report.valid);
    assert_eq!(report.status, VerificationStatus::Valid);
    assert_eq!(report.signature_type, SignatureType::Pades);
    assert_eq!(report.signature_count, 1);

    let record = &report.signatures[0];
    assert!(record.validation_errors.is_empty());
    let signer = record.signer_certificate.as_ref().unwrap();
    assert_eq!(signer.common_name.as_deref(), Some("Ömer Çağlar"));
    assert_eq!(signer.subject_serial_number.as_deref(), Some("12345678901"));
    assert_eq!(record.timestamp_count, Some(1));
    let ts = record.timestamp_info.as_ref().unwrap();
    assert!(ts.valid);
    assert_eq!(ts.tsa_name.as_deref(), Some("DocVerify Test TSA"));
    assert_eq!(
        record.qualification_details.as_ref().unwrap().qualification_level.as_deref(),
        Some("QESig")
    );
}

#[test]
fn test_failed_signature_error_text() {
    let mut sig = signature("S-1", "INDETERMINATE", Some("NO_CERTIFICATE_CHAIN_FOUND"));
    sig.errors.push("unable to build a certificate chain".to_string());
    let engine = ScriptedEngine::new(report(vec![sig]));
    let report = verify(engine, VerificationLevel::Simple);

    assert!(!report.valid);
    assert_eq!(report.status, VerificationStatus::Invalid);
    assert_eq!(
        report.signatures[0].validation_errors,
        vec![
            "signature invalid: INDETERMINATE (NO_CERTIFICATE_CHAIN_FOUND)".to_string(),
            "unable to build a certificate chain".to_string(),
        ]
    );

    let engine = ScriptedEngine::new(report_without_sub());
    let report = verify(engine, VerificationLevel::Simple);
    assert_eq!(
        report.signatures[0].validation_errors,
        vec!["signature invalid: TOTAL_FAILED".to_string()]
    );
}

fn report_without_sub() -> EngineReport {
    report(vec![signature("S-1", "TOTAL_FAILED", None)])
}

#[test]
fn test_one_failing_signature_invalidates_report() {
    let engine = ScriptedEngine::new(report(vec![
        signature("S-1", "TOTAL_PASSED", None),
        signature("S-2", "PASSED", None),
        signature("S-3", "TOTAL_FAILED", Some("HASH_FAILURE")),
    ]));
    let report = verify(engine, VerificationLevel::Simple);
    assert!(!report.valid);
    assert_eq!(report.signature_count, 3);
    assert!(report.signatures[1].valid);
    assert!(!report.signatures[2].valid);
}

#[test]
fn test_no_signature_found() {
    let engine = ScriptedEngine::new(report(Vec::new()));
    for level in [VerificationLevel::Simple, VerificationLevel::Comprehensive] {
        let report = verify(engine.clone(), level);
        assert!(!report.valid);
        assert_eq!(report.status, VerificationStatus::NoSignatureFound);
        assert_eq!(report.signature_type, SignatureType::Unknown);
        assert_eq!(report.errors.len(), 1);
        assert!(report.validation_details.is_none());
    }
}

#[test]
fn test_validity_is_level_independent() {
    let scenarios = vec![
        vec![signature("S-1", "TOTAL_PASSED", None)],
        vec![signature("S-1", "INDETERMINATE", Some("OUT_OF_BOUNDS_NO_POE"))],
        vec![
            signature("S-1", "PASSED", None),
            signature("S-2", "FAILED", Some("SIG_CRYPTO_FAILURE")),
        ],
    ];

    for signatures in scenarios {
        let simple = verify(
            ScriptedEngine::new(report(signatures.clone())),
            VerificationLevel::Simple,
        );
        let full = verify(
            ScriptedEngine::new(report(signatures)),
            VerificationLevel::Comprehensive,
        );
        assert_eq!(simple.valid, full.valid);
        assert_eq!(simple.status, full.status);
        let simple_valid: Vec<bool> = simple.signatures.iter().map(|s| s.valid).collect();
        let full_valid: Vec<bool> = full.signatures.iter().map(|s| s.valid).collect();
        assert_eq!(simple_valid, full_valid);
    }
}

// ==== Levels ====

#[test]
fn test_simple_level_omits_details() {
    let engine = ScriptedEngine::new(report(vec![signature("S-1", "TOTAL_PASSED", None)]));
    let report = verify(engine, VerificationLevel::Simple);
    let record = &report.signatures[0];

    assert!(record.certificate_chain.is_none());
    assert!(record.chain_report.is_none());
    assert!(record.policy_identifier.is_none());
    assert!(record.validation_details.is_none());
    assert!(report.validation_details.is_none());

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["signatures"][0].get("certificateChain").is_none());
    assert!(json.get("validationDetails").is_none());
}

#[test]
fn test_comprehensive_level_details() {
    let engine = ScriptedEngine::new(report(vec![signature("S-1", "TOTAL_PASSED", None)]));
    let report = verify(engine, VerificationLevel::Comprehensive);
    let record = &report.signatures[0];

    let chain = record.certificate_chain.as_ref().unwrap();
    assert_eq!(chain.len(), 3);
    assert!(chain[2].trusted);
    assert_eq!(
        record.policy_identifier.as_deref(),
        Some("2.16.792.1.61.0.1.5070.3.1.1")
    );

    let chain_report = record.chain_report.as_ref().unwrap();
    assert_eq!(chain_report.status, ChainStatus::Complete);
    let roles: Vec<ChainRole> = chain_report.links.iter().map(|l| l.role).collect();
    assert_eq!(
        roles,
        vec![ChainRole::EndEntity, ChainRole::Intermediate, ChainRole::Root]
    );

    let details = record.validation_details.as_ref().unwrap();
    assert!(details.signature_intact);
    assert!(details.certificate_chain_valid);
    assert!(details.certificate_not_expired);
    assert!(details.certificate_not_revoked);
    assert!(details.trust_anchor_reached);
    assert!(details.timestamp_valid);
    assert!(details.cryptographic_verification_successful);
    assert!(details.revocation_check_performed);
    assert_eq!(details.additional_details["indication"], "TOTAL_PASSED");

    assert!(report.validation_details.as_ref().unwrap().signature_intact);
}

#[test]
fn test_aggregate_details_are_a_logical_and() {
    let mut second = signature("S-2", "TOTAL_PASSED", None);
    second.timestamps = vec![timestamp(false)];
    let engine = ScriptedEngine::new(report(vec![signature("S-1", "TOTAL_PASSED", None), second]));
    let report = verify(engine, VerificationLevel::Comprehensive);

    assert!(report.signatures[0].validation_details.as_ref().unwrap().timestamp_valid);
    assert!(!report.signatures[1].validation_details.as_ref().unwrap().timestamp_valid);
    let aggregate = report.validation_details.unwrap();
    assert!(!aggregate.timestamp_valid);
    assert!(aggregate.signature_intact);
    assert!(aggregate.additional_details.is_empty());
}

#[test]
fn test_broken_chain_is_reported() {
    let mut engine_report = report(vec![signature("S-1", "INDETERMINATE", Some("NO_CERTIFICATE_CHAIN_FOUND"))]);
    engine_report.certificates.retain(|c| c.id != "C-INTER");
    engine_report.certificates[0].issuer_id = None;

    let report = verify(ScriptedEngine::new(engine_report), VerificationLevel::Comprehensive);
    let chain_report = report.signatures[0].chain_report.as_ref().unwrap();
    assert_eq!(chain_report.status, ChainStatus::Broken);
    assert!(chain_report
        .missing_issuer
        .as_deref()
        .unwrap()
        .contains("DocVerify Test Intermediate CA"));
    assert!(!report.signatures[0].validation_details.as_ref().unwrap().certificate_chain_valid);
}

// ==== Engine interaction ====

#[test]
fn test_request_forwarding() {
    let engine = ScriptedEngine::new(report(vec![signature("S-1", "TOTAL_PASSED", None)]));
    let anchors = vec![ParsedCertificate::from_der(ROOT_DER).unwrap()];
    SignatureVerifier::new(engine.clone())
        .with_online_validation(false)
        .with_detailed_logging(true)
        .verify(
            &SignatureRequest::new(b"<xml/>").with_detached_content(b"payload"),
            anchors,
        )
        .unwrap();

    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[(6, Some(7), 1, false)]);
}

#[test]
fn test_engine_failure_propagates() {
    let engine = ScriptedEngine::failing("container could not be opened");
    let result = SignatureVerifier::new(engine).verify(&SignatureRequest::new(b"x"), Vec::new());
    assert!(matches!(result, Err(Error::Engine(_))));
}
