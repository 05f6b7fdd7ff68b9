//! Timestamp verification against OpenSSL-generated tokens

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use docverify_crypto::{sha256, ParsedCertificate};
use docverify_trust_root::{TrustQuery, TrustedRootSnapshot};
use docverify_tsa::{TimestampVerifier, VerifyOpts};
use docverify_types::{ChainStatus, HashAlgorithm, TimestampStatus};

const TS256_TSR: &[u8] = include_bytes!("../../docverify-crypto/test_data/ts256.tsr");
const TS256_TST: &[u8] = include_bytes!("../../docverify-crypto/test_data/ts256.tst");
const TS512_TSR: &[u8] = include_bytes!("../../docverify-crypto/test_data/ts512.tsr");
const DATA: &[u8] = include_bytes!("../../docverify-crypto/test_data/timestamped_data.txt");
const ROOT_DER: &[u8] = include_bytes!("../../docverify-crypto/test_data/root.der");
const TSA_DER: &[u8] = include_bytes!("../../docverify-crypto/test_data/tsa.der");
const ROOT2_PEM: &str = include_str!("../../docverify-crypto/test_data/root2.pem");

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

fn verifier(anchors: Vec<ParsedCertificate>) -> TimestampVerifier {
    let trust: Arc<dyn TrustQuery> =
        Arc::new(TrustedRootSnapshot::new(1, "test", anchors, Vec::new()));
    TimestampVerifier::new(trust)
}

fn root() -> ParsedCertificate {
    ParsedCertificate::from_der(ROOT_DER).unwrap()
}

fn unrelated_root() -> ParsedCertificate {
    let der = docverify_crypto::CertificateDer::from_pem(ROOT2_PEM).unwrap();
    ParsedCertificate::from_certificate_der(der).unwrap()
}

/// Copy of `token` with the first byte of the embedded imprint flipped
fn tamper_imprint(token: &[u8]) -> Vec<u8> {
    let imprint = sha256(DATA);
    let pos = token
        .windows(imprint.len())
        .position(|w| w == imprint)
        .unwrap();
    let mut tampered = token.to_vec();
    tampered[pos] ^= 0x01;
    tampered
}

// ==== Valid tokens ====

#[tokio::test]
async fn test_sha256_token_valid_and_trusted() {
    let report = verifier(vec![root()])
        .verify(TS256_TSR, VerifyOpts::new().with_original_data(DATA).at(at()))
        .await;

    assert!(report.valid, "errors: {:?}", report.errors);
    assert_eq!(report.status, TimestampStatus::Valid);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    assert_eq!(report.digest_algorithm, Some(HashAlgorithm::Sha256));
    assert_eq!(report.serial_number.as_deref(), Some("3A7F02"));
    assert_eq!(report.tsa_name.as_deref(), Some("DocVerify Test TSA"));
    assert_eq!(report.message_imprint, sha256(DATA).to_vec());
    assert_eq!(
        report.timestamp_time,
        Some(Utc.with_ymd_and_hms(2026, 10, 18, 8, 57, 52).unwrap())
    );

    let tsa = report.tsa_certificate.unwrap();
    assert!(tsa.trusted);
    assert!(!tsa.expired);
    let chain = report.chain_report.unwrap();
    assert_eq!(chain.status, ChainStatus::Complete);
    assert_eq!(report.tsa_chain.len(), 2);
    assert!(report.tsa_chain[1].trusted);
}

#[tokio::test]
async fn test_sha512_token() {
    let report = verifier(vec![root()])
        .verify(TS512_TSR, VerifyOpts::new().with_original_data(DATA).at(at()))
        .await;
    assert!(report.valid, "errors: {:?}", report.errors);
    assert_eq!(report.digest_algorithm, Some(HashAlgorithm::Sha512));
    assert_eq!(report.message_imprint.len(), 64);
}

#[tokio::test]
async fn test_bare_content_info() {
    let report = verifier(vec![root()])
        .verify(TS256_TST, VerifyOpts::new().with_original_data(DATA).at(at()))
        .await;
    assert!(report.valid, "errors: {:?}", report.errors);
    assert_eq!(report.serial_number.as_deref(), Some("3A7F02"));
}

#[tokio::test]
async fn test_tsa_certificate_as_direct_anchor() {
    let tsa = ParsedCertificate::from_der(TSA_DER).unwrap();
    let report = verifier(vec![tsa])
        .verify(TS256_TSR, VerifyOpts::new().at(at()))
        .await;
    assert!(report.valid);
    assert!(report.tsa_certificate.unwrap().trusted);
}

#[tokio::test]
async fn test_without_original_data_skips_imprint() {
    let report = verifier(vec![root()])
        .verify(TS256_TSR, VerifyOpts::new().at(at()))
        .await;
    assert!(report.valid);
}

// ==== Imprint ====

#[tokio::test]
async fn test_other_data_is_an_imprint_mismatch() {
    let report = verifier(vec![root()])
        .verify(
            TS256_TSR,
            VerifyOpts::new().with_original_data(b"other content").at(at()),
        )
        .await;
    assert!(!report.valid);
    assert_eq!(report.status, TimestampStatus::Invalid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("imprint mismatch"));
}

#[tokio::test]
async fn test_tampered_imprint_keeps_warnings_separate() {
    let tampered = tamper_imprint(TS256_TSR);
    let opts = || VerifyOpts::new().with_original_data(DATA).at(at());

    let untampered = verifier(vec![unrelated_root()]).verify(TS256_TSR, opts()).await;
    let report = verifier(vec![unrelated_root()]).verify(&tampered, opts()).await;

    assert!(untampered.valid);
    assert!(!report.valid);
    assert!(report.errors.iter().any(|e| e.contains("imprint mismatch")));
    assert!(report.errors.iter().all(|e| !e.contains("not trusted")));
    assert_eq!(report.warnings, untampered.warnings);
    assert!(report.warnings.iter().any(|w| w.contains("not trusted")));
}

// ==== Certificate checks ====

#[tokio::test]
async fn test_untrusted_tsa_is_only_a_warning() {
    let report = verifier(Vec::new())
        .verify(TS256_TSR, VerifyOpts::new().with_original_data(DATA).at(at()))
        .await;
    assert!(report.valid);
    assert_eq!(report.warnings.len(), 1);
    assert!(!report.tsa_certificate.unwrap().trusted);
}

#[tokio::test]
async fn test_expired_tsa_certificate_is_an_error() {
    let after_expiry = Utc.with_ymd_and_hms(2125, 1, 1, 0, 0, 0).unwrap();
    let report = verifier(vec![root()])
        .verify(TS256_TSR, VerifyOpts::new().at(after_expiry))
        .await;
    assert!(!report.valid);
    assert!(report.errors.iter().any(|e| e.contains("not valid at")));
    assert!(report.tsa_certificate.unwrap().expired);
}

#[tokio::test]
async fn test_certificate_checks_can_be_disabled() {
    let after_expiry = Utc.with_ymd_and_hms(2125, 1, 1, 0, 0, 0).unwrap();
    let report = verifier(Vec::new())
        .verify(
            TS256_TSR,
            VerifyOpts::new().with_certificate_validation(false).at(after_expiry),
        )
        .await;
    assert!(report.valid);
    assert!(report.warnings.is_empty());
}

// ==== Malformed input ====

#[tokio::test]
async fn test_garbage_is_invalid_format() {
    let report = verifier(vec![root()])
        .verify(b"this is not a timestamp", VerifyOpts::new().at(at()))
        .await;
    assert!(!report.valid);
    assert_eq!(report.status, TimestampStatus::InvalidFormat);
    assert_eq!(report.errors.len(), 1);
    assert!(report.tsa_certificate.is_none());
}

#[tokio::test]
async fn test_truncated_token_is_invalid_format() {
    let report = verifier(vec![root()])
        .verify(&TS256_TSR[..TS256_TSR.len() / 2], VerifyOpts::new().at(at()))
        .await;
    assert_eq!(report.status, TimestampStatus::InvalidFormat);
}
