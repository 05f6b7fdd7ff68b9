//! RFC 3161 timestamp verification
//!
//! [`TimestampVerifier::verify`] never fails. Every problem ends up in the
//! returned [`TimestampReport`]: malformed input as `INVALID_FORMAT`, broken
//! signatures, imprint mismatches and invalid TSA certificates as errors,
//! everything advisory (missing EKU, untrusted TSA, unreachable revocation
//! services) as warnings. Only errors affect `valid`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use const_oid::ObjectIdentifier;
use docverify_crypto::{digest, walk_chain, CertificatePool, IssuerLookup, ParsedCertificate};
use docverify_trust_root::{TrustQuery, TrustedRootSnapshot};
use docverify_types::{CertificateSummary, HashAlgorithm, TimestampReport, TimestampStatus};
use rustls_pki_types::{CertificateDer, UnixTime};
use webpki::{anchor_from_trusted_cert, EndEntityCert, KeyUsage, ALL_VERIFICATION_ALGS};
use x509_cert::ext::pkix::SubjectKeyIdentifier;

use crate::asn1::hash_algorithm_for;
use crate::error::{Error, Result};
use crate::parse::ParsedToken;
use crate::revocation::{check_revocation, RevocationChecker};

const ID_KP_TIME_STAMPING: ObjectIdentifier = const_oid::db::rfc5280::ID_KP_TIME_STAMPING;
const OID_MESSAGE_DIGEST: ObjectIdentifier = const_oid::db::rfc6268::ID_MESSAGE_DIGEST;
const OID_RSA_ENCRYPTION: ObjectIdentifier = const_oid::db::rfc5912::RSA_ENCRYPTION;
const OID_EC_PUBLIC_KEY: ObjectIdentifier = const_oid::db::rfc5912::ID_EC_PUBLIC_KEY;
const OID_SECP256R1: ObjectIdentifier = const_oid::db::rfc5912::SECP_256_R_1;
const OID_SECP384R1: ObjectIdentifier = const_oid::db::rfc5912::SECP_384_R_1;

/// Per-request options
#[derive(Debug, Clone)]
pub struct VerifyOpts<'a> {
    /// Data the token claims to cover; enables the imprint check
    pub original_data: Option<&'a [u8]>,

    /// Run the TSA certificate checks
    pub validate_certificate: bool,

    /// Reference time for validity checks, now when unset
    pub verification_time: Option<DateTime<Utc>>,
}

impl<'a> VerifyOpts<'a> {
    pub fn new() -> Self {
        Self {
            original_data: None,
            validate_certificate: true,
            verification_time: None,
        }
    }

    pub fn with_original_data(mut self, data: &'a [u8]) -> Self {
        self.original_data = Some(data);
        self
    }

    pub fn with_certificate_validation(mut self, enabled: bool) -> Self {
        self.validate_certificate = enabled;
        self
    }

    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.verification_time = Some(time);
        self
    }
}

impl Default for VerifyOpts<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks timestamp tokens against a trust anchor set
#[derive(Clone)]
pub struct TimestampVerifier {
    trust: Arc<dyn TrustQuery>,
    revocation: Option<Arc<dyn RevocationChecker>>,
    online_validation: bool,
}

impl TimestampVerifier {
    pub fn new(trust: Arc<dyn TrustQuery>) -> Self {
        Self {
            trust,
            revocation: None,
            online_validation: true,
        }
    }

    pub fn with_revocation_checker(mut self, checker: Arc<dyn RevocationChecker>) -> Self {
        self.revocation = Some(checker);
        self
    }

    /// Revocation lookups only run when this is on and a checker is set
    pub fn with_online_validation(mut self, enabled: bool) -> Self {
        self.online_validation = enabled;
        self
    }

    /// Verify a `TimeStampResp` or bare CMS timestamp token.
    ///
    /// The trust set is read once per call, so a concurrent refresh never
    /// mixes two generations of anchors into one report.
    pub async fn verify(&self, token_bytes: &[u8], opts: VerifyOpts<'_>) -> TimestampReport {
        let now = opts.verification_time.unwrap_or_else(Utc::now);
        let trust = self.trust.trust_set();
        tracing::debug!("verifying timestamp token of {} bytes", token_bytes.len());

        let token = match ParsedToken::from_der(token_bytes) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("rejecting malformed timestamp token: {}", e);
                return TimestampReport::invalid_format(format!("invalid timestamp format: {}", e), now);
            }
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let timestamp_time = match token.gen_time() {
            Ok(time) => Some(time),
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        };
        let imprint_algorithm = token.hash_algorithm();

        match verify_cms_signature(&token) {
            Ok(signer) => tracing::debug!("token signed by {}", signer.subject()),
            Err(e) => {
                tracing::warn!("timestamp integrity check failed: {}", e);
                errors.push(format!("timestamp signature invalid: {}", e));
            }
        }

        // The imprint algorithm only matters when there is data to compare
        match (opts.original_data, &imprint_algorithm) {
            (Some(data), Ok(alg)) => {
                if let Err(e) = verify_message_imprint(*alg, token.message_imprint(), data) {
                    tracing::warn!("timestamp imprint check failed: {}", e);
                    errors.push(e.to_string());
                }
            }
            (Some(_), Err(e)) => errors.push(format!("message imprint: {}", e)),
            (None, Err(e)) => warnings.push(format!("message imprint not checkable: {}", e)),
            (None, Ok(_)) => {}
        }

        let mut report = TimestampReport {
            valid: false,
            status: TimestampStatus::Invalid,
            timestamp_time,
            tsa_name: token.tsa_name(),
            digest_algorithm: imprint_algorithm.ok(),
            message_imprint: token.message_imprint().to_vec(),
            serial_number: Some(token.serial_hex()),
            tsa_certificate: None,
            tsa_chain: Vec::new(),
            chain_report: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            verification_time: now,
        };

        match token.certificates().first() {
            Some(tsa) => {
                if let Some(cn) = tsa.common_name() {
                    report.tsa_name = Some(cn);
                }
                let mut summary = tsa.summary(now);
                if opts.validate_certificate {
                    self.check_tsa_certificate(
                        &token,
                        tsa,
                        &trust,
                        now,
                        &mut summary,
                        &mut errors,
                        &mut warnings,
                    )
                    .await;
                }
                attach_chain(&token, tsa, &trust, now, &mut report);
                report.tsa_certificate = Some(summary);
            }
            None => errors.push("timestamp token carries no TSA certificate".to_string()),
        }

        report.valid = errors.is_empty();
        report.status = if report.valid {
            TimestampStatus::Valid
        } else {
            TimestampStatus::Invalid
        };
        report.errors = errors;
        report.warnings = warnings;

        tracing::info!(
            "timestamp {} verified: valid={} errors={} warnings={}",
            report.serial_number.as_deref().unwrap_or("-"),
            report.valid,
            report.errors.len(),
            report.warnings.len()
        );
        report
    }

    #[allow(clippy::too_many_arguments)]
    async fn check_tsa_certificate(
        &self,
        token: &ParsedToken,
        tsa: &ParsedCertificate,
        trust: &TrustedRootSnapshot,
        now: DateTime<Utc>,
        summary: &mut CertificateSummary,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        if !tsa.is_valid_at(now) {
            errors.push(format!("TSA certificate is not valid at {}", now.to_rfc3339()));
        }

        if !tsa.extended_key_usage().contains(&ID_KP_TIME_STAMPING) {
            warnings.push("TSA certificate lacks the timestamping extended key usage".to_string());
        }

        summary.trusted = is_trusted(token, tsa, trust, now);
        if !summary.trusted {
            warnings.push(format!("TSA certificate {} is not trusted", tsa.subject()));
        }

        if !self.online_validation {
            return;
        }
        let Some(checker) = self.revocation.as_deref() else {
            return;
        };

        let issuer = issuer_pool(token, trust).find_issuer(tsa);
        let findings = check_revocation(checker, tsa, issuer.as_ref()).await;
        errors.extend(findings.errors);
        warnings.extend(findings.warnings);
        if let Some((reason, time)) = findings.revoked {
            summary.revoked = true;
            summary.revocation_reason = reason;
            summary.revocation_time = time;
        }
    }
}

/// Exact anchor membership, else a timestamping path to an anchor
fn is_trusted(
    token: &ParsedToken,
    tsa: &ParsedCertificate,
    trust: &TrustedRootSnapshot,
    now: DateTime<Utc>,
) -> bool {
    if trust.contains(tsa) {
        return true;
    }

    match build_path_to_anchor(tsa, token.certificates(), trust.anchors(), now) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("no path from TSA certificate to a trust anchor: {}", e);
            false
        }
    }
}

fn issuer_pool(token: &ParsedToken, trust: &TrustedRootSnapshot) -> CertificatePool {
    let mut pool = CertificatePool::new(token.certificates().to_vec());
    for anchor in trust.anchors() {
        pool.push(anchor.clone());
    }
    pool
}

fn attach_chain(
    token: &ParsedToken,
    tsa: &ParsedCertificate,
    trust: &TrustedRootSnapshot,
    now: DateTime<Utc>,
    report: &mut TimestampReport,
) {
    let walk = walk_chain(tsa.clone(), &issuer_pool(token, trust));
    let chain = walk.to_report(|cert| {
        let mut summary = cert.summary(now);
        summary.trusted = trust.contains(cert);
        summary
    });
    report.tsa_chain = chain.links.iter().map(|link| link.certificate.clone()).collect();
    report.chain_report = Some(chain);
}

/// Compare the imprint stored in the token with the digest of `data`
pub fn verify_message_imprint(algorithm: HashAlgorithm, imprint: &[u8], data: &[u8]) -> Result<()> {
    let computed = digest(algorithm, data);
    if computed.as_slice() != imprint {
        return Err(Error::HashMismatch {
            expected: hex::encode(imprint),
            actual: hex::encode(computed),
        });
    }
    Ok(())
}

/// Check the CMS signature over the TSTInfo and return the signer certificate
pub fn verify_cms_signature(token: &ParsedToken) -> Result<ParsedCertificate> {
    let signed_data: &SignedData = token.signed_data();
    let signer_info = signed_data
        .signer_infos
        .0
        .get(0)
        .ok_or_else(|| Error::SignatureVerification("no signer info found".to_string()))?;

    let signer = find_signer_certificate(&signer_info.sid, token.certificates())?;
    let digest_alg = hash_algorithm_for(&signer_info.digest_alg.oid)?;

    let message = match &signer_info.signed_attrs {
        Some(attrs) => {
            verify_message_digest_attribute(attrs, digest_alg, token.tst_info_der())?;
            signed_attrs_for_verification(attrs)?
        }
        None => token.tst_info_der().to_vec(),
    };

    verify_signature(signer_info, &signer, digest_alg, &message)?;
    Ok(signer)
}

fn find_signer_certificate(
    signer_id: &SignerIdentifier,
    certificates: &[ParsedCertificate],
) -> Result<ParsedCertificate> {
    let found = match signer_id {
        SignerIdentifier::IssuerAndSerialNumber(issuer_serial) => certificates.iter().find(|c| {
            let tbs = &c.certificate().tbs_certificate;
            tbs.issuer == issuer_serial.issuer && tbs.serial_number == issuer_serial.serial_number
        }),
        SignerIdentifier::SubjectKeyIdentifier(ski) => certificates.iter().find(|c| {
            matches!(
                c.certificate().tbs_certificate.get::<SubjectKeyIdentifier>(),
                Ok(Some((_, cert_ski))) if &cert_ski == ski
            )
        }),
    };

    found.cloned().ok_or_else(|| {
        Error::SignatureVerification("no embedded certificate matches the signer".to_string())
    })
}

/// The message-digest attribute must equal the digest of the TSTInfo
fn verify_message_digest_attribute(
    signed_attrs: &x509_cert::attr::Attributes,
    algorithm: HashAlgorithm,
    tst_info_der: &[u8],
) -> Result<()> {
    use der::asn1::OctetStringRef;
    use der::{Decode, Encode};

    let attr = signed_attrs
        .iter()
        .find(|attr| attr.oid == OID_MESSAGE_DIGEST)
        .ok_or_else(|| {
            Error::SignatureVerification("message-digest attribute missing".to_string())
        })?;

    if attr.values.len() != 1 {
        return Err(Error::SignatureVerification(
            "message-digest attribute must have exactly one value".to_string(),
        ));
    }
    let value = attr
        .values
        .get(0)
        .ok_or_else(|| Error::SignatureVerification("empty message-digest attribute".to_string()))?;
    let value_der = value.to_der()?;
    let stored = OctetStringRef::from_der(&value_der)?;

    let computed = digest(algorithm, tst_info_der);
    if computed.as_slice() != stored.as_bytes() {
        return Err(Error::SignatureVerification(format!(
            "message-digest attribute {} does not match TSTInfo digest {}",
            hex::encode(stored.as_bytes()),
            hex::encode(&computed)
        )));
    }
    Ok(())
}

/// Signed attributes are stored under an IMPLICIT [0] tag but signed as a
/// plain SET OF.
fn signed_attrs_for_verification(attrs: &x509_cert::attr::Attributes) -> Result<Vec<u8>> {
    use der::{asn1::SetOfVec, Encode};

    let attrs_vec: Vec<x509_cert::attr::Attribute> = attrs.iter().cloned().collect();
    let set = SetOfVec::try_from(attrs_vec)?;
    Ok(set.to_der()?)
}

fn verify_signature(
    signer_info: &SignerInfo,
    signer: &ParsedCertificate,
    digest_alg: HashAlgorithm,
    message: &[u8],
) -> Result<()> {
    use aws_lc_rs::signature::{
        UnparsedPublicKey, VerificationAlgorithm, ECDSA_P256_SHA256_ASN1, ECDSA_P384_SHA256_ASN1,
        ECDSA_P384_SHA384_ASN1, RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
        RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
    };

    let spki = &signer.certificate().tbs_certificate.subject_public_key_info;
    let public_key = spki
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| Error::SignatureVerification("invalid public key encoding".to_string()))?;

    let algorithm: &'static dyn VerificationAlgorithm = if spki.algorithm.oid == OID_RSA_ENCRYPTION {
        match digest_alg {
            HashAlgorithm::Sha1 => &RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
            HashAlgorithm::Sha256 => &RSA_PKCS1_2048_8192_SHA256,
            HashAlgorithm::Sha384 => &RSA_PKCS1_2048_8192_SHA384,
            HashAlgorithm::Sha512 => &RSA_PKCS1_2048_8192_SHA512,
        }
    } else if spki.algorithm.oid == OID_EC_PUBLIC_KEY {
        let curve = spki
            .algorithm
            .parameters
            .as_ref()
            .ok_or_else(|| Error::SignatureVerification("missing EC curve parameters".to_string()))?
            .decode_as::<ObjectIdentifier>()?;
        match (curve, digest_alg) {
            (OID_SECP256R1, HashAlgorithm::Sha256) => &ECDSA_P256_SHA256_ASN1,
            (OID_SECP384R1, HashAlgorithm::Sha256) => &ECDSA_P384_SHA256_ASN1,
            (OID_SECP384R1, HashAlgorithm::Sha384) => &ECDSA_P384_SHA384_ASN1,
            (curve, alg) => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "curve {} with {}",
                    curve, alg
                )))
            }
        }
    } else {
        return Err(Error::UnsupportedAlgorithm(format!(
            "signer key {}",
            spki.algorithm.oid
        )));
    };

    UnparsedPublicKey::new(algorithm, public_key)
        .verify(message, signer_info.signature.as_bytes())
        .map_err(|_| Error::SignatureVerification("signature does not verify".to_string()))
}

/// Build a timestamping path from `tsa` through the token's certificates to
/// one of `anchors`
fn build_path_to_anchor(
    tsa: &ParsedCertificate,
    embedded: &[ParsedCertificate],
    anchors: &[ParsedCertificate],
    at: DateTime<Utc>,
) -> Result<()> {
    let anchor_ders: Vec<CertificateDer<'_>> =
        anchors.iter().map(|c| CertificateDer::from(c.der())).collect();
    let trust_anchors: Vec<_> = anchor_ders
        .iter()
        .filter_map(|der| match anchor_from_trusted_cert(der) {
            Ok(anchor) => Some(anchor),
            Err(e) => {
                tracing::debug!("skipping unusable trust anchor: {}", e);
                None
            }
        })
        .collect();
    if trust_anchors.is_empty() {
        return Err(Error::CertificateValidation("no usable trust anchors".to_string()));
    }

    let tsa_der = CertificateDer::from(tsa.der());
    let end_entity = EndEntityCert::try_from(&tsa_der)
        .map_err(|e| Error::CertificateValidation(format!("unusable TSA certificate: {}", e)))?;

    let intermediates: Vec<CertificateDer<'_>> = embedded
        .iter()
        .filter(|c| *c != tsa)
        .map(|c| CertificateDer::from(c.der()))
        .collect();

    let seconds = u64::try_from(at.timestamp()).unwrap_or(0);
    end_entity
        .verify_for_usage(
            ALL_VERIFICATION_ALGS,
            &trust_anchors,
            &intermediates,
            UnixTime::since_unix_epoch(std::time::Duration::from_secs(seconds)),
            KeyUsage::required(ID_KP_TIME_STAMPING.as_bytes()),
            None,
            None,
        )
        .map(|_| ())
        .map_err(|e| Error::CertificateValidation(e.to_string()))
}
