//! X.509 certificate parsing and summary extraction
//!
//! [`ParsedCertificate`] keeps the DER bytes, the decoded certificate and its
//! SHA-256 fingerprint together. Summaries are derived from it on demand and
//! never fail: extension or key decoding problems leave the affected field
//! empty.

use chrono::{DateTime, Utc};
use const_oid::db::rfc4519::{COMMON_NAME, SERIAL_NUMBER};
use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512, ID_DSA, ID_EC_PUBLIC_KEY,
    ID_RSASSA_PSS, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1,
    SHA_1_WITH_RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION,
    SHA_512_WITH_RSA_ENCRYPTION,
};
use const_oid::db::rfc8410::{ID_ED_25519, ID_ED_448};
use const_oid::ObjectIdentifier;
use der::asn1::UintRef;
use der::{Decode, Sequence, Tag, Tagged};
use docverify_types::CertificateSummary;
use x509_cert::ext::pkix::{ExtendedKeyUsage, KeyUsage};
use x509_cert::name::Name;
use x509_cert::time::Time;
use x509_cert::Certificate;

use crate::chain::{ChainCertificate, IssuerLookup};
use crate::encoding::CertificateDer;
use crate::error::{Error, Result};
use crate::hash::sha256;

/// A decoded certificate together with its encoding and fingerprint
#[derive(Debug, Clone)]
pub struct ParsedCertificate {
    der: CertificateDer,
    cert: Certificate,
    fingerprint: [u8; 32],
}

impl ParsedCertificate {
    /// Parse a DER-encoded certificate
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        Self::from_certificate_der(CertificateDer::new(bytes.to_vec()))
    }

    pub fn from_certificate_der(der: CertificateDer) -> Result<Self> {
        let cert = Certificate::from_der(der.as_bytes())
            .map_err(|e| Error::InvalidCertificate(format!("failed to parse certificate: {}", e)))?;
        let fingerprint = sha256(der.as_bytes());
        Ok(Self {
            der,
            cert,
            fingerprint,
        })
    }

    pub fn der(&self) -> &[u8] {
        self.der.as_bytes()
    }

    pub fn certificate(&self) -> &Certificate {
        &self.cert
    }

    /// SHA-256 over the DER encoding
    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint)
    }

    /// Subject DN in RFC 4514 form
    pub fn subject(&self) -> String {
        self.cert.tbs_certificate.subject.to_string()
    }

    /// Issuer DN in RFC 4514 form
    pub fn issuer(&self) -> String {
        self.cert.tbs_certificate.issuer.to_string()
    }

    pub fn subject_name(&self) -> &Name {
        &self.cert.tbs_certificate.subject
    }

    pub fn issuer_name_raw(&self) -> &Name {
        &self.cert.tbs_certificate.issuer
    }

    pub fn common_name(&self) -> Option<String> {
        name_attribute(&self.cert.tbs_certificate.subject, COMMON_NAME)
    }

    /// Serial number as uppercase hex without leading zeros
    pub fn serial_hex(&self) -> String {
        serial_to_hex(self.cert.tbs_certificate.serial_number.as_bytes())
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        to_datetime(&self.cert.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> Option<DateTime<Utc>> {
        to_datetime(&self.cert.tbs_certificate.validity.not_after)
    }

    /// Whether `at` lies inside the validity window
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        match (self.not_before(), self.not_after()) {
            (Some(from), Some(to)) => from <= at && at <= to,
            _ => false,
        }
    }

    /// Subject and issuer are the same name
    pub fn is_self_issued(&self) -> bool {
        self.cert.tbs_certificate.subject == self.cert.tbs_certificate.issuer
    }

    /// Whether `other` carries the name this certificate was issued under
    pub fn is_issued_by(&self, other: &ParsedCertificate) -> bool {
        self.cert.tbs_certificate.issuer == other.cert.tbs_certificate.subject
    }

    /// Extended key usage purposes, empty when the extension is absent
    pub fn extended_key_usage(&self) -> Vec<ObjectIdentifier> {
        match self.cert.tbs_certificate.get::<ExtendedKeyUsage>() {
            Ok(Some((_critical, eku))) => eku.0,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("unreadable extended key usage on {}: {}", self.subject(), e);
                Vec::new()
            }
        }
    }

    /// Build a summary relative to `verification_time`.
    ///
    /// `trusted` and `revoked` start out false; callers that know better set
    /// them.
    pub fn summary(&self, verification_time: DateTime<Utc>) -> CertificateSummary {
        let tbs = &self.cert.tbs_certificate;
        let subject = self.subject();
        let (public_key_algorithm, public_key_size) = public_key_info(&self.cert);

        CertificateSummary {
            common_name: Some(self.common_name().unwrap_or_else(|| subject.clone())),
            subject,
            issuer_dn: self.issuer(),
            serial_number: self.serial_hex(),
            subject_serial_number: name_attribute(&tbs.subject, SERIAL_NUMBER),
            not_before: self.not_before(),
            not_after: self.not_after(),
            key_usage: self.key_usage_names(),
            public_key_algorithm: Some(public_key_algorithm),
            public_key_size,
            signature_algorithm: Some(signature_algorithm_name(&self.cert.signature_algorithm.oid)),
            trusted: false,
            expired: !self.is_valid_at(verification_time),
            revoked: false,
            revocation_reason: None,
            revocation_time: None,
        }
    }

    fn key_usage_names(&self) -> Option<String> {
        let ku = match self.cert.tbs_certificate.get::<KeyUsage>() {
            Ok(Some((_critical, ku))) => ku,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("unreadable key usage on {}: {}", self.subject(), e);
                return None;
            }
        };

        let flags = [
            (ku.digital_signature(), "Digital Signature"),
            (ku.non_repudiation(), "Non Repudiation"),
            (ku.key_encipherment(), "Key Encipherment"),
            (ku.data_encipherment(), "Data Encipherment"),
            (ku.key_agreement(), "Key Agreement"),
            (ku.key_cert_sign(), "Key Cert Sign"),
            (ku.crl_sign(), "CRL Sign"),
            (ku.encipher_only(), "Encipher Only"),
            (ku.decipher_only(), "Decipher Only"),
        ];
        let names: Vec<&str> = flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| *name)
            .collect();

        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }
}

impl PartialEq for ParsedCertificate {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for ParsedCertificate {}

impl ChainCertificate for ParsedCertificate {
    fn identity(&self) -> String {
        self.fingerprint_hex()
    }

    fn is_self_signed(&self) -> bool {
        self.is_self_issued()
    }

    fn issuer_name(&self) -> String {
        self.issuer()
    }
}

/// Summarize raw DER without failing.
///
/// Unparseable input yields a summary whose subject says so.
pub fn extract_summary(der: &[u8], verification_time: DateTime<Utc>) -> CertificateSummary {
    match ParsedCertificate::from_der(der) {
        Ok(cert) => cert.summary(verification_time),
        Err(e) => {
            tracing::warn!("could not summarize certificate: {}", e);
            CertificateSummary {
                subject: "unparseable certificate".to_string(),
                expired: true,
                ..Default::default()
            }
        }
    }
}

/// A flat set of certificates searched by issuer name
#[derive(Debug, Clone, Default)]
pub struct CertificatePool {
    certificates: Vec<ParsedCertificate>,
}

impl CertificatePool {
    pub fn new(certificates: Vec<ParsedCertificate>) -> Self {
        Self { certificates }
    }

    pub fn push(&mut self, cert: ParsedCertificate) {
        if !self.contains(&cert) {
            self.certificates.push(cert);
        }
    }

    pub fn contains(&self, cert: &ParsedCertificate) -> bool {
        self.certificates.iter().any(|c| c == cert)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParsedCertificate> {
        self.certificates.iter()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

impl IssuerLookup<ParsedCertificate> for CertificatePool {
    fn find_issuer(&self, cert: &ParsedCertificate) -> Option<ParsedCertificate> {
        self.certificates
            .iter()
            .find(|candidate| *candidate != cert && cert.is_issued_by(candidate))
            .cloned()
    }
}

fn to_datetime(time: &Time) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(time.to_unix_duration().as_secs()).ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Uppercase hex without leading zeros, "0" for a zero value
pub fn serial_to_hex(bytes: &[u8]) -> String {
    let hex = hex::encode_upper(bytes);
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// First value of `oid` in a distinguished name, decoded as a directory string
fn name_attribute(name: &Name, oid: ObjectIdentifier) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == oid)
        .and_then(|atv| directory_string(atv.value.tag(), atv.value.value()))
}

fn directory_string(tag: Tag, value: &[u8]) -> Option<String> {
    match tag {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::TeletexString => {
            std::str::from_utf8(value).ok().map(str::to_string)
        }
        Tag::BmpString => {
            if value.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = value
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        _ => None,
    }
}

#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    #[allow(dead_code)]
    public_exponent: UintRef<'a>,
}

fn public_key_info(cert: &Certificate) -> (String, Option<u32>) {
    let spki = &cert.tbs_certificate.subject_public_key_info;
    let oid = spki.algorithm.oid;

    if oid == RSA_ENCRYPTION {
        let size = spki
            .subject_public_key
            .as_bytes()
            .and_then(|raw| RsaPublicKey::from_der(raw).ok())
            .map(|key| bit_length(key.modulus.as_bytes()));
        ("RSA".to_string(), size)
    } else if oid == ID_EC_PUBLIC_KEY {
        let size = spki
            .algorithm
            .parameters
            .as_ref()
            .and_then(|params| ObjectIdentifier::from_bytes(params.value()).ok())
            .and_then(|curve| match curve {
                c if c == SECP_256_R_1 => Some(256),
                c if c == SECP_384_R_1 => Some(384),
                c if c == SECP_521_R_1 => Some(521),
                _ => None,
            });
        ("EC".to_string(), size)
    } else if oid == ID_ED_25519 {
        ("Ed25519".to_string(), Some(256))
    } else if oid == ID_ED_448 {
        ("Ed448".to_string(), Some(448))
    } else if oid == ID_DSA {
        ("DSA".to_string(), None)
    } else {
        (oid.to_string(), None)
    }
}

fn bit_length(magnitude: &[u8]) -> u32 {
    match magnitude.first() {
        Some(&first) => (magnitude.len() as u32 - 1) * 8 + (8 - first.leading_zeros()),
        None => 0,
    }
}

fn signature_algorithm_name(oid: &ObjectIdentifier) -> String {
    let name = match *oid {
        o if o == SHA_1_WITH_RSA_ENCRYPTION => "SHA1withRSA",
        o if o == SHA_256_WITH_RSA_ENCRYPTION => "SHA256withRSA",
        o if o == SHA_384_WITH_RSA_ENCRYPTION => "SHA384withRSA",
        o if o == SHA_512_WITH_RSA_ENCRYPTION => "SHA512withRSA",
        o if o == ECDSA_WITH_SHA_256 => "SHA256withECDSA",
        o if o == ECDSA_WITH_SHA_384 => "SHA384withECDSA",
        o if o == ECDSA_WITH_SHA_512 => "SHA512withECDSA",
        o if o == ID_RSASSA_PSS => "RSASSA-PSS",
        o if o == ID_ED_25519 => "Ed25519",
        o if o == ID_ED_448 => "Ed448",
        other => return other.to_string(),
    };
    name.to_string()
}
