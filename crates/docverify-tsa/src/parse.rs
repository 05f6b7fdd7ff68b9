//! Timestamp token parsing
//!
//! A token arrives either as a full `TimeStampResp` or as the bare CMS
//! `ContentInfo` a signature embeds. Both end up as a [`ParsedToken`]:
//!
//! ```text
//! TimeStampResp ::= SEQUENCE {
//!   status PKIStatusInfo,
//!   timeStampToken ContentInfo OPTIONAL }
//!
//! ContentInfo ::= SEQUENCE {
//!   contentType id-signedData,
//!   content [0] EXPLICIT SignedData }
//!
//! EncapsulatedContentInfo ::= SEQUENCE {
//!   eContentType id-ct-TSTInfo,
//!   eContent [0] EXPLICIT OCTET STRING }   -- DER of TSTInfo
//! ```

use chrono::{DateTime, Utc};
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use der::{Decode, Encode};
use docverify_crypto::{serial_to_hex, ParsedCertificate};
use docverify_types::HashAlgorithm;
use x509_cert::ext::pkix::name::GeneralName;

use crate::asn1::{TimeStampResp, TstInfo, OID_SIGNED_DATA, OID_TST_INFO};
use crate::error::{Error, Result};

/// A decoded timestamp token
#[derive(Debug, Clone)]
pub struct ParsedToken {
    signed_data: SignedData,
    tst_info: TstInfo,
    tst_info_der: Vec<u8>,
    certificates: Vec<ParsedCertificate>,
}

impl ParsedToken {
    /// Parse a `TimeStampResp` or a bare `ContentInfo`
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let content_info = match TimeStampResp::from_der(bytes) {
            Ok(resp) => {
                if !resp.status.is_success() {
                    return Err(Error::NotGranted(resp.status.status));
                }
                let token = resp.time_stamp_token.ok_or(Error::NoToken)?;
                let token_der = token
                    .to_der()
                    .map_err(|e| Error::Parse(format!("failed to re-encode token: {}", e)))?;
                ContentInfo::from_der(&token_der)
                    .map_err(|e| Error::Parse(format!("failed to decode ContentInfo: {}", e)))?
            }
            Err(_) => ContentInfo::from_der(bytes)
                .map_err(|e| Error::Parse(format!("not a timestamp token: {}", e)))?,
        };

        if content_info.content_type != OID_SIGNED_DATA {
            return Err(Error::Parse(format!(
                "content type {} is not SignedData",
                content_info.content_type
            )));
        }

        let signed_data_der = content_info
            .content
            .to_der()
            .map_err(|e| Error::Parse(format!("failed to encode SignedData: {}", e)))?;
        let signed_data = SignedData::from_der(&signed_data_der)
            .map_err(|e| Error::Parse(format!("failed to decode SignedData: {}", e)))?;

        if signed_data.encap_content_info.econtent_type != OID_TST_INFO {
            return Err(Error::Parse(format!(
                "encapsulated content {} is not TSTInfo",
                signed_data.encap_content_info.econtent_type
            )));
        }

        // eContent is an OCTET STRING holding the TSTInfo encoding
        let tst_info_der = signed_data
            .encap_content_info
            .econtent
            .as_ref()
            .ok_or(Error::NoTstInfo)?
            .value()
            .to_vec();
        let tst_info = TstInfo::from_der(&tst_info_der)
            .map_err(|e| Error::Parse(format!("failed to decode TSTInfo: {}", e)))?;

        let certificates = embedded_certificates(&signed_data);
        tracing::debug!(
            "parsed timestamp token with {} embedded certificates",
            certificates.len()
        );

        Ok(Self {
            signed_data,
            tst_info,
            tst_info_der,
            certificates,
        })
    }

    pub fn signed_data(&self) -> &SignedData {
        &self.signed_data
    }

    pub fn tst_info(&self) -> &TstInfo {
        &self.tst_info
    }

    /// The exact bytes the signer digested
    pub fn tst_info_der(&self) -> &[u8] {
        &self.tst_info_der
    }

    /// Certificates carried in the SignedData, in token order
    pub fn certificates(&self) -> &[ParsedCertificate] {
        &self.certificates
    }

    pub fn gen_time(&self) -> Result<DateTime<Utc>> {
        let unix = self.tst_info.gen_time.to_unix_duration();
        let secs = i64::try_from(unix.as_secs())
            .map_err(|_| Error::Parse("genTime out of range".to_string()))?;
        DateTime::from_timestamp(secs, unix.subsec_nanos())
            .ok_or_else(|| Error::Parse("invalid genTime in TSTInfo".to_string()))
    }

    /// Digest algorithm declared by the message imprint
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm> {
        self.tst_info.message_imprint.hash_algorithm.to_hash_algorithm()
    }

    pub fn message_imprint(&self) -> &[u8] {
        self.tst_info.message_imprint.hashed_message.as_bytes()
    }

    pub fn serial_hex(&self) -> String {
        serial_to_hex(self.tst_info.serial_number.as_bytes())
    }

    /// The TSTInfo `tsa` field when it is a directory name
    pub fn tsa_name(&self) -> Option<String> {
        match self.tst_info.tsa.as_ref()? {
            GeneralName::DirectoryName(name) => Some(name.to_string()),
            _ => None,
        }
    }
}

fn embedded_certificates(signed_data: &SignedData) -> Vec<ParsedCertificate> {
    let Some(cert_set) = &signed_data.certificates else {
        return Vec::new();
    };

    let mut certificates = Vec::new();
    for choice in cert_set.0.iter() {
        match choice {
            CertificateChoices::Certificate(cert) => {
                match cert.to_der().map_err(Error::from).and_then(|der| {
                    ParsedCertificate::from_der(&der).map_err(|e| Error::Parse(e.to_string()))
                }) {
                    Ok(parsed) => certificates.push(parsed),
                    Err(e) => tracing::warn!("skipping embedded certificate: {}", e),
                }
            }
            CertificateChoices::Other(_) => {
                tracing::debug!("skipping non-standard certificate format");
            }
        }
    }
    certificates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TS256_TSR: &[u8] = include_bytes!("../../docverify-crypto/test_data/ts256.tsr");
    const TS256_TST: &[u8] = include_bytes!("../../docverify-crypto/test_data/ts256.tst");
    const TS512_TSR: &[u8] = include_bytes!("../../docverify-crypto/test_data/ts512.tsr");

    #[test]
    fn test_parse_response() {
        let token = ParsedToken::from_der(TS256_TSR).unwrap();
        assert_eq!(token.hash_algorithm().unwrap(), HashAlgorithm::Sha256);
        assert_eq!(token.serial_hex(), "3A7F02");
        assert_eq!(
            token.gen_time().unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 18, 8, 57, 52).unwrap()
        );
        assert_eq!(
            hex::encode(token.message_imprint()),
            "b7e368f197d68757f255035b3aab91c8bd1c43cf4c1e7456be8cdc628e37a0a4"
        );
        assert_eq!(token.certificates().len(), 2);
        assert_eq!(
            token.certificates()[0].common_name().as_deref(),
            Some("DocVerify Test TSA")
        );
        assert!(token.tsa_name().unwrap().contains("CN=DocVerify Test TSA"));
    }

    #[test]
    fn test_parse_bare_content_info() {
        let from_resp = ParsedToken::from_der(TS256_TSR).unwrap();
        let bare = ParsedToken::from_der(TS256_TST).unwrap();
        assert_eq!(bare.tst_info_der(), from_resp.tst_info_der());
        assert_eq!(bare.serial_hex(), from_resp.serial_hex());
    }

    #[test]
    fn test_parse_sha512_imprint() {
        let token = ParsedToken::from_der(TS512_TSR).unwrap();
        assert_eq!(token.hash_algorithm().unwrap(), HashAlgorithm::Sha512);
        assert_eq!(token.message_imprint().len(), 64);
        assert_eq!(token.serial_hex(), "3A7F03");
    }

    #[test]
    fn test_parse_garbage() {
        assert!(ParsedToken::from_der(b"definitely not DER").is_err());
        assert!(ParsedToken::from_der(&[]).is_err());
    }

    #[test]
    fn test_rejected_status() {
        // TimeStampResp { status { 2 } }
        let rejected = [0x30, 0x05, 0x30, 0x03, 0x02, 0x01, 0x02];
        assert!(matches!(
            ParsedToken::from_der(&rejected),
            Err(Error::NotGranted(2))
        ));
    }
}
