//! Certificate encodings
//!
//! Certificates reach us as raw DER (repository entries, `.cer` files,
//! tokens) or as PEM files that may hold several `CERTIFICATE` blocks.

use crate::error::{Error, Result};

/// A DER-encoded X.509 certificate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertificateDer(Vec<u8>);

impl CertificateDer {
    /// Create from DER bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Create from a single PEM-encoded certificate
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let parsed = pem::parse(pem_str)
            .map_err(|e| Error::Pem(format!("failed to parse PEM: {}", e)))?;

        if !is_certificate_tag(parsed.tag()) {
            return Err(Error::Pem(format!(
                "expected CERTIFICATE PEM block, got {}",
                parsed.tag()
            )));
        }

        Ok(Self::new(parsed.into_contents()))
    }

    /// Get the underlying DER bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to owned DER bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Encode as a PEM `CERTIFICATE` block
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new("CERTIFICATE", self.0.clone()))
    }
}

impl From<Vec<u8>> for CertificateDer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for CertificateDer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn is_certificate_tag(tag: &str) -> bool {
    matches!(tag, "CERTIFICATE" | "X509 CERTIFICATE" | "TRUSTED CERTIFICATE")
}

/// Split file contents into certificates.
///
/// PEM input yields every certificate block in order (other block types are
/// ignored); anything else is taken as a single DER certificate. The bytes are
/// not parsed here.
pub fn parse_certificates(bytes: &[u8]) -> Result<Vec<CertificateDer>> {
    if !looks_like_pem(bytes) {
        if bytes.is_empty() {
            return Err(Error::InvalidCertificate("empty input".to_string()));
        }
        return Ok(vec![CertificateDer::new(bytes.to_vec())]);
    }

    let blocks =
        pem::parse_many(bytes).map_err(|e| Error::Pem(format!("failed to parse PEM: {}", e)))?;
    let certs: Vec<CertificateDer> = blocks
        .into_iter()
        .filter(|block| is_certificate_tag(block.tag()))
        .map(|block| CertificateDer::new(block.into_contents()))
        .collect();

    if certs.is_empty() {
        return Err(Error::Pem("no CERTIFICATE block found".to_string()));
    }
    Ok(certs)
}

fn looks_like_pem(bytes: &[u8]) -> bool {
    const MARKER: &[u8] = b"-----BEGIN ";
    bytes.windows(MARKER.len()).any(|w| w == MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_PEM: &str = include_str!("../test_data/root.pem");
    const ROOT_DER: &[u8] = include_bytes!("../test_data/root.der");
    const INTER_PEM: &str = include_str!("../test_data/inter.pem");

    #[test]
    fn test_single_pem() {
        let cert = CertificateDer::from_pem(ROOT_PEM).unwrap();
        assert_eq!(cert.as_bytes(), ROOT_DER);
    }

    #[test]
    fn test_wrong_pem_tag() {
        let key = pem::encode(&pem::Pem::new("PUBLIC KEY", vec![1, 2, 3]));
        assert!(CertificateDer::from_pem(&key).is_err());
        assert!(parse_certificates(key.as_bytes()).is_err());
    }

    #[test]
    fn test_bundle_keeps_order() {
        let bundle = format!("{}\n{}", INTER_PEM, ROOT_PEM);
        let certs = parse_certificates(bundle.as_bytes()).unwrap();
        assert_eq!(certs.len(), 2);
        assert_eq!(certs[1].as_bytes(), ROOT_DER);
    }

    #[test]
    fn test_der_passthrough() {
        let certs = parse_certificates(ROOT_DER).unwrap();
        assert_eq!(certs, vec![CertificateDer::new(ROOT_DER.to_vec())]);
        assert!(parse_certificates(&[]).is_err());
    }

    #[test]
    fn test_pem_roundtrip() {
        let cert = CertificateDer::new(ROOT_DER.to_vec());
        assert_eq!(CertificateDer::from_pem(&cert.to_pem()).unwrap(), cert);
    }
}
