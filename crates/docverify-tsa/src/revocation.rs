//! Revocation lookups for TSA certificates
//!
//! OCSP and CRL clients live outside this crate. They plug in through
//! [`RevocationChecker`]; the verifier only interprets their answers.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use docverify_crypto::ParsedCertificate;

use crate::error::Result;

/// Where a revocation answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationSource {
    Ocsp,
    Crl,
}

impl RevocationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationSource::Ocsp => "OCSP",
            RevocationSource::Crl => "CRL",
        }
    }
}

impl fmt::Display for RevocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationStatus {
    Good,
    Revoked {
        reason: Option<String>,
        time: Option<DateTime<Utc>>,
    },
    /// The responder does not know the certificate
    Unknown,
}

/// An OCSP/CRL client.
///
/// `issuer` is the certificate that issued `cert` when the token carries it.
/// An `Err` means the lookup itself failed, which callers report as a
/// warning.
pub trait RevocationChecker: Send + Sync {
    fn check<'a>(
        &'a self,
        source: RevocationSource,
        cert: &'a ParsedCertificate,
        issuer: Option<&'a ParsedCertificate>,
    ) -> Pin<Box<dyn Future<Output = Result<RevocationStatus>> + Send + 'a>>;
}

/// Findings of the OCSP and CRL lookups for one certificate
#[derive(Debug, Default)]
pub(crate) struct RevocationFindings {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub revoked: Option<(Option<String>, Option<DateTime<Utc>>)>,
}

/// Ask OCSP, then CRL. Each lookup is independent: a failing OCSP responder
/// does not stop the CRL lookup.
pub(crate) async fn check_revocation(
    checker: &dyn RevocationChecker,
    cert: &ParsedCertificate,
    issuer: Option<&ParsedCertificate>,
) -> RevocationFindings {
    let mut findings = RevocationFindings::default();

    for source in [RevocationSource::Ocsp, RevocationSource::Crl] {
        match checker.check(source, cert, issuer).await {
            Ok(RevocationStatus::Good) => {
                tracing::debug!("{} reports TSA certificate good", source);
            }
            Ok(RevocationStatus::Revoked { reason, time }) => {
                tracing::warn!("{} reports TSA certificate {} revoked", source, cert.subject());
                findings.errors.push(format!(
                    "TSA certificate is revoked ({}){}",
                    source,
                    reason
                        .as_ref()
                        .map(|r| format!(": {}", r))
                        .unwrap_or_default()
                ));
                if findings.revoked.is_none() {
                    findings.revoked = Some((reason, time));
                }
            }
            Ok(RevocationStatus::Unknown) => {
                tracing::debug!("{} does not know the TSA certificate", source);
            }
            Err(e) => {
                tracing::warn!("{} lookup failed: {}", source, e);
                findings.warnings.push(format!(
                    "could not check revocation status of TSA certificate ({}): {}",
                    source, e
                ));
            }
        }
    }

    findings
}
