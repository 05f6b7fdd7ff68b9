//! Immutable trusted root snapshots

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use docverify_crypto::{sha256, ParsedCertificate};

/// One fully built generation of trust data.
///
/// `roots` are the certificates of the primary source. `anchors` adds the
/// overlay and runtime certificates, deduplicated by SHA-256 fingerprint.
/// A snapshot is never modified after construction.
#[derive(Debug, Clone)]
pub struct TrustedRootSnapshot {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub source: String,
    roots: Vec<ParsedCertificate>,
    anchors: Vec<ParsedCertificate>,
    fingerprints: HashSet<[u8; 32]>,
}

impl TrustedRootSnapshot {
    pub fn new(
        version: u64,
        source: impl Into<String>,
        roots: Vec<ParsedCertificate>,
        extra: impl IntoIterator<Item = ParsedCertificate>,
    ) -> Self {
        let mut fingerprints = HashSet::new();
        let mut anchors = Vec::new();
        for cert in roots.iter().cloned().chain(extra) {
            if fingerprints.insert(*cert.fingerprint()) {
                anchors.push(cert);
            }
        }

        Self {
            version,
            loaded_at: Utc::now(),
            source: source.into(),
            roots,
            anchors,
            fingerprints,
        }
    }

    /// A snapshot with no certificates at all
    pub fn empty() -> Self {
        Self::new(0, "", Vec::new(), Vec::new())
    }

    /// Certificates of the primary source
    pub fn roots(&self) -> &[ParsedCertificate] {
        &self.roots
    }

    /// Every certificate trusted as an anchor
    pub fn anchors(&self) -> &[ParsedCertificate] {
        &self.anchors
    }

    /// Exact membership of a DER certificate in the anchor set
    pub fn contains_der(&self, der: &[u8]) -> bool {
        self.fingerprints.contains(&sha256(der))
    }

    pub fn contains(&self, cert: &ParsedCertificate) -> bool {
        self.fingerprints.contains(cert.fingerprint())
    }
}
