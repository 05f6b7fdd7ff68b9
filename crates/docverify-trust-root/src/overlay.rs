//! Certificates layered on top of a resolver's primary source
//!
//! Two optional overlays exist: a supplementary keystore and a single
//! custom root. Both join the trusted source after every successful
//! primary load. A failing overlay is logged and never invalidates the
//! primary load.

use std::path::{Path, PathBuf};

use docverify_crypto::{parse_certificates, ParsedCertificate};
use p12_keystore::{KeyStore, KeyStoreEntry};

use crate::config::TrustRootConfig;
use crate::error::{Error, Result};
use crate::path::{normalize_path, to_filesystem_path};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayConfig {
    /// PKCS#12 keystore, PEM bundle or a single DER certificate
    pub keystore_path: Option<PathBuf>,
    /// Opens a PKCS#12 keystore; an absent password is the empty one
    pub keystore_password: Option<String>,
    pub custom_root_path: Option<PathBuf>,
}

impl OverlayConfig {
    pub fn from_config(config: &TrustRootConfig) -> Self {
        let location = |raw: &Option<String>| {
            raw.as_deref()
                .map(normalize_path)
                .filter(|p| !p.is_empty())
                .map(|p| to_filesystem_path(&p))
        };
        Self {
            keystore_path: location(&config.cert_store_path),
            keystore_password: config.cert_store_password.clone(),
            custom_root_path: location(&config.custom_root_cert_path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keystore_path.is_none() && self.custom_root_path.is_none()
    }

    /// Load every overlay certificate that can be loaded
    pub async fn load(&self) -> Vec<ParsedCertificate> {
        let mut certs = Vec::new();

        if let Some(path) = &self.keystore_path {
            match load_keystore(path, self.keystore_password.as_deref().unwrap_or_default()).await {
                Ok(bundle) => {
                    tracing::info!("loaded {} certificates from keystore {}", bundle.len(), path.display());
                    certs.extend(bundle);
                }
                Err(e) => tracing::warn!("could not load keystore {}: {}", path.display(), e),
            }
        }

        if let Some(path) = &self.custom_root_path {
            match load_single(path).await {
                Ok(cert) => {
                    tracing::info!("loaded custom root {}", cert.subject());
                    certs.push(cert);
                }
                Err(e) => tracing::error!("could not load custom root {}: {}", path.display(), e),
            }
        }

        certs
    }
}

async fn load_keystore(path: &Path, password: &str) -> Result<Vec<ParsedCertificate>> {
    let bytes = tokio::fs::read(path).await?;
    match KeyStore::from_pkcs12(&bytes, password) {
        Ok(store) => keystore_certificates(&store),
        // Not PKCS#12 at all: a PEM bundle or a DER certificate
        Err(p12_keystore::error::Error::DerError(_)) => parse_bundle(&bytes),
        Err(e) => Err(Error::Keystore(e.to_string())),
    }
}

/// Trusted certificate entries plus the chains of key entries
fn keystore_certificates(store: &KeyStore) -> Result<Vec<ParsedCertificate>> {
    let mut certs = Vec::new();
    for (alias, entry) in store.entries() {
        let ders: Vec<&[u8]> = match entry {
            KeyStoreEntry::Certificate(cert) => vec![cert.as_der()],
            KeyStoreEntry::PrivateKeyChain(chain) => {
                chain.chain().iter().map(|cert| cert.as_der()).collect()
            }
        };
        for der in ders {
            match ParsedCertificate::from_der(der) {
                Ok(cert) if !certs.contains(&cert) => certs.push(cert),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping keystore entry '{}': {}", alias, e),
            }
        }
    }

    if certs.is_empty() {
        return Err(Error::Keystore("no certificate entries".to_string()));
    }
    Ok(certs)
}

fn parse_bundle(bytes: &[u8]) -> Result<Vec<ParsedCertificate>> {
    parse_certificates(bytes)?
        .into_iter()
        .map(|der| ParsedCertificate::from_certificate_der(der).map_err(Error::from))
        .collect()
}

async fn load_single(path: &Path) -> Result<ParsedCertificate> {
    let bytes = tokio::fs::read(path).await?;
    let first = parse_certificates(&bytes)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Certificate(format!("{} holds no certificate", path.display())))?;
    Ok(ParsedCertificate::from_certificate_der(first)?)
}
