//! Directory scan for certificate files

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use docverify_crypto::{parse_certificates, ParsedCertificate};

use crate::error::{Error, Result};
use crate::overlay::OverlayConfig;
use crate::path::to_filesystem_path;
use crate::resolver::RootResolver;

const EXTENSIONS: &[&str] = &[".crt", ".cer", ".pem"];

/// Loads every `.crt`, `.cer` and `.pem` file directly inside a directory.
///
/// The scan is not recursive. A PEM file may hold several certificates; any
/// other file is read as one DER certificate. Unreadable files are skipped.
pub struct FolderResolver {
    location: String,
    overlay: OverlayConfig,
}

impl FolderResolver {
    pub fn new(location: impl Into<String>, overlay: OverlayConfig) -> Self {
        Self {
            location: location.into(),
            overlay,
        }
    }
}

fn has_certificate_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            let lower = n.to_lowercase();
            EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        })
        .unwrap_or(false)
}

async fn load_file(path: &Path) -> Result<Vec<ParsedCertificate>> {
    let bytes = tokio::fs::read(path).await?;
    parse_certificates(&bytes)?
        .into_iter()
        .map(|der| ParsedCertificate::from_certificate_der(der).map_err(Error::from))
        .collect()
}

impl RootResolver for FolderResolver {
    fn name(&self) -> &'static str {
        "certificate-folder"
    }

    fn source(&self) -> String {
        self.location.clone()
    }

    fn fetch_roots(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ParsedCertificate>>> + Send + '_>> {
        Box::pin(async move {
            if self.location.trim().is_empty() {
                return Err(Error::Config("certificate folder path is not set".to_string()));
            }

            let dir = to_filesystem_path(&self.location);
            let metadata = tokio::fs::metadata(&dir).await.map_err(|e| {
                Error::Config(format!("certificate folder {} not accessible: {}", dir.display(), e))
            })?;
            if !metadata.is_dir() {
                return Err(Error::Config(format!("{} is not a directory", dir.display())));
            }

            let mut paths = Vec::new();
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
                if is_file && has_certificate_extension(&path) {
                    paths.push(path);
                }
            }
            paths.sort();

            let mut certificates = Vec::new();
            for path in paths {
                match load_file(&path).await {
                    Ok(certs) => {
                        tracing::debug!("loaded {} certificates from {}", certs.len(), path.display());
                        certificates.extend(certs);
                    }
                    Err(e) => tracing::warn!("skipping {}: {}", path.display(), e),
                }
            }

            tracing::info!(
                "loaded {} certificates from folder {}",
                certificates.len(),
                dir.display()
            );
            Ok(certificates)
        })
    }

    fn overlay(&self) -> &OverlayConfig {
        &self.overlay
    }
}
