//! Repository XML read from a local file

use std::future::Future;
use std::pin::Pin;

use docverify_crypto::ParsedCertificate;

use crate::error::{Error, Result};
use crate::overlay::OverlayConfig;
use crate::path::to_filesystem_path;
use crate::repository::parse_repository_xml;
use crate::resolver::RootResolver;

pub struct FileResolver {
    /// Normalized location, possibly with a `file:` prefix
    location: String,
    overlay: OverlayConfig,
}

impl FileResolver {
    pub fn new(location: impl Into<String>, overlay: OverlayConfig) -> Self {
        Self {
            location: location.into(),
            overlay,
        }
    }
}

impl RootResolver for FileResolver {
    fn name(&self) -> &'static str {
        "kamusm-offline"
    }

    fn source(&self) -> String {
        self.location.clone()
    }

    fn fetch_roots(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ParsedCertificate>>> + Send + '_>> {
        Box::pin(async move {
            if self.location.trim().is_empty() {
                return Err(Error::Config("offline repository path is not set".to_string()));
            }

            let path = to_filesystem_path(&self.location);
            let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
                Error::Config(format!("repository file {} not accessible: {}", path.display(), e))
            })?;
            if !metadata.is_file() {
                return Err(Error::Config(format!("{} is not a regular file", path.display())));
            }

            let xml = tokio::fs::read_to_string(&path).await?;
            parse_repository_xml(&xml)
        })
    }

    fn overlay(&self) -> &OverlayConfig {
        &self.overlay
    }
}
