//! Repository fetch over HTTP

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use docverify_crypto::ParsedCertificate;

use crate::error::{Error, Result};
use crate::overlay::OverlayConfig;
use crate::path::to_filesystem_path;
use crate::repository::parse_repository_xml;
use crate::resolver::RootResolver;

/// Fetches the repository XML from a URL.
///
/// `file:` URLs are read from disk instead. A whole fetch, body included,
/// is bounded by the connect and read timeouts combined, so a server that
/// trickles bytes cannot hold a refresh open.
pub struct NetworkResolver {
    url: String,
    client: reqwest::Client,
    overlay: OverlayConfig,
}

impl NetworkResolver {
    pub fn new(
        url: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
        overlay: OverlayConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .timeout(connect_timeout + read_timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            overlay,
        })
    }

    async fn fetch_body(&self) -> Result<String> {
        if self.url.starts_with("file:") {
            let path = to_filesystem_path(&self.url);
            tracing::debug!("reading repository from {}", path.display());
            return Ok(tokio::fs::read_to_string(&path).await?);
        }

        tracing::debug!("fetching repository from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!("repository returned status {}", response.status());
            return Ok(String::new());
        }

        response.text().await.map_err(|e| Error::Http(e.to_string()))
    }
}

impl RootResolver for NetworkResolver {
    fn name(&self) -> &'static str {
        "kamusm-online"
    }

    fn source(&self) -> String {
        self.url.clone()
    }

    fn fetch_roots(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ParsedCertificate>>> + Send + '_>> {
        Box::pin(async move {
            let body = self.fetch_body().await?;
            if body.trim().is_empty() {
                tracing::warn!("repository at {} returned no content", self.url);
                return Ok(Vec::new());
            }
            parse_repository_xml(&body)
        })
    }

    fn overlay(&self) -> &OverlayConfig {
        &self.overlay
    }
}
