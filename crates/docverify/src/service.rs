//! Verification service facade
//!
//! [`VerificationService`] is what a transport layer talks to. It owns the
//! trust anchor store and its refresh task, enforces the upload ceiling and
//! input rules before anything is parsed, and hands the work to the
//! signature orchestrator and the timestamp verifier.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use docverify_trust_root::{
    build_resolver, spawn_refresh_task, RefreshOutcome, TrustAnchorStore, TrustQuery,
};
use docverify_tsa::{RevocationChecker, TimestampVerifier, VerifyOpts};
use docverify_types::{TimestampReport, VerificationLevel, VerificationReport};
use docverify_verify::{SignatureVerifier, ValidationEngine};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::VerifierConfig;
use crate::error::{Error, Result};

pub const APPLICATION_NAME: &str = "docverify";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A signed document submitted for verification
#[derive(Debug, Clone, Default)]
pub struct SignatureVerificationRequest {
    pub document: Vec<u8>,
    /// Original content for detached signatures
    pub detached_content: Option<Vec<u8>>,
    pub document_name: Option<String>,
    /// `SIMPLE` or `COMPREHENSIVE`, any case; anything else means `SIMPLE`
    pub level: Option<String>,
}

impl SignatureVerificationRequest {
    pub fn new(document: impl Into<Vec<u8>>) -> Self {
        Self {
            document: document.into(),
            ..Default::default()
        }
    }

    pub fn with_detached_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.detached_content = Some(content.into());
        self
    }

    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

/// A timestamp token submitted for verification
#[derive(Debug, Clone)]
pub struct TimestampVerificationRequest {
    pub token: Vec<u8>,
    pub original_data: Option<Vec<u8>>,
    pub validate_certificate: bool,
}

impl TimestampVerificationRequest {
    pub fn new(token: impl Into<Vec<u8>>) -> Self {
        Self {
            token: token.into(),
            original_data: None,
            validate_certificate: true,
        }
    }

    pub fn with_original_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.original_data = Some(data.into());
        self
    }

    pub fn with_certificate_validation(mut self, enabled: bool) -> Self {
        self.validate_certificate = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// `UP` once trust data is loaded
    pub status: String,
    pub application: String,
    pub version: String,
    pub resolver: String,
    pub trusted_root_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub features: Vec<String>,
}

/// Interpret a requested level; unknown values fall back to `SIMPLE`
pub fn parse_level(level: Option<&str>) -> VerificationLevel {
    match level.map(str::trim).filter(|l| !l.is_empty()) {
        None => VerificationLevel::Simple,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("unknown verification level '{}', using SIMPLE", raw);
            VerificationLevel::Simple
        }),
    }
}

pub struct VerificationService {
    config: VerifierConfig,
    store: Arc<TrustAnchorStore>,
    signatures: SignatureVerifier,
    timestamps: TimestampVerifier,
    refresh_task: JoinHandle<()>,
}

impl VerificationService {
    /// Load trust anchors and start the periodic refresh.
    ///
    /// Fails when the configuration is invalid or when the first load finds
    /// no trust data at all.
    pub async fn start(config: VerifierConfig, engine: Arc<dyn ValidationEngine>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(TrustAnchorStore::new(build_resolver(&config.trust_root)?));
        match store.refresh().await? {
            RefreshOutcome::Updated { count, version } => {
                tracing::info!("loaded {} trusted roots (version {})", count, version)
            }
            other => tracing::warn!("initial trust root load: {:?}", other),
        }

        let period = Duration::from_secs(config.trust_root.refresh_interval_secs);
        let refresh_task = spawn_refresh_task(store.clone(), period);

        let signatures = SignatureVerifier::new(engine)
            .with_online_validation(config.online_validation_enabled)
            .with_detailed_logging(config.detailed_report_logging);
        let trust: Arc<dyn TrustQuery> = store.clone();
        let timestamps =
            TimestampVerifier::new(trust).with_online_validation(config.online_validation_enabled);

        tracing::info!(
            "{} {} started with {} resolver, refresh every {}s",
            APPLICATION_NAME,
            VERSION,
            store.resolver_name(),
            period.as_secs()
        );

        Ok(Self {
            config,
            store,
            signatures,
            timestamps,
            refresh_task,
        })
    }

    /// Use `checker` for TSA certificate revocation lookups
    pub fn with_revocation_checker(mut self, checker: Arc<dyn RevocationChecker>) -> Self {
        self.timestamps = self.timestamps.clone().with_revocation_checker(checker);
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn trust_store(&self) -> &Arc<TrustAnchorStore> {
        &self.store
    }

    pub async fn verify_signature(
        &self,
        request: SignatureVerificationRequest,
    ) -> Result<VerificationReport> {
        self.check_upload("document", &request.document)?;
        if let Some(content) = &request.detached_content {
            self.check_size(content.len())?;
        }

        let level = parse_level(request.level.as_deref());
        let anchors = self.store.anchors();
        let verifier = self.signatures.clone();
        tracing::debug!(
            "verifying {} ({} bytes) at level {}",
            request.document_name.as_deref().unwrap_or("document"),
            request.document.len(),
            level
        );

        let report = tokio::task::spawn_blocking(move || {
            let mut engine_request =
                docverify_verify::SignatureRequest::new(&request.document).with_level(level);
            if let Some(content) = request.detached_content.as_deref() {
                engine_request = engine_request.with_detached_content(content);
            }
            if let Some(name) = request.document_name.as_deref() {
                engine_request = engine_request.with_document_name(name);
            }
            verifier.verify(&engine_request, anchors)
        })
        .await
        .map_err(|e| Error::Internal(format!("signature verification task failed: {}", e)))??;

        Ok(report)
    }

    pub async fn verify_timestamp(
        &self,
        request: TimestampVerificationRequest,
    ) -> Result<TimestampReport> {
        self.check_upload("timestamp token", &request.token)?;
        if let Some(data) = &request.original_data {
            self.check_size(data.len())?;
        }

        let mut opts =
            VerifyOpts::new().with_certificate_validation(request.validate_certificate);
        if let Some(data) = request.original_data.as_deref() {
            opts = opts.with_original_data(data);
        }
        Ok(self.timestamps.verify(&request.token, opts).await)
    }

    /// Reload trust anchors now
    pub async fn refresh_trust_roots(&self) -> Result<RefreshOutcome> {
        Ok(self.store.refresh().await?)
    }

    /// Trust a certificate until the process exits
    pub fn add_trusted_certificate(&self, der: &[u8]) -> Result<()> {
        Ok(self.store.add_trusted_certificate(der)?)
    }

    pub fn health(&self) -> HealthStatus {
        let snapshot = self.store.snapshot();
        HealthStatus {
            status: if snapshot.is_some() { "UP" } else { "DOWN" }.to_string(),
            application: APPLICATION_NAME.to_string(),
            version: VERSION.to_string(),
            resolver: self.store.resolver_name().to_string(),
            trusted_root_count: snapshot.as_ref().map(|s| s.roots().len()).unwrap_or(0),
            snapshot_version: snapshot.as_ref().map(|s| s.version),
            last_refresh: snapshot.as_ref().map(|s| s.loaded_at),
        }
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            name: APPLICATION_NAME.to_string(),
            version: VERSION.to_string(),
            description: "Electronic signature and timestamp verification".to_string(),
            features: [
                "PAdES verification",
                "XAdES verification",
                "CAdES verification",
                "RFC 3161 timestamp verification",
                "Certificate chain diagnostics",
                "Scheduled trust root refresh",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        }
    }

    fn check_upload(&self, what: &str, bytes: &[u8]) -> Result<()> {
        self.check_size(bytes.len())?;
        if bytes.is_empty() {
            return Err(Error::InvalidArgument(format!("{} is empty", what)));
        }
        Ok(())
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.config.max_upload_bytes {
            return Err(Error::FileTooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }
        Ok(())
    }
}

impl Drop for VerificationService {
    fn drop(&mut self) {
        self.refresh_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing_is_lenient() {
        assert_eq!(parse_level(None), VerificationLevel::Simple);
        assert_eq!(parse_level(Some("")), VerificationLevel::Simple);
        assert_eq!(parse_level(Some("comprehensive")), VerificationLevel::Comprehensive);
        assert_eq!(parse_level(Some(" COMPREHENSIVE ")), VerificationLevel::Comprehensive);
        assert_eq!(parse_level(Some("DETAILED")), VerificationLevel::Simple);
    }

    #[test]
    fn test_timestamp_request_defaults() {
        let request = TimestampVerificationRequest::new(vec![1, 2, 3]);
        assert!(request.validate_certificate);
        assert!(request.original_data.is_none());
        assert!(!request.with_certificate_validation(false).validate_certificate);
    }
}
