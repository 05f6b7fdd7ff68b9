//! Service configuration
//!
//! A [`VerifierConfig`] is built once at startup and handed to
//! [`VerificationService::start`](crate::VerificationService::start). It can
//! come from a JSON document, from the environment, or both: environment
//! variables override file values.

use std::path::Path;

use docverify_trust_root::TrustRootConfig;
use serde::{Deserialize, Serialize};

use crate::error::{megabytes, Error, Result};

/// Default upload ceiling for documents, detached content and tokens (200 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub const ENV_RESOLVER: &str = "DOCVERIFY_RESOLVER";
pub const ENV_ROOT_URL: &str = "DOCVERIFY_ROOT_URL";
pub const ENV_OFFLINE_PATH: &str = "DOCVERIFY_OFFLINE_PATH";
pub const ENV_FOLDER_PATH: &str = "DOCVERIFY_FOLDER_PATH";
pub const ENV_REFRESH_INTERVAL_SECS: &str = "DOCVERIFY_REFRESH_INTERVAL_SECS";
pub const ENV_CERT_STORE_PATH: &str = "DOCVERIFY_CERT_STORE_PATH";
pub const ENV_CERT_STORE_PASSWORD: &str = "DOCVERIFY_CERT_STORE_PASSWORD";
pub const ENV_CUSTOM_ROOT_CERT_PATH: &str = "DOCVERIFY_CUSTOM_ROOT_CERT_PATH";
pub const ENV_ONLINE_VALIDATION: &str = "DOCVERIFY_ONLINE_VALIDATION";
pub const ENV_MAX_UPLOAD_BYTES: &str = "DOCVERIFY_MAX_UPLOAD_BYTES";

/// Top-level service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifierConfig {
    pub trust_root: TrustRootConfig,
    /// Revocation lookups for TSA certificates; also passed to the engine
    pub online_validation_enabled: bool,
    pub max_upload_bytes: usize,
    /// Tracing filter directive, e.g. `docverify=debug`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    /// Dump every engine report at debug level
    pub detailed_report_logging: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            trust_root: TrustRootConfig::default(),
            online_validation_enabled: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_filter: None,
            detailed_report_logging: false,
        }
    }
}

impl VerifierConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid configuration: {}", e)))
    }

    /// Read a JSON configuration file and apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read configuration {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&json)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let tr = &mut self.trust_root;

        if let Some(v) = get(ENV_RESOLVER) {
            tr.resolver = v;
        }
        if let Some(v) = get(ENV_ROOT_URL) {
            tr.root_url = v;
        }
        if let Some(v) = get(ENV_OFFLINE_PATH) {
            tr.offline_path = Some(v);
        }
        if let Some(v) = get(ENV_FOLDER_PATH) {
            tr.folder_path = Some(v);
        }
        if let Some(v) = get(ENV_REFRESH_INTERVAL_SECS) {
            tr.refresh_interval_secs = parse_number(ENV_REFRESH_INTERVAL_SECS, &v)?;
        }
        if let Some(v) = get(ENV_CERT_STORE_PATH) {
            tr.cert_store_path = Some(v);
        }
        if let Some(v) = get(ENV_CERT_STORE_PASSWORD) {
            tr.cert_store_password = Some(v);
        }
        if let Some(v) = get(ENV_CUSTOM_ROOT_CERT_PATH) {
            tr.custom_root_cert_path = Some(v);
        }
        if let Some(v) = get(ENV_ONLINE_VALIDATION) {
            self.online_validation_enabled = parse_bool(ENV_ONLINE_VALIDATION, &v)?;
        }
        if let Some(v) = get(ENV_MAX_UPLOAD_BYTES) {
            self.max_upload_bytes = parse_number(ENV_MAX_UPLOAD_BYTES, &v)?;
        }
        Ok(())
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("maxUploadBytes must be positive".to_string()));
        }
        if self.trust_root.refresh_interval_secs == 0 {
            return Err(Error::Config(
                "trustRoot.refreshIntervalSecs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Upload ceiling as shown to callers, e.g. `200MB`
    pub fn max_upload_display(&self) -> String {
        megabytes(self.max_upload_bytes)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}
