//! Trust root configuration

use serde::{Deserialize, Serialize};

/// Default address of the national root certificate repository
pub const DEFAULT_ROOT_URL: &str = "http://depo.kamusm.gov.tr/depo/SertifikaDeposu.xml";

/// Settings for resolver selection, timeouts, refresh period and overlays.
///
/// Every field has a default so partial documents deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustRootConfig {
    /// `kamusm-online`, `kamusm-offline` or `certificate-folder`
    pub resolver: String,
    pub root_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    /// Supplementary certificate bundle (PEM or DER)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_store_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_store_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_root_cert_path: Option<String>,
}

impl Default for TrustRootConfig {
    fn default() -> Self {
        Self {
            resolver: "kamusm-online".to_string(),
            root_url: DEFAULT_ROOT_URL.to_string(),
            offline_path: None,
            folder_path: None,
            connect_timeout_secs: 5,
            read_timeout_secs: 10,
            refresh_interval_secs: 24 * 60 * 60,
            cert_store_path: None,
            cert_store_password: None,
            custom_root_cert_path: None,
        }
    }
}
