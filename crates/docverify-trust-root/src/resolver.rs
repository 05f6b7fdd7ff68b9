//! Root resolver capability and selection

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use docverify_crypto::ParsedCertificate;

use crate::config::TrustRootConfig;
use crate::error::Result;
use crate::file::FileResolver;
use crate::folder::FolderResolver;
use crate::network::NetworkResolver;
use crate::overlay::OverlayConfig;
use crate::path::normalize_path;

/// A source of root certificates.
///
/// `fetch_roots` performs the I/O of one refresh. It returns an error when the
/// source is unavailable and an empty list when the source holds nothing
/// usable; the store treats both as a failed refresh.
pub trait RootResolver: Send + Sync {
    /// Configuration name of the strategy (`kamusm-online`, ...)
    fn name(&self) -> &'static str;

    /// URL or path being read, for logs and snapshots
    fn source(&self) -> String;

    fn fetch_roots(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ParsedCertificate>>> + Send + '_>>;

    /// Overlays applied on top of every successful load
    fn overlay(&self) -> &OverlayConfig;
}

/// Resolver strategies selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    Online,
    Offline,
    Folder,
}

impl ResolverKind {
    /// Parse a configured name, case-insensitively.
    ///
    /// Unknown names fall back to [`ResolverKind::Online`] with a warning.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "kamusm-online" => ResolverKind::Online,
            "kamusm-offline" => ResolverKind::Offline,
            "certificate-folder" | "folder" => ResolverKind::Folder,
            other => {
                tracing::warn!("unknown resolver '{}', using kamusm-online", other);
                ResolverKind::Online
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverKind::Online => "kamusm-online",
            ResolverKind::Offline => "kamusm-offline",
            ResolverKind::Folder => "certificate-folder",
        }
    }
}

/// Build the resolver selected by `config`
pub fn build_resolver(config: &TrustRootConfig) -> Result<Arc<dyn RootResolver>> {
    let overlay = OverlayConfig::from_config(config);
    let kind = ResolverKind::parse_lenient(&config.resolver);
    tracing::info!("using {} root resolver", kind.as_str());

    let resolver: Arc<dyn RootResolver> = match kind {
        ResolverKind::Online => Arc::new(NetworkResolver::new(
            normalize_path(&config.root_url),
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.read_timeout_secs),
            overlay,
        )?),
        ResolverKind::Offline => Arc::new(FileResolver::new(
            config.offline_path.as_deref().map(normalize_path).unwrap_or_default(),
            overlay,
        )),
        ResolverKind::Folder => Arc::new(FolderResolver::new(
            config.folder_path.as_deref().map(normalize_path).unwrap_or_default(),
            overlay,
        )),
    };
    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(ResolverKind::parse_lenient("KAMUSM-OFFLINE"), ResolverKind::Offline);
        assert_eq!(ResolverKind::parse_lenient("folder"), ResolverKind::Folder);
        assert_eq!(ResolverKind::parse_lenient(" certificate-folder "), ResolverKind::Folder);
        assert_eq!(ResolverKind::parse_lenient("ldap"), ResolverKind::Online);
        assert_eq!(ResolverKind::parse_lenient(""), ResolverKind::Online);
    }

    #[test]
    fn test_build_selects_strategy() {
        let config = TrustRootConfig {
            resolver: "kamusm-offline".to_string(),
            offline_path: Some("'/opt/depo.xml'".to_string()),
            ..Default::default()
        };
        let resolver = build_resolver(&config).unwrap();
        assert_eq!(resolver.name(), "kamusm-offline");
        assert_eq!(resolver.source(), "/opt/depo.xml");

        let resolver = build_resolver(&TrustRootConfig::default()).unwrap();
        assert_eq!(resolver.name(), "kamusm-online");
        assert!(resolver.overlay().is_empty());
    }
}
