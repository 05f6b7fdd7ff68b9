//! Trust anchor management for docverify
//!
//! Root certificates come from one of three interchangeable resolvers:
//!
//! - [`NetworkResolver`]: fetches the repository XML over HTTP (or a `file:` URL)
//! - [`FileResolver`]: reads the same XML from a local file
//! - [`FolderResolver`]: scans a directory for `.crt`, `.cer` and `.pem` files
//!
//! The [`TrustAnchorStore`] drives the active resolver, applies the optional
//! keystore and custom-root overlays and publishes immutable
//! [`TrustedRootSnapshot`]s. A failed refresh keeps the previous snapshot.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use docverify_trust_root::{build_resolver, spawn_refresh_task, TrustAnchorStore, TrustRootConfig};
//!
//! # async fn example() -> Result<(), docverify_trust_root::Error> {
//! let config = TrustRootConfig::default();
//! let store = Arc::new(TrustAnchorStore::new(build_resolver(&config)?));
//! store.refresh().await?;
//! let _task = spawn_refresh_task(store.clone(), Duration::from_secs(86400));
//! println!("{} trusted roots", store.roots().len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file;
pub mod folder;
pub mod network;
pub mod overlay;
pub mod path;
pub mod repository;
pub mod resolver;
pub mod schedule;
pub mod snapshot;
pub mod store;

pub use config::TrustRootConfig;
pub use error::{Error, Result};
pub use file::FileResolver;
pub use folder::FolderResolver;
pub use network::NetworkResolver;
pub use overlay::OverlayConfig;
pub use path::{normalize_path, to_filesystem_path};
pub use repository::parse_repository_xml;
pub use resolver::{build_resolver, ResolverKind, RootResolver};
pub use schedule::spawn_refresh_task;
pub use snapshot::TrustedRootSnapshot;
pub use store::{RefreshOutcome, TrustAnchorStore, TrustQuery};
