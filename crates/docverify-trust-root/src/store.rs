//! Trust anchor store with atomic hot-swap
//!
//! The store owns one resolver and the current [`TrustedRootSnapshot`]. A
//! refresh builds a complete replacement off to the side and swaps the
//! reference; readers clone the `Arc` once per call and never observe a
//! partial update. A failed or empty refresh leaves the current snapshot in
//! place and records a warning.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use docverify_crypto::ParsedCertificate;

use crate::error::{Error, Result};
use crate::resolver::RootResolver;
use crate::snapshot::TrustedRootSnapshot;

/// Number of retained-refresh warnings kept for inspection
const MAX_WARNINGS: usize = 32;

/// Result of one refresh attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published
    Updated { count: usize, version: u64 },
    /// The previous snapshot was kept
    Retained { reason: String },
    /// Another refresh was already running; nothing was done
    Skipped,
}

/// Read access to the trusted certificate set
pub trait TrustQuery: Send + Sync {
    /// The trust set in force right now.
    ///
    /// A caller that needs several answers for one request reads this once
    /// and asks the returned snapshot.
    fn trust_set(&self) -> Arc<TrustedRootSnapshot>;

    /// Exact membership of a DER certificate in the anchor set
    fn is_trusted(&self, der: &[u8]) -> bool {
        self.trust_set().contains_der(der)
    }

    fn anchors(&self) -> Vec<ParsedCertificate> {
        self.trust_set().anchors().to_vec()
    }
}

pub struct TrustAnchorStore {
    resolver: Arc<dyn RootResolver>,
    current: RwLock<Option<Arc<TrustedRootSnapshot>>>,
    /// Certificates added through `add_trusted_certificate`
    runtime: RwLock<Vec<ParsedCertificate>>,
    refresh_lock: tokio::sync::Mutex<()>,
    warnings: Mutex<VecDeque<String>>,
    versions: AtomicU64,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl TrustAnchorStore {
    /// Create an empty store; call [`TrustAnchorStore::refresh`] to load it
    pub fn new(resolver: Arc<dyn RootResolver>) -> Self {
        Self {
            resolver,
            current: RwLock::new(None),
            runtime: RwLock::new(Vec::new()),
            refresh_lock: tokio::sync::Mutex::new(()),
            warnings: Mutex::new(VecDeque::new()),
            versions: AtomicU64::new(0),
        }
    }

    pub fn resolver_name(&self) -> &'static str {
        self.resolver.name()
    }

    /// Load roots from the resolver and publish a new snapshot.
    ///
    /// Runs at most once at a time: a call that finds a refresh in flight
    /// returns [`RefreshOutcome::Skipped`] without doing any I/O. Without a
    /// previous snapshot, a failure that leaves no trust data at all is
    /// returned as [`Error::InitialLoad`].
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            tracing::debug!("trust root refresh already in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        let source = self.resolver.source();
        tracing::debug!("refreshing trust roots from {} ({})", source, self.resolver.name());

        let reason = match self.resolver.fetch_roots().await {
            Ok(roots) if !roots.is_empty() => {
                let overlay = self.resolver.overlay().load().await;
                let snapshot = self.publish(source, roots, overlay);
                tracing::info!(
                    "trust roots updated: {} roots, {} anchors, version {}",
                    snapshot.roots().len(),
                    snapshot.anchors().len(),
                    snapshot.version
                );
                return Ok(RefreshOutcome::Updated {
                    count: snapshot.roots().len(),
                    version: snapshot.version,
                });
            }
            Ok(_) => format!("no root certificates loaded from {}", source),
            Err(e) => format!("trust root refresh from {} failed: {}", source, e),
        };

        if self.snapshot().is_some() {
            tracing::warn!("{}; keeping previous snapshot", reason);
            self.record_warning(reason.clone());
            return Ok(RefreshOutcome::Retained { reason });
        }

        // Cold start: overlays alone still count as trust data
        let overlay = self.resolver.overlay().load().await;
        if overlay.is_empty() && read(&self.runtime).is_empty() {
            tracing::error!("{}; no trust data available", reason);
            return Err(Error::InitialLoad(reason));
        }

        tracing::warn!("{}; starting with overlay certificates only", reason);
        self.record_warning(reason);
        let snapshot = self.publish(source, Vec::new(), overlay);
        Ok(RefreshOutcome::Updated {
            count: 0,
            version: snapshot.version,
        })
    }

    /// Build and swap in a snapshot. Runtime additions are read under the
    /// same lock `add_trusted_certificate` writes under, so none is lost.
    fn publish(
        &self,
        source: String,
        roots: Vec<ParsedCertificate>,
        overlay: Vec<ParsedCertificate>,
    ) -> Arc<TrustedRootSnapshot> {
        let runtime = read(&self.runtime);
        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(TrustedRootSnapshot::new(
            version,
            source,
            roots,
            overlay.into_iter().chain(runtime.iter().cloned()),
        ));
        *write(&self.current) = Some(snapshot.clone());
        snapshot
    }

    /// Add a certificate to the anchor set.
    ///
    /// The certificate stays trusted across later refreshes.
    pub fn add_trusted_certificate(&self, der: &[u8]) -> Result<()> {
        let cert = ParsedCertificate::from_der(der)?;
        let mut runtime = write(&self.runtime);
        if runtime.iter().any(|c| c == &cert) {
            return Ok(());
        }
        runtime.push(cert.clone());

        let mut current = write(&self.current);
        if let Some(existing) = current.as_ref() {
            let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
            let replacement = TrustedRootSnapshot::new(
                version,
                existing.source.clone(),
                existing.roots().to_vec(),
                existing.anchors().iter().cloned().chain(std::iter::once(cert.clone())),
            );
            *current = Some(Arc::new(replacement));
        }
        tracing::info!("added trusted certificate {}", cert.subject());
        Ok(())
    }

    /// The current snapshot, if any refresh has succeeded
    pub fn snapshot(&self) -> Option<Arc<TrustedRootSnapshot>> {
        read(&self.current).clone()
    }

    /// Roots of the primary source. Never performs I/O.
    pub fn roots(&self) -> Vec<ParsedCertificate> {
        self.snapshot()
            .map(|s| s.roots().to_vec())
            .unwrap_or_default()
    }

    /// Warnings of refreshes that kept the previous snapshot, oldest first
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn record_warning(&self, warning: String) {
        let mut warnings = self.warnings.lock().unwrap_or_else(PoisonError::into_inner);
        if warnings.len() == MAX_WARNINGS {
            warnings.pop_front();
        }
        warnings.push_back(warning);
    }
}

impl TrustQuery for TrustAnchorStore {
    /// An empty set before the first successful refresh
    fn trust_set(&self) -> Arc<TrustedRootSnapshot> {
        self.snapshot()
            .unwrap_or_else(|| Arc::new(TrustedRootSnapshot::empty()))
    }
}

impl TrustQuery for TrustedRootSnapshot {
    fn trust_set(&self) -> Arc<TrustedRootSnapshot> {
        Arc::new(self.clone())
    }
}
