//! Cycle-safe issuer chain traversal
//!
//! The walker only asks "who issued this certificate?" and never validates
//! anything. It is generic over the certificate and lookup types so it can run
//! over parsed X.509 certificates as well as over an engine's certificate
//! graph.

use std::collections::HashSet;

use docverify_types::{CertificateSummary, ChainLink, ChainReport, ChainRole, ChainStatus};

/// Maximum number of certificates in a walked chain, leaf included
pub const MAX_CHAIN_DEPTH: usize = 10;

/// A certificate as seen by the chain walker
pub trait ChainCertificate: Clone {
    /// Stable identity used for cycle detection
    fn identity(&self) -> String;

    fn is_self_signed(&self) -> bool;

    /// Distinguished name of the expected issuer
    fn issuer_name(&self) -> String;
}

/// Source of issuer certificates
pub trait IssuerLookup<C> {
    fn find_issuer(&self, cert: &C) -> Option<C>;
}

/// Outcome of [`walk_chain`]
#[derive(Debug, Clone)]
pub struct ChainWalk<C> {
    /// Leaf first
    pub certificates: Vec<C>,
    pub status: ChainStatus,
    pub cycle_detected: bool,
    pub missing_issuer: Option<String>,
}

/// Walk from `leaf` towards its root.
///
/// Stops with `COMPLETE` on a self-signed certificate or when the next issuer
/// was already visited (the cycle is treated as reaching a root), with
/// `BROKEN` when no issuer can be found, and with `TRUNCATED` once
/// [`MAX_CHAIN_DEPTH`] certificates have been collected.
pub fn walk_chain<C, L>(leaf: C, lookup: &L) -> ChainWalk<C>
where
    C: ChainCertificate,
    L: IssuerLookup<C> + ?Sized,
{
    let mut visited = HashSet::new();
    visited.insert(leaf.identity());
    let mut current = leaf.clone();
    let mut certificates = vec![leaf];

    loop {
        if current.is_self_signed() {
            return ChainWalk::finish(certificates, ChainStatus::Complete, false, None);
        }

        if certificates.len() >= MAX_CHAIN_DEPTH {
            tracing::debug!("chain walk truncated at {} certificates", MAX_CHAIN_DEPTH);
            return ChainWalk::finish(certificates, ChainStatus::Truncated, false, None);
        }

        let Some(issuer) = lookup.find_issuer(&current) else {
            let missing = current.issuer_name();
            tracing::debug!("issuer not found: {}", missing);
            return ChainWalk::finish(certificates, ChainStatus::Broken, false, Some(missing));
        };

        if !visited.insert(issuer.identity()) {
            tracing::debug!("issuer cycle detected, treating last certificate as root");
            return ChainWalk::finish(certificates, ChainStatus::Complete, true, None);
        }

        certificates.push(issuer.clone());
        current = issuer;
    }
}

impl<C> ChainWalk<C> {
    fn finish(
        certificates: Vec<C>,
        status: ChainStatus,
        cycle_detected: bool,
        missing_issuer: Option<String>,
    ) -> Self {
        Self {
            certificates,
            status,
            cycle_detected,
            missing_issuer,
        }
    }

    /// Role of the certificate at `index`
    pub fn role(&self, index: usize) -> ChainRole {
        let is_last = index + 1 == self.certificates.len();
        if is_last && self.status == ChainStatus::Complete {
            ChainRole::Root
        } else if index == 0 {
            ChainRole::EndEntity
        } else {
            ChainRole::Intermediate
        }
    }

    /// Convert into a report, summarizing every certificate
    pub fn to_report<F>(&self, mut summarize: F) -> ChainReport
    where
        F: FnMut(&C) -> CertificateSummary,
    {
        let links = self
            .certificates
            .iter()
            .enumerate()
            .map(|(i, cert)| ChainLink {
                role: self.role(i),
                certificate: summarize(cert),
            })
            .collect();

        ChainReport {
            status: self.status,
            cycle_detected: self.cycle_detected,
            missing_issuer: self.missing_issuer.clone(),
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    struct FakeCert {
        name: String,
        issuer: String,
    }

    impl FakeCert {
        fn new(name: &str, issuer: &str) -> Self {
            Self {
                name: name.to_string(),
                issuer: issuer.to_string(),
            }
        }
    }

    impl ChainCertificate for FakeCert {
        fn identity(&self) -> String {
            self.name.clone()
        }

        fn is_self_signed(&self) -> bool {
            self.name == self.issuer
        }

        fn issuer_name(&self) -> String {
            format!("CN={}", self.issuer)
        }
    }

    struct Graph(HashMap<String, FakeCert>);

    impl Graph {
        fn new(certs: &[FakeCert]) -> Self {
            Graph(certs.iter().map(|c| (c.name.clone(), c.clone())).collect())
        }
    }

    impl IssuerLookup<FakeCert> for Graph {
        fn find_issuer(&self, cert: &FakeCert) -> Option<FakeCert> {
            self.0.get(&cert.issuer).cloned()
        }
    }

    fn names(walk: &ChainWalk<FakeCert>) -> Vec<&str> {
        walk.certificates.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_complete_chain() {
        let graph = Graph::new(&[
            FakeCert::new("inter", "root"),
            FakeCert::new("root", "root"),
        ]);
        let walk = walk_chain(FakeCert::new("leaf", "inter"), &graph);
        assert_eq!(walk.status, ChainStatus::Complete);
        assert!(!walk.cycle_detected);
        assert_eq!(names(&walk), vec!["leaf", "inter", "root"]);
        assert_eq!(walk.role(0), ChainRole::EndEntity);
        assert_eq!(walk.role(1), ChainRole::Intermediate);
        assert_eq!(walk.role(2), ChainRole::Root);
    }

    #[test]
    fn test_self_signed_leaf() {
        let walk = walk_chain(FakeCert::new("root", "root"), &Graph::new(&[]));
        assert_eq!(walk.status, ChainStatus::Complete);
        assert_eq!(walk.certificates.len(), 1);
        assert_eq!(walk.role(0), ChainRole::Root);
    }

    #[test]
    fn test_broken_chain_records_expected_issuer() {
        let graph = Graph::new(&[FakeCert::new("inter", "Missing Root")]);
        let walk = walk_chain(FakeCert::new("leaf", "inter"), &graph);
        assert_eq!(walk.status, ChainStatus::Broken);
        assert_eq!(walk.missing_issuer.as_deref(), Some("CN=Missing Root"));
        assert_eq!(names(&walk), vec!["leaf", "inter"]);
        assert_eq!(walk.role(1), ChainRole::Intermediate);
    }

    #[test]
    fn test_three_certificate_cycle_terminates() {
        let graph = Graph::new(&[
            FakeCert::new("a", "b"),
            FakeCert::new("b", "c"),
            FakeCert::new("c", "a"),
        ]);
        let walk = walk_chain(FakeCert::new("a", "b"), &graph);
        assert_eq!(walk.status, ChainStatus::Complete);
        assert!(walk.cycle_detected);
        assert_eq!(names(&walk), vec!["a", "b", "c"]);
        assert!(walk.certificates.len() <= MAX_CHAIN_DEPTH);

        let report = walk.to_report(|c| CertificateSummary {
            subject: c.name.clone(),
            ..Default::default()
        });
        assert_eq!(report.links[2].role, ChainRole::Root);
        assert!(report.cycle_detected);
    }

    #[test]
    fn test_eleven_issuers_truncate_at_ceiling() {
        // leaf -> i1 -> ... -> i11, none self-signed
        let mut certs = Vec::new();
        for i in 1..=11 {
            certs.push(FakeCert::new(&format!("i{}", i), &format!("i{}", i + 1)));
        }
        let graph = Graph::new(&certs);
        let walk = walk_chain(FakeCert::new("leaf", "i1"), &graph);
        assert_eq!(walk.status, ChainStatus::Truncated);
        assert_eq!(walk.certificates.len(), MAX_CHAIN_DEPTH);
        assert!(!walk.cycle_detected);
        assert!(walk.missing_issuer.is_none());
        assert_eq!(walk.role(MAX_CHAIN_DEPTH - 1), ChainRole::Intermediate);
    }
}
