//! Certificate handling for docverify
//!
//! Parsing of X.509 certificates from PEM or DER, the certificate summary
//! extractor used by every report, a cycle-safe chain walker and the digest
//! functions used for message imprints, all backed by aws-lc-rs and the
//! RustCrypto `x509-cert` stack.

pub mod chain;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod x509;

pub use chain::{walk_chain, ChainCertificate, ChainWalk, IssuerLookup, MAX_CHAIN_DEPTH};
pub use encoding::{parse_certificates, CertificateDer};
pub use error::{Error, Result};
pub use hash::{digest, sha1, sha256, sha384, sha512};
pub use x509::{extract_summary, serial_to_hex, CertificatePool, ParsedCertificate};
