//! Debug dump of an engine report

use chrono::{DateTime, Utc};
use docverify_crypto::walk_chain;
use docverify_types::{ChainRole, ChainStatus};

use crate::engine::{EngineCertificate, EngineReport};

fn role_label(role: ChainRole) -> &'static str {
    match role {
        ChainRole::EndEntity => "END-ENTITY",
        ChainRole::Intermediate => "INTERMEDIATE",
        ChainRole::Root => "ROOT",
    }
}

fn describe(cert: &EngineCertificate) -> String {
    match cert.parsed() {
        Some(parsed) => format!(
            "{} [serial {}, issuer {}]",
            parsed.subject(),
            parsed.serial_hex(),
            parsed.issuer()
        ),
        None => format!("{} [unparseable]", cert.id),
    }
}

/// Log every signature of `report` with its chain and the certificates the
/// engine used, at debug level
pub fn log_detailed_report(report: &EngineReport, now: DateTime<Utc>) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    tracing::debug!(
        "engine report: {} signatures, {} certificates, at {}",
        report.signatures.len(),
        report.certificates.len(),
        now.to_rfc3339()
    );

    for sig in &report.signatures {
        tracing::debug!(
            "signature {}: indication={} sub={} format={} signing_time={}",
            sig.id,
            sig.indication,
            sig.sub_indication.as_deref().unwrap_or("-"),
            sig.format.as_deref().unwrap_or("-"),
            sig.signing_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        );

        let Some(leaf) = sig
            .signing_certificate_id
            .as_deref()
            .and_then(|id| report.certificate(id))
        else {
            tracing::debug!("  no signing certificate reported");
            continue;
        };

        let walk = walk_chain(leaf.clone(), report);
        for (i, cert) in walk.certificates.iter().enumerate() {
            tracing::debug!("  {} {}", role_label(walk.role(i)), describe(cert));
        }
        match walk.status {
            ChainStatus::Complete if walk.cycle_detected => {
                tracing::debug!("  chain complete (issuer cycle)")
            }
            ChainStatus::Complete => tracing::debug!("  chain complete"),
            ChainStatus::Broken => tracing::debug!(
                "  BROKEN: issuer {} not found",
                walk.missing_issuer.as_deref().unwrap_or("unknown")
            ),
            ChainStatus::Truncated => tracing::debug!("  chain truncated at maximum depth"),
        }
    }

    for cert in &report.certificates {
        let trust = if cert.trusted { "trusted" } else { "untrusted" };
        tracing::debug!("used certificate ({}): {}", trust, describe(cert));
    }
}
