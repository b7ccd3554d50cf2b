use tracing::{info, warn};

use crate::errors::SpeculaError;
use crate::evidence::collectors::EvidenceCollectors;
use crate::utils::url::host_of;

/// Outcome of the advisory preflight check.
#[derive(Debug, Clone)]
pub enum Preflight {
    /// Hostname resolved; mission proceeds with these addresses known.
    Passed { addresses: Vec<String> },
    /// The check itself could not run. Preflight is advisory, not a
    /// guarantee: the mission proceeds with a logged warning.
    Advisory(String),
}

/// Confirm the target hostname exists via a public resolver, without any
/// direct fetch to the target (no CORS-style noise at this stage).
///
/// Hard failures: a confirmed non-existent hostname aborts the mission.
/// Soft failures: an unreachable resolver downgrades to advisory.
pub async fn run_preflight(
    collectors: &dyn EvidenceCollectors,
    target: &str,
) -> Result<Preflight, SpeculaError> {
    let host = host_of(target)
        .ok_or_else(|| SpeculaError::InvalidTarget(format!("no hostname in '{}'", target)))?;

    match collectors.collect_dns(&host).await {
        Ok(evidence) if evidence.addresses.is_empty() => Err(SpeculaError::DnsResolution(format!(
            "'{}' does not resolve to any address",
            host
        ))),
        Ok(evidence) => {
            info!(host = %host, addresses = ?evidence.addresses, "Preflight DNS check passed");
            Ok(Preflight::Passed {
                addresses: evidence.addresses,
            })
        }
        Err(failure) => {
            warn!(host = %host, reason = %failure.reason, "Preflight check could not run, proceeding");
            Ok(Preflight::Advisory(failure.reason))
        }
    }
}
