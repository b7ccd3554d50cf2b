use std::collections::HashSet;

use tracing::debug;

use crate::models::probe::ProbePlan;
use crate::utils::url::{host_of, is_private_host, normalize_path_key, resolve_endpoint, same_host};
use super::paths::static_probes;

/// Merge engine-suggested probes with the static sensitive-path table,
/// resolve every endpoint against the target, and keep only endpoints on
/// the target's own hostname. Off-target, localhost and private-IP
/// endpoints are rejected to avoid false-positive noise from unrelated
/// origins. Deduplicated by method + normalized path; engine suggestions
/// win over static entries since they are target-specific.
pub fn plan_probes(suggested: &[ProbePlan], target: &str, max_probes: usize) -> Vec<ProbePlan> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut planned: Vec<ProbePlan> = Vec::new();

    let candidates = suggested
        .iter()
        .cloned()
        .chain(static_probes());

    for mut probe in candidates {
        let resolved = match resolve_endpoint(target, &probe.endpoint) {
            Some(url) => url,
            None => {
                debug!(endpoint = %probe.endpoint, "Dropping unresolvable probe endpoint");
                continue;
            }
        };
        if !same_host(&resolved, target) {
            debug!(endpoint = %resolved, "Dropping off-target probe endpoint");
            continue;
        }
        if host_of(&resolved).map(|h| is_private_host(&h)).unwrap_or(true) {
            debug!(endpoint = %resolved, "Dropping private-host probe endpoint");
            continue;
        }

        let key = format!("{} {}", probe.method.as_str(), normalize_path_key(&resolved));
        if !seen.insert(key) {
            continue;
        }

        probe.endpoint = resolved;
        planned.push(probe);
        if planned.len() >= max_probes {
            break;
        }
    }

    planned
}
