use crate::models::probe::DispatchedProbe;
use crate::models::report::{DataQuality, SourceFlags};

// Trust-score weights and success subscores. A deliberate heuristic, not a
// statistically derived model: the shape (weighted linear combination,
// bounded 0-100) is the contract; the constants are replaceable policy.
const W_OSINT: u32 = 3;
const W_REASONING: u32 = 3;
const W_PROBES: u32 = 3;
const W_DOM: u32 = 2;
const W_TLS: u32 = 2;
const W_HEADERS: u32 = 1;
const W_DNS: u32 = 1;

const SUB_OSINT: f64 = 90.0;
// Reasoning always "succeeds" if the mission reaches scoring at all.
const SUB_REASONING: f64 = 85.0;
const SUB_PROBES_MAX: f64 = 90.0;
const SUB_DOM: f64 = 60.0;
const SUB_TLS: f64 = 70.0;
const SUB_HEADERS: f64 = 30.0;
const SUB_DNS: f64 = 50.0;

/// Weighted trust score over which evidence slots succeeded plus the probe
/// success rate. Always in [0, 100].
pub fn trust_score(sources: &SourceFlags, probes_executed: usize, probes_succeeded: usize) -> u8 {
    let probe_rate = if probes_executed > 0 {
        probes_succeeded as f64 / probes_executed as f64
    } else {
        0.0
    };

    let weighted: f64 = [
        (W_OSINT, if sources.osint { SUB_OSINT } else { 0.0 }),
        (W_REASONING, SUB_REASONING),
        (W_PROBES, SUB_PROBES_MAX * probe_rate),
        (W_DOM, if sources.dom { SUB_DOM } else { 0.0 }),
        (W_TLS, if sources.tls { SUB_TLS } else { 0.0 }),
        (W_HEADERS, if sources.headers { SUB_HEADERS } else { 0.0 }),
        (W_DNS, if sources.dns { SUB_DNS } else { 0.0 }),
    ]
    .iter()
    .map(|(w, s)| *w as f64 * s)
    .sum();

    let total_weight: u32 = W_OSINT + W_REASONING + W_PROBES + W_DOM + W_TLS + W_HEADERS + W_DNS;
    (weighted / total_weight as f64).round().clamp(0.0, 100.0) as u8
}

/// Assemble the data-quality block attached to the final report. Computed
/// once at the Triage -> Debriefing transition, never mutated afterward.
pub fn build_data_quality(
    sources: SourceFlags,
    probes: &[DispatchedProbe],
    limitations: Vec<String>,
) -> DataQuality {
    let probes_executed = probes.len();
    let probes_succeeded = probes.iter().filter(|p| p.succeeded()).count();
    DataQuality {
        trust_score: trust_score(&sources, probes_executed, probes_succeeded),
        sources,
        probes_executed,
        probes_succeeded,
        limitations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_sources() -> SourceFlags {
        SourceFlags { dom: true, headers: true, tls: true, dns: true, osint: true }
    }

    #[test]
    fn test_all_success_full_probes() {
        // (3*90 + 3*85 + 3*90 + 2*60 + 2*70 + 1*30 + 1*50) / 15 = 1135/15
        assert_eq!(trust_score(&all_sources(), 10, 10), 76);
    }

    #[test]
    fn test_all_failed_no_probes_low_floor() {
        // Reasoning alone: 3*85 / 15 = 17
        let score = trust_score(&SourceFlags::default(), 0, 0);
        assert_eq!(score, 17);
        assert!(score <= 30);
    }

    #[test]
    fn test_dns_only_no_probes() {
        // (3*85 + 1*50) / 15 = 305/15 = 20.33 -> 20
        let sources = SourceFlags { dns: true, ..Default::default() };
        assert_eq!(trust_score(&sources, 0, 0), 20);
    }

    #[test]
    fn test_probe_rate_scales_subscore() {
        let sources = SourceFlags::default();
        let none = trust_score(&sources, 10, 0);
        let half = trust_score(&sources, 10, 5);
        let full = trust_score(&sources, 10, 10);
        assert!(none < half && half < full);
        // Full probe success adds 3*90/15 = 18 on top of the reasoning floor
        assert_eq!(full, 35);
    }

    #[test]
    fn test_score_always_bounded() {
        for executed in [0usize, 1, 7] {
            for succeeded in 0..=executed {
                let s = trust_score(&all_sources(), executed, succeeded);
                assert!(s <= 100);
            }
        }
    }

    #[test]
    fn test_monotone_in_sources() {
        let mut sources = SourceFlags::default();
        let base = trust_score(&sources, 0, 0);
        sources.dns = true;
        let with_dns = trust_score(&sources, 0, 0);
        sources.dom = true;
        let with_dom = trust_score(&sources, 0, 0);
        assert!(base < with_dns && with_dns < with_dom);
    }

    #[test]
    fn test_build_data_quality_counts_probe_outcomes() {
        use crate::models::probe::{DispatchedProbe, HttpMethod, ProbePlan};
        let plan = ProbePlan {
            method: HttpMethod::Get,
            endpoint: "https://example.com/x".into(),
            payload: None,
            description: "d".into(),
            expected_behavior: "e".into(),
        };
        let probes = vec![
            DispatchedProbe {
                plan: plan.clone(),
                status: Some(200),
                latency_ms: 1,
                response_length: 0,
                suspicious: false,
                cors_blocked: false,
                error: None,
            },
            DispatchedProbe {
                plan,
                status: None,
                latency_ms: 1,
                response_length: 0,
                suspicious: false,
                cors_blocked: false,
                error: Some("refused".into()),
            },
        ];
        let dq = build_data_quality(SourceFlags::default(), &probes, vec!["dom failed".into()]);
        assert_eq!(dq.probes_executed, 2);
        assert_eq!(dq.probes_succeeded, 1);
        assert_eq!(dq.limitations.len(), 1);
    }
}
