use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use crate::models::finding::{Finding, VerificationStatus};
use crate::models::report::MissionReport;
use crate::utils::url::{resolve_endpoint, same_host};
use super::executor::ProbeTransport;

/// Existence classification for one endpoint re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    Exists,
    /// 401/403: the endpoint exists behind auth. Never grounds for removal.
    Protected,
    NotFound,
    Error,
}

pub fn classify_existence(status: u16) -> EndpointStatus {
    match status {
        401 | 403 => EndpointStatus::Protected,
        404 | 410 => EndpointStatus::NotFound,
        _ => EndpointStatus::Exists,
    }
}

impl EndpointStatus {
    /// Whether a reference to this endpoint invalidates its referrer.
    fn invalidates(&self) -> bool {
        matches!(self, EndpointStatus::NotFound | EndpointStatus::Error)
    }
}

/// Filesystem-looking paths that show up inside PoC text but are not web
/// endpoints of the target.
const EXCLUDED_PATH_PREFIXES: &[&str] =
    &["/etc/", "/var/", "/usr/", "/tmp/", "/home/", "/bin/", "/proc/", "/dev/"];

/// Re-check every unique endpoint referenced across findings, the probe
/// list and the API list with a lightweight existence probe, then prune
/// entries whose endpoints confirmably do not exist. 401/403 responses
/// confirm existence and never trigger removal.
pub async fn verify_report(
    transport: &dyn ProbeTransport,
    target: &str,
    report: &mut MissionReport,
    timeout: Duration,
) -> usize {
    // Gather unique same-host URLs to check, keyed by resolved URL.
    let mut candidates: Vec<String> = Vec::new();
    let mut push_candidate = |endpoint: &str| {
        if let Some(url) = resolve_endpoint(target, endpoint) {
            if same_host(&url, target) && !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    };

    for finding in &report.findings {
        for endpoint in extract_endpoint_refs(finding) {
            push_candidate(&endpoint);
        }
    }
    for api in &report.target_intelligence.apis {
        push_candidate(api);
    }
    for probe in &report.probes {
        push_candidate(&probe.plan.endpoint);
    }

    let mut statuses: HashMap<String, EndpointStatus> = HashMap::new();
    for url in &candidates {
        let status = match transport.check_existence(url, timeout).await {
            Ok(code) => classify_existence(code),
            Err(reason) => {
                debug!(endpoint = %url, reason = %reason, "Existence check failed");
                EndpointStatus::Error
            }
        };
        statuses.insert(url.clone(), status);
    }

    let lookup = |endpoint: &str| -> Option<EndpointStatus> {
        resolve_endpoint(target, endpoint).and_then(|url| statuses.get(&url).copied())
    };

    // Findings: removed only when every checkable referenced endpoint is
    // not_found/error. Unreferenced findings stay, marked unverified.
    let before = report.findings.len();
    report.findings.retain_mut(|finding| {
        let refs: Vec<EndpointStatus> = extract_endpoint_refs(finding)
            .iter()
            .filter_map(|e| lookup(e))
            .collect();
        if refs.is_empty() {
            finding.verification = Some(VerificationStatus::Unverified);
            return true;
        }
        if refs.iter().all(EndpointStatus::invalidates) {
            debug!(title = %finding.title, "Discarding finding: referenced endpoint does not exist");
            return false;
        }
        finding.verification = Some(if refs.contains(&EndpointStatus::Exists) {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Protected
        });
        true
    });
    let removed = before - report.findings.len();

    report
        .target_intelligence
        .apis
        .retain(|api| !lookup(api).map(|s| s.invalidates()).unwrap_or(false));

    report
        .probes
        .retain(|probe| !lookup(&probe.plan.endpoint).map(|s| s.invalidates()).unwrap_or(false));

    info!(
        checked = candidates.len(),
        removed_findings = removed,
        "Finding verification complete"
    );
    removed
}

/// Endpoint references inside a finding: absolute URLs and path tokens in
/// the title, description and PoC text.
fn extract_endpoint_refs(finding: &Finding) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    let text = format!("{} {} {}", finding.title, finding.description, finding.poc);

    let url_re = regex::Regex::new(r#"https?://[^\s"'<>)]+"#).unwrap();
    for m in url_re.find_iter(&text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';']).to_string();
        if !refs.contains(&url) {
            refs.push(url);
        }
    }

    let path_re = regex::Regex::new(r#"(?:^|[\s"'`(])(/[A-Za-z0-9_\-][A-Za-z0-9_\-./]*)"#).unwrap();
    for caps in path_re.captures_iter(&text) {
        let path = caps[1].trim_end_matches(['.', ',', ';']).to_string();
        if path.len() < 2 {
            continue;
        }
        if EXCLUDED_PATH_PREFIXES.iter().any(|p| path.starts_with(p)) {
            continue;
        }
        if !refs.contains(&path) {
            refs.push(path);
        }
    }

    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    use crate::config::Intensity;
    use crate::models::finding::{Confidence, Severity};
    use crate::models::probe::{DispatchedProbe, HttpMethod, ProbePlan};
    use crate::models::report::{DataQuality, TargetIntelligence, UsageTotals};
    use crate::probes::executor::TransportResponse;

    struct ExistenceMock {
        statuses: HashMap<String, u16>,
    }

    #[async_trait]
    impl ProbeTransport for ExistenceMock {
        async fn fetch(
            &self,
            _method: HttpMethod,
            _url: &str,
            _payload: Option<&str>,
            _timeout: Duration,
        ) -> Result<TransportResponse, String> {
            Err("not used".into())
        }

        async fn check_existence(&self, url: &str, _timeout: Duration) -> Result<u16, String> {
            self.statuses
                .get(url)
                .copied()
                .ok_or_else(|| "unreachable".into())
        }
    }

    fn finding_referencing(endpoint: &str) -> Finding {
        Finding {
            title: "Broken authentication".into(),
            description: format!("The login endpoint {} accepts weak credentials", endpoint),
            severity: Severity::High,
            cwe: "CWE-287".into(),
            remediation: "Enforce strong authentication".into(),
            business_impact: "Account takeover".into(),
            poc: format!("POST {} with guessed credentials", endpoint),
            confidence: Confidence::Medium,
            evidence: vec!["headers".into()],
            origin: "ai-analysis".into(),
            verification: None,
        }
    }

    fn report_with(findings: Vec<Finding>) -> MissionReport {
        MissionReport {
            mission_id: "m-1".into(),
            target: "https://example.com".into(),
            intensity: Intensity::Standard,
            generated_at: Utc::now(),
            target_intelligence: TargetIntelligence::default(),
            probes: vec![],
            technologies: vec![],
            findings,
            security_score: 50,
            confidence_score: 50,
            usage: UsageTotals::default(),
            data_quality: DataQuality::default(),
        }
    }

    #[tokio::test]
    async fn test_not_found_endpoint_removes_finding() {
        let transport = ExistenceMock {
            statuses: HashMap::from([("https://example.com/api/auth/login".to_string(), 404)]),
        };
        let mut report = report_with(vec![finding_referencing("/api/auth/login")]);
        let removed = verify_report(&transport, "https://example.com", &mut report, Duration::from_millis(10)).await;
        assert_eq!(removed, 1);
        assert!(report.findings.is_empty());
    }

    #[tokio::test]
    async fn test_protected_endpoint_retains_finding() {
        let transport = ExistenceMock {
            statuses: HashMap::from([("https://example.com/api/auth/login".to_string(), 403)]),
        };
        let mut report = report_with(vec![finding_referencing("/api/auth/login")]);
        let removed = verify_report(&transport, "https://example.com", &mut report, Duration::from_millis(10)).await;
        assert_eq!(removed, 0);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].verification, Some(VerificationStatus::Protected));
    }

    #[tokio::test]
    async fn test_existing_endpoint_marks_verified() {
        let transport = ExistenceMock {
            statuses: HashMap::from([("https://example.com/api/auth/login".to_string(), 200)]),
        };
        let mut report = report_with(vec![finding_referencing("/api/auth/login")]);
        verify_report(&transport, "https://example.com", &mut report, Duration::from_millis(10)).await;
        assert_eq!(report.findings[0].verification, Some(VerificationStatus::Verified));
    }

    #[tokio::test]
    async fn test_unreferenced_finding_kept_unverified() {
        let transport = ExistenceMock { statuses: HashMap::new() };
        let mut finding = finding_referencing("/x");
        finding.description = "Missing security headers weaken browser protections".into();
        finding.poc = "Observe response headers".into();
        finding.title = "Missing security headers".into();
        let mut report = report_with(vec![finding]);
        verify_report(&transport, "https://example.com", &mut report, Duration::from_millis(10)).await;
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].verification, Some(VerificationStatus::Unverified));
    }

    #[tokio::test]
    async fn test_api_list_and_probes_pruned() {
        let transport = ExistenceMock {
            statuses: HashMap::from([
                ("https://example.com/api/real".to_string(), 200),
                ("https://example.com/api/ghost".to_string(), 404),
            ]),
        };
        let mut report = report_with(vec![]);
        report.target_intelligence.apis =
            vec!["/api/real".to_string(), "/api/ghost".to_string()];
        report.probes = vec![DispatchedProbe {
            plan: ProbePlan {
                method: HttpMethod::Get,
                endpoint: "https://example.com/api/ghost".into(),
                payload: None,
                description: "d".into(),
                expected_behavior: "e".into(),
            },
            status: Some(200),
            latency_ms: 5,
            response_length: 10,
            suspicious: false,
            cors_blocked: false,
            error: None,
        }];

        verify_report(&transport, "https://example.com", &mut report, Duration::from_millis(10)).await;
        assert_eq!(report.target_intelligence.apis, vec!["/api/real".to_string()]);
        assert!(report.probes.is_empty());
    }

    #[test]
    fn test_extract_endpoint_refs_filters_filesystem_paths() {
        let mut finding = finding_referencing("/api/users");
        finding.poc = "curl https://example.com/api/users then read /etc/passwd".into();
        let refs = extract_endpoint_refs(&finding);
        assert!(refs.iter().any(|r| r == "/api/users"));
        assert!(refs.iter().any(|r| r == "https://example.com/api/users"));
        assert!(!refs.iter().any(|r| r.contains("/etc/")));
    }
}
