use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use specula::config::{CredentialProvider, Intensity, SpeculaConfig};
use specula::engine::provider::{AnalysisRequest, EngineAnalysis, ReasoningEngine};
use specula::errors::{MissionErrorKind, SpeculaError};
use specula::evidence::bundle::{
    CollectorFailure, DnsEvidence, DomEvidence, EvidenceSource, HeaderEvidence, OsintEvidence,
    TlsEvidence,
};
use specula::evidence::collectors::EvidenceCollectors;
use specula::mission::{LaunchOptions, MissionOrchestrator};
use specula::models::mission::{MissionPhase, MissionStatus};
use specula::models::probe::HttpMethod;
use specula::models::report::UsageTotals;
use specula::probes::executor::{ProbeTransport, TransportResponse};

const VALID_KEY: &str = "AIzaXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX";

struct Key(Option<&'static str>);

impl CredentialProvider for Key {
    fn api_key(&self) -> Option<String> {
        self.0.map(String::from)
    }
}

/// Collectors with per-slot programmable success. OSINT attempts counted to
/// observe the automatic retry.
struct MockCollectors {
    dom: bool,
    headers: bool,
    tls: bool,
    dns: Option<Vec<String>>,
    osint: bool,
    osint_attempts: AtomicU32,
}

impl MockCollectors {
    fn all_ok() -> Self {
        Self {
            dom: true,
            headers: true,
            tls: true,
            dns: Some(vec!["93.184.216.34".into()]),
            osint: true,
            osint_attempts: AtomicU32::new(0),
        }
    }

    fn all_failing() -> Self {
        Self {
            dom: false,
            headers: false,
            tls: false,
            dns: None,
            osint: false,
            osint_attempts: AtomicU32::new(0),
        }
    }

    fn dns_only() -> Self {
        Self {
            dns: Some(vec!["93.184.216.34".into()]),
            ..Self::all_failing()
        }
    }
}

#[async_trait]
impl EvidenceCollectors for MockCollectors {
    async fn collect_dom(&self, _target: &str) -> Result<DomEvidence, CollectorFailure> {
        if self.dom {
            Ok(DomEvidence {
                text: "<html><title>Shop</title></html>".into(),
                title: Some("Shop".into()),
                script_sources: vec!["/js/react.production.min.js".into()],
                meta_generator: None,
            })
        } else {
            Err(CollectorFailure::new(EvidenceSource::Dom, "blocked by cross-origin policy"))
        }
    }

    async fn collect_headers(&self, _target: &str) -> Result<HeaderEvidence, CollectorFailure> {
        if self.headers {
            Ok(HeaderEvidence::default())
        } else {
            Err(CollectorFailure::new(EvidenceSource::Headers, "request timed out"))
        }
    }

    async fn collect_tls(&self, _host: &str) -> Result<TlsEvidence, CollectorFailure> {
        if self.tls {
            Ok(TlsEvidence {
                grade: "A".into(),
                hsts: true,
                notes: "HTTPS with HSTS".into(),
            })
        } else {
            Err(CollectorFailure::new(EvidenceSource::Tls, "handshake failed"))
        }
    }

    async fn collect_dns(&self, _host: &str) -> Result<DnsEvidence, CollectorFailure> {
        match &self.dns {
            Some(addresses) => Ok(DnsEvidence {
                addresses: addresses.clone(),
                resolver: "mock".into(),
            }),
            None => Err(CollectorFailure::new(EvidenceSource::Dns, "resolver unreachable")),
        }
    }

    async fn collect_osint(&self, _host: &str) -> Result<OsintEvidence, CollectorFailure> {
        self.osint_attempts.fetch_add(1, Ordering::SeqCst);
        if self.osint {
            Ok(OsintEvidence {
                summary: "one related host".into(),
                discovered_hosts: vec!["api.example.com".into()],
                sources: vec![],
            })
        } else {
            Err(CollectorFailure::new(EvidenceSource::Osint, "lookup failed"))
        }
    }
}

enum EngineBehavior {
    Document(Value),
    RateLimited,
    BadCredential,
}

struct MockEngine {
    behavior: EngineBehavior,
    calls: AtomicU32,
}

impl MockEngine {
    fn with_document(document: Value) -> Self {
        Self {
            behavior: EngineBehavior::Document(document),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ReasoningEngine for MockEngine {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<EngineAnalysis, SpeculaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            EngineBehavior::Document(doc) => Ok(EngineAnalysis {
                document: doc.clone(),
                usage: UsageTotals {
                    input_tokens: 1_000,
                    output_tokens: 200,
                    total_tokens: 1_200,
                },
            }),
            EngineBehavior::RateLimited => Err(SpeculaError::RateLimit(
                "reasoning service rate limit reached".into(),
            )),
            EngineBehavior::BadCredential => Err(SpeculaError::Credential(
                "reasoning service rejected the API key".into(),
            )),
        }
    }

    fn engine_name(&self) -> &str {
        "mock"
    }
}

/// Uniform transport: every URL answers with the configured status, or
/// fails entirely when none is configured.
struct UniformTransport {
    status: Option<u16>,
}

#[async_trait]
impl ProbeTransport for UniformTransport {
    async fn fetch(
        &self,
        _method: HttpMethod,
        _url: &str,
        _payload: Option<&str>,
        _timeout: Duration,
    ) -> Result<TransportResponse, String> {
        match self.status {
            Some(status) => Ok(TransportResponse {
                status,
                body: "ok".into(),
                opaque: false,
            }),
            None => Err("connection refused".into()),
        }
    }

    async fn check_existence(&self, _url: &str, _timeout: Duration) -> Result<u16, String> {
        self.status.ok_or_else(|| "connection refused".into())
    }
}

fn fast_config() -> SpeculaConfig {
    let mut config = SpeculaConfig::default();
    config.engine.cooldown_ms = 0;
    config.finalize_delay_ms = 0;
    config.probes.inter_batch_delay_ms = 0;
    config.probes.timeout_ms = 50;
    config.collectors.osint_retry_delay_ms = 0;
    config
}

fn engine_document() -> Value {
    json!({
        "targetIntelligence": {
            "purpose": "Demo storefront",
            "businessLogic": "Sells widgets",
            "attackSurfaceSummary": "Public API plus admin panel",
            "forensicAnalysis": "No anomalies",
            "apis": ["/api/users"],
            "associatedLinks": [],
            "hosting": {"provider": "ExampleCloud", "location": "EU", "ip": "93.184.216.34"}
        },
        "activeProbes": [{
            "method": "GET",
            "endpoint": "/api/users",
            "description": "User listing exposure check",
            "expectedBehavior": "Should require authentication; expect 401"
        }],
        "technologyDNA": [{
            "name": "React", "version": "18.2", "category": "frontend",
            "status": "current", "actionPlan": "Keep updated"
        }],
        "findings": [{
            "title": "Unauthenticated user listing",
            "description": "The endpoint /api/users returns data without credentials",
            "severity": "high",
            "remediation": "Require authentication",
            "businessImpact": "User data exposure",
            "cwe": "CWE-306",
            "origin": "ai-analysis",
            "poc": "GET /api/users",
            "confidence": "medium",
            "evidence": ["headers"]
        }],
        "securityScore": 55,
        "confidenceScore": 70
    })
}

fn orchestrator(
    collectors: MockCollectors,
    engine: MockEngine,
    transport: UniformTransport,
    key: Option<&'static str>,
) -> (MissionOrchestrator, Arc<MockCollectors>, Arc<MockEngine>) {
    let collectors = Arc::new(collectors);
    let engine = Arc::new(engine);
    let orchestrator = MissionOrchestrator::new(
        fast_config(),
        Arc::new(Key(key)),
        collectors.clone(),
        engine.clone(),
        Arc::new(transport),
    );
    (orchestrator, collectors, engine)
}

#[tokio::test]
async fn test_degraded_mission_still_reaches_debriefing() {
    // P1: every collector fails and every probe fails, yet the mission must
    // terminate in Debriefing with a bounded trust score.
    let (orch, _, _) = orchestrator(
        MockCollectors::all_failing(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: None },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Deep, LaunchOptions::default()).await;

    let state = orch.snapshot().await;
    assert_eq!(state.phase, MissionPhase::Debriefing);
    assert!(state.error.is_none());
    let report = state.report.expect("degraded mission still produces a report");
    assert!(report.data_quality.trust_score <= 100);
    // All sources failed
    assert!(!report.data_quality.sources.dom);
    assert!(!report.data_quality.sources.osint);
    assert!(!report.data_quality.limitations.is_empty());
    // Floor bound: reasoning alone keeps the score low but nonzero
    assert!(report.data_quality.trust_score <= 30);
}

#[tokio::test]
async fn test_full_success_trust_score() {
    let (orch, _, _) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Deep, LaunchOptions::default()).await;

    let report = orch.report().await.expect("report");
    let dq = &report.data_quality;
    assert!(dq.sources.dom && dq.sources.headers && dq.sources.tls && dq.sources.dns && dq.sources.osint);
    assert!(dq.probes_executed > 0);
    assert_eq!(dq.probes_executed, dq.probes_succeeded);
    // Exact value of the weighted formula with every source present and a
    // perfect probe success rate.
    assert_eq!(dq.trust_score, 76);
    // Probe-confirmed finding survives verification
    assert_eq!(report.findings.len(), 1);
}

#[tokio::test]
async fn test_fast_scenario_dns_only() {
    // Scenario: FAST intensity, only DNS succeeds, target otherwise dark.
    let (orch, collectors, _) = orchestrator(
        MockCollectors::dns_only(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: None },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Fast, LaunchOptions::default()).await;

    let state = orch.snapshot().await;
    assert_eq!(state.phase, MissionPhase::Debriefing);
    let report = state.report.expect("report");
    assert!(!report.data_quality.sources.dom);
    assert!(report.data_quality.sources.dns);
    // FAST never attempts OSINT
    assert_eq!(collectors.osint_attempts.load(Ordering::SeqCst), 0);
    // No probes survive (target dark), so the score is reasoning + DNS:
    // (3*85 + 1*50) / 15 = 20
    assert_eq!(report.data_quality.probes_succeeded, 0);
    assert_eq!(report.data_quality.trust_score, 20);
}

#[tokio::test]
async fn test_osint_retried_once_at_standard() {
    let (orch, collectors, _) = orchestrator(
        MockCollectors::all_failing(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: None },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;
    assert_eq!(collectors.osint_attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_api_key_fails_fast() {
    let (orch, _, engine) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: Some(200) },
        None,
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;

    let state = orch.snapshot().await;
    assert_eq!(state.phase, MissionPhase::Briefing);
    assert_eq!(state.status, MissionStatus::Idle);
    assert_eq!(state.progress, 0);
    let error = state.error.expect("error surfaced");
    assert_eq!(error.kind, MissionErrorKind::ApiKey);
    // Fails before any engine traffic
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_key_distinct_from_missing() {
    let (orch, _, _) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: Some(200) },
        Some("AIzaTooShort"),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;
    let error = orch.snapshot().await.error.expect("error");
    assert_eq!(error.kind, MissionErrorKind::ApiKey);
    assert!(error.message.contains("malformed"));
}

#[tokio::test]
async fn test_invalid_target_format_aborts() {
    let (orch, _, engine) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("not a url", Intensity::Standard, LaunchOptions::default()).await;

    let error = orch.snapshot().await.error.expect("error");
    assert_eq!(error.kind, MissionErrorKind::InvalidFormat);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_nxdomain_aborts_mission() {
    let mut collectors = MockCollectors::all_ok();
    collectors.dns = Some(vec![]); // resolves to nothing: confirmed non-existent
    let (orch, _, _) = orchestrator(
        collectors,
        MockEngine::with_document(engine_document()),
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://nosuch.example", Intensity::Standard, LaunchOptions::default()).await;

    let state = orch.snapshot().await;
    assert_eq!(state.phase, MissionPhase::Briefing);
    assert_eq!(state.error.expect("error").kind, MissionErrorKind::DnsFailed);
}

#[tokio::test]
async fn test_rate_limit_surfaces_with_hint() {
    let (orch, _, _) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine {
            behavior: EngineBehavior::RateLimited,
            calls: AtomicU32::new(0),
        },
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;

    let state = orch.snapshot().await;
    assert_eq!(state.phase, MissionPhase::Briefing);
    assert_eq!(state.progress, 0);
    let error = state.error.expect("error");
    assert_eq!(error.kind, MissionErrorKind::RateLimit);
    assert!(error.retry_hint.is_some());
    // Telemetry retains the failure trail
    let telemetry = orch.telemetry_snapshot().await;
    assert!(!telemetry.is_empty());
}

#[tokio::test]
async fn test_bad_credential_from_engine() {
    let (orch, _, _) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine {
            behavior: EngineBehavior::BadCredential,
            calls: AtomicU32::new(0),
        },
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;
    assert_eq!(
        orch.snapshot().await.error.expect("error").kind,
        MissionErrorKind::ApiKey
    );
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    // P6: two consecutive resets observe identical state.
    let (orch, _, _) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;
    assert!(orch.report().await.is_some());

    orch.reset().await;
    let first = serde_json::to_value(orch.snapshot().await).unwrap();
    let first_telemetry = orch.telemetry_snapshot().await;

    orch.reset().await;
    let second = serde_json::to_value(orch.snapshot().await).unwrap();

    assert_eq!(first, second);
    assert!(first_telemetry.is_empty());
    assert_eq!(first["phase"], "briefing");
    assert_eq!(first["status"], "idle");
    assert_eq!(first["progress"], 0);
    assert!(first["report"].is_null());
}

#[tokio::test]
async fn test_relaunch_after_reset() {
    let (orch, _, engine) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;
    orch.reset().await;
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;

    assert_eq!(orch.snapshot().await.phase, MissionPhase::Debriefing);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_clear_error_keeps_telemetry() {
    let (orch, _, _) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine {
            behavior: EngineBehavior::RateLimited,
            calls: AtomicU32::new(0),
        },
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;
    assert!(orch.snapshot().await.error.is_some());

    orch.clear_error().await;
    let state = orch.snapshot().await;
    assert!(state.error.is_none());
    assert_eq!(state.phase, MissionPhase::Briefing);
    assert_eq!(state.status, MissionStatus::Idle);
    assert!(!orch.telemetry_snapshot().await.is_empty());
}

#[tokio::test]
async fn test_usage_accumulated_into_state() {
    let (orch, _, _) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine::with_document(engine_document()),
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;

    let state = orch.snapshot().await;
    assert_eq!(state.usage.total_tokens, 1_200);
    assert_eq!(state.report.unwrap().usage.total_tokens, 1_200);
}

#[tokio::test]
async fn test_ground_truth_technology_survives_merge() {
    // DOM fingerprint finds React deterministically; the engine also claims
    // React plus PostgreSQL. The merged list keeps one React entry marked
    // ground truth.
    let (orch, _, _) = orchestrator(
        MockCollectors::all_ok(),
        MockEngine::with_document(json!({
            "technologyDNA": [
                {"name": "react", "version": "18.2", "category": "frontend", "status": "current"},
                {"name": "PostgreSQL", "category": "database"}
            ],
            "securityScore": 50, "confidenceScore": 50
        })),
        UniformTransport { status: Some(200) },
        Some(VALID_KEY),
    );
    orch.launch("https://example.com", Intensity::Standard, LaunchOptions::default()).await;

    let report = orch.report().await.expect("report");
    let react: Vec<_> = report
        .technologies
        .iter()
        .filter(|t| t.name.to_lowercase() == "react")
        .collect();
    assert_eq!(react.len(), 1);
    assert!(react[0].ground_truth);
    assert!(report.technologies.iter().any(|t| t.name == "PostgreSQL"));
}
