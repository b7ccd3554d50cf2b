use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{validate_api_key, CredentialProvider, Intensity, SpeculaConfig};
use crate::engine::payload::build_payload;
use crate::engine::provider::{AnalysisRequest, ReasoningEngine};
use crate::engine::sanitize::sanitize_engine_report;
use crate::errors::{MissionError, SpeculaError};
use crate::evidence::bundle::EvidenceBundle;
use crate::evidence::collectors::EvidenceCollectors;
use crate::evidence::fingerprint::fingerprint_technologies;
use crate::mission::preflight::{run_preflight, Preflight};
use crate::mission::scoring::build_data_quality;
use crate::mission::state::MissionState;
use crate::mission::telemetry::{TelemetryEvent, TelemetryLevel, TelemetryLog};
use crate::models::mission::{MissionPhase, MissionStatus};
use crate::models::report::MissionReport;
use crate::models::technology::merge_technologies;
use crate::probes::executor::{ProbeExecutor, ProbeTransport};
use crate::probes::planner::plan_probes;
use crate::probes::verifier::verify_report;
use crate::utils::url::{host_of, normalize_target};

const RECON_INTEL_MAX_CHARS: usize = 4_000;

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Target language for report prose.
    pub language: String,
    /// Free-text authentication context forwarded to the reasoning engine.
    pub auth_context: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            auth_context: None,
        }
    }
}

/// Drives a mission from launch to terminal report, tolerating partial
/// failure at every step. All collaborators are injected; the orchestrator
/// owns the observable state and the telemetry log exclusively.
///
/// There is no mid-mission cancellation. `reset` only resets observable
/// state; in-flight work is not cancelled, so every state mutation is
/// guarded by a generation counter and a stale mission's late results are
/// discarded instead of corrupting a newer mission.
pub struct MissionOrchestrator {
    config: SpeculaConfig,
    credentials: Arc<dyn CredentialProvider>,
    collectors: Arc<dyn EvidenceCollectors>,
    engine: Arc<dyn ReasoningEngine>,
    transport: Arc<dyn ProbeTransport>,
    state: Arc<RwLock<MissionState>>,
    telemetry: Arc<RwLock<TelemetryLog>>,
    generation: AtomicU64,
}

impl MissionOrchestrator {
    pub fn new(
        config: SpeculaConfig,
        credentials: Arc<dyn CredentialProvider>,
        collectors: Arc<dyn EvidenceCollectors>,
        engine: Arc<dyn ReasoningEngine>,
        transport: Arc<dyn ProbeTransport>,
    ) -> Self {
        let telemetry = TelemetryLog::new(config.telemetry.capacity);
        Self {
            config,
            credentials,
            collectors,
            engine,
            transport,
            state: Arc::new(RwLock::new(MissionState::new())),
            telemetry: Arc::new(RwLock::new(telemetry)),
            generation: AtomicU64::new(0),
        }
    }

    /// Launch a mission. Never panics and never returns an error: failures
    /// surface as structured state (`phase` reset to Briefing, `error` set)
    /// for the caller to render.
    pub async fn launch(&self, target: &str, intensity: Intensity, options: LaunchOptions) {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match self.run_mission(gen, target, intensity, &options).await {
            Ok(report) => self.complete(gen, report).await,
            Err(e) => self.fail(gen, &e).await,
        }
    }

    /// Return all mission state to initial values. Safe to call from any
    /// phase; idempotent. Stale in-flight results are discarded via the
    /// generation bump.
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.write().await = MissionState::new();
        self.telemetry.write().await.clear();
        info!("Mission state reset");
    }

    /// Dismiss a surfaced error and return to Briefing/Idle. Telemetry is
    /// retained so the failure trail stays inspectable.
    pub async fn clear_error(&self) {
        let mut state = self.state.write().await;
        state.error = None;
        state.phase = MissionPhase::Briefing;
        state.status = MissionStatus::Idle;
        state.progress = 0;
    }

    pub async fn snapshot(&self) -> MissionState {
        self.state.read().await.clone()
    }

    pub async fn report(&self) -> Option<MissionReport> {
        self.state.read().await.report.clone()
    }

    pub async fn telemetry_snapshot(&self) -> Vec<TelemetryEvent> {
        self.telemetry.read().await.snapshot()
    }

    async fn run_mission(
        &self,
        gen: u64,
        target: &str,
        intensity: Intensity,
        options: &LaunchOptions,
    ) -> Result<MissionReport, SpeculaError> {
        // Credential gate: fails fast with an api_key classification before
        // any network call is made.
        validate_api_key(self.credentials.api_key().as_deref())?;

        let normalized = normalize_target(target)?;
        let mission_id = Uuid::new_v4().to_string();

        self.update(gen, |s| {
            *s = MissionState::new();
            s.phase = MissionPhase::Simulation;
            s.status = MissionStatus::Recon;
            s.progress = 2;
            s.mission_id = Some(mission_id.clone());
            s.target = Some(normalized.clone());
            s.intensity = Some(intensity);
            s.started_at = Some(Utc::now());
        })
        .await;
        self.record(gen, TelemetryLevel::Info, format!(
            "Mission {} launched against {} at {} intensity",
            mission_id, normalized, intensity
        ))
        .await;
        info!(mission_id = %mission_id, target = %normalized, intensity = %intensity, "Mission started");

        // Step 1: advisory preflight. Hard failures (bad format, confirmed
        // NXDOMAIN) abort; an unreachable resolver only warns.
        match run_preflight(self.collectors.as_ref(), &normalized).await? {
            Preflight::Passed { addresses } => {
                self.record(gen, TelemetryLevel::Info, format!(
                    "Preflight passed: target resolves to {}",
                    addresses.join(", ")
                ))
                .await;
            }
            Preflight::Advisory(reason) => {
                self.record(gen, TelemetryLevel::Warn, format!(
                    "Preflight check unavailable ({}), proceeding",
                    reason
                ))
                .await;
            }
        }
        self.ensure_current(gen)?;
        self.update(gen, |s| s.progress = 10).await;

        // Step 2: parallel evidence collection, settle-all.
        let bundle = self.collect_evidence(gen, &normalized, intensity).await;
        self.ensure_current(gen)?;
        let fingerprint = fingerprint_technologies(bundle.dom.as_ref(), bundle.headers.as_ref());
        self.record(gen, TelemetryLevel::Info, format!(
            "Evidence collection settled: {} technologies fingerprinted, {} limitation(s)",
            fingerprint.len(),
            bundle.limitations.len()
        ))
        .await;
        self.update(gen, |s| {
            s.status = MissionStatus::Discovery;
            s.progress = 35;
        })
        .await;

        // Step 3: level-tiered payload.
        let payload = build_payload(
            &bundle,
            &fingerprint,
            intensity,
            self.config.collectors.max_dom_chars,
        );

        // Step 4: cooldown before the reasoning call. Load shedding for the
        // external API's rate limiter, not a correctness requirement.
        tokio::time::sleep(Duration::from_millis(self.config.engine.cooldown_ms)).await;
        self.ensure_current(gen)?;

        // Step 5: reasoning call. Engine retries internally; an error here
        // means retries were exhausted and the mission aborts.
        let request = AnalysisRequest {
            target_url: normalized.clone(),
            intensity,
            recon_intel: bundle.recon_intel(RECON_INTEL_MAX_CHARS),
            payload,
            language: options.language.clone(),
            auth_context: options.auth_context.clone(),
        };
        let analysis = self.engine.analyze(&request).await?;
        self.ensure_current(gen)?;

        let engine_report = sanitize_engine_report(&analysis.document);
        let usage = if analysis.usage.total_tokens > 0 {
            analysis.usage
        } else {
            engine_report.usage
        };
        self.update(gen, |s| {
            s.usage.absorb(&usage);
            s.progress = 65;
        })
        .await;
        self.record(gen, TelemetryLevel::Info, format!(
            "Reasoning complete: {} finding(s), {} suggested probe(s), {} tokens",
            engine_report.findings.len(),
            engine_report.active_probes.len(),
            usage.total_tokens
        ))
        .await;

        // Step 6: probe planning and batched execution.
        self.update(gen, |s| {
            s.status = MissionStatus::Probing;
            s.progress = 70;
        })
        .await;
        let plans = plan_probes(
            &engine_report.active_probes,
            &normalized,
            self.config.probes.max_probes,
        );
        let executor = ProbeExecutor::new(self.transport.clone(), self.config.probes.clone());
        let dispatched = executor.execute_batch(&plans).await;
        self.ensure_current(gen)?;
        self.record(gen, TelemetryLevel::Info, format!(
            "{} probe(s) executed, {} suspicious",
            dispatched.len(),
            dispatched.iter().filter(|p| p.suspicious).count()
        ))
        .await;
        self.update(gen, |s| s.progress = 85).await;

        // Ground-truth fingerprint wins over engine-inferred technologies.
        let technologies = merge_technologies(fingerprint, engine_report.technologies);
        let mut target_intelligence = engine_report.target_intelligence;
        if let Some(osint) = &bundle.osint {
            for source in &osint.sources {
                if !target_intelligence.grounding_sources.iter().any(|g| g.url == source.url) {
                    target_intelligence.grounding_sources.push(source.clone());
                }
            }
        }

        let mut report = MissionReport {
            mission_id: mission_id.clone(),
            target: normalized.clone(),
            intensity,
            generated_at: Utc::now(),
            target_intelligence,
            probes: dispatched,
            technologies,
            findings: engine_report.findings,
            security_score: engine_report.security_score,
            confidence_score: engine_report.confidence_score,
            usage,
            data_quality: Default::default(),
        };

        // Step 7: endpoint verification prunes unsupported findings.
        self.update(gen, |s| {
            s.status = MissionStatus::Triage;
            s.progress = 90;
        })
        .await;
        let removed = verify_report(
            self.transport.as_ref(),
            &normalized,
            &mut report,
            self.config.probes.timeout(),
        )
        .await;
        if removed > 0 {
            self.record(gen, TelemetryLevel::Warn, format!(
                "{} finding(s) discarded: referenced endpoints do not exist",
                removed
            ))
            .await;
        }
        self.ensure_current(gen)?;

        // Step 8: trust scoring, then a short display delay before the
        // Debriefing transition.
        report.data_quality =
            build_data_quality(bundle.source_flags(), &report.probes, bundle.limitations.clone());
        self.update(gen, |s| s.progress = 95).await;
        tokio::time::sleep(Duration::from_millis(self.config.finalize_delay_ms)).await;

        Ok(report)
    }

    /// Fan-out over all collectors; every outcome settles independently and
    /// no failure cancels a sibling. OSINT (Standard/Deep only) gets one
    /// automatic retry after a fixed delay.
    async fn collect_evidence(
        &self,
        gen: u64,
        target: &str,
        intensity: Intensity,
    ) -> EvidenceBundle {
        let host = host_of(target).unwrap_or_default();
        let collectors = self.collectors.as_ref();

        let osint_fut = async {
            if !intensity.includes_osint() {
                return None;
            }
            match collectors.collect_osint(&host).await {
                Ok(evidence) => Some(Ok(evidence)),
                Err(first) => {
                    warn!(reason = %first.reason, "OSINT attempt failed, retrying once");
                    tokio::time::sleep(Duration::from_millis(
                        self.config.collectors.osint_retry_delay_ms,
                    ))
                    .await;
                    Some(collectors.collect_osint(&host).await)
                }
            }
        };

        let (dom, headers, tls, dns, osint) = tokio::join!(
            collectors.collect_dom(target),
            collectors.collect_headers(target),
            collectors.collect_tls(&host),
            collectors.collect_dns(&host),
            osint_fut,
        );

        let mut bundle = EvidenceBundle::default();
        match dom {
            Ok(v) => bundle.dom = Some(v),
            Err(f) => {
                self.record(gen, TelemetryLevel::Warn, f.to_string()).await;
                bundle.record_failure(&f);
            }
        }
        match headers {
            Ok(v) => bundle.headers = Some(v),
            Err(f) => {
                self.record(gen, TelemetryLevel::Warn, f.to_string()).await;
                bundle.record_failure(&f);
            }
        }
        match tls {
            Ok(v) => bundle.tls = Some(v),
            Err(f) => {
                self.record(gen, TelemetryLevel::Warn, f.to_string()).await;
                bundle.record_failure(&f);
            }
        }
        match dns {
            Ok(v) => bundle.dns = Some(v),
            Err(f) => {
                self.record(gen, TelemetryLevel::Warn, f.to_string()).await;
                bundle.record_failure(&f);
            }
        }
        match osint {
            None => {}
            Some(Ok(v)) => bundle.osint = Some(v),
            Some(Err(f)) => {
                self.record(gen, TelemetryLevel::Warn, f.to_string()).await;
                bundle.record_failure(&f);
            }
        }
        bundle
    }

    async fn complete(&self, gen: u64, report: MissionReport) {
        if self.stale(gen) {
            return;
        }
        let trust = report.data_quality.trust_score;
        let findings = report.findings.len();
        self.update(gen, |s| {
            s.phase = MissionPhase::Debriefing;
            s.progress = 100;
            s.finished_at = Some(Utc::now());
            s.report = Some(report);
        })
        .await;
        self.record(gen, TelemetryLevel::Info, format!(
            "Mission complete: {} finding(s), trust score {}",
            findings, trust
        ))
        .await;
        info!(findings, trust_score = trust, "Mission complete");
    }

    async fn fail(&self, gen: u64, err: &SpeculaError) {
        if self.stale(gen) {
            // A superseded mission's failure is nobody's failure.
            return;
        }
        let surfaced = MissionError::from(err);
        warn!(kind = surfaced.kind.as_str(), error = %err, "Mission aborted");
        self.record(gen, TelemetryLevel::Error, format!(
            "Mission aborted ({}): {}",
            surfaced.kind, surfaced.message
        ))
        .await;
        self.update(gen, |s| {
            s.phase = MissionPhase::Briefing;
            s.status = MissionStatus::Idle;
            s.progress = 0;
            s.finished_at = Some(Utc::now());
            s.error = Some(surfaced);
        })
        .await;
    }

    fn stale(&self, gen: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != gen
    }

    fn ensure_current(&self, gen: u64) -> Result<(), SpeculaError> {
        if self.stale(gen) {
            Err(SpeculaError::Internal("mission superseded by reset".into()))
        } else {
            Ok(())
        }
    }

    async fn update<F: FnOnce(&mut MissionState)>(&self, gen: u64, f: F) -> bool {
        if self.stale(gen) {
            return false;
        }
        let mut state = self.state.write().await;
        f(&mut state);
        true
    }

    async fn record(&self, gen: u64, level: TelemetryLevel, message: String) {
        if self.stale(gen) {
            return;
        }
        self.telemetry.write().await.push(level, message);
    }
}
