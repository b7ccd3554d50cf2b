use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::ProbeConfig;
use crate::models::probe::{DispatchedProbe, HttpMethod, ProbePlan};
use crate::utils::truncation::truncate_end;

/// Bound on how much probe response body is retained for analysis.
const MAX_PROBE_BODY_CHARS: usize = 16_384;

/// Response body patterns indicating error disclosure. Matching any of
/// these flags the probe as suspicious; a coarse heuristic with known
/// false-positive risk, not proof of exploitability.
const DISCLOSURE_PATTERNS: &[&str] = &[
    r"(?i)sql syntax",
    r"(?i)sqlstate\[",
    r"(?i)ora-\d{5}",
    r"(?i)stack trace",
    r"(?i)traceback \(most recent call last\)",
    r"(?i)internal server error",
    r"(?i)undefined index",
    r"(?i)fatal error",
];

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
    /// True when the body could not be read and only reachability is known.
    pub opaque: bool,
}

/// Seam between probe execution and the network. The default impl uses
/// reqwest; tests substitute programmable responders.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Full request with credentials omitted and a bounded body read.
    async fn fetch(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&str>,
        timeout: Duration,
    ) -> Result<TransportResponse, String>;

    /// Lightweight existence check; returns only a status code.
    async fn check_existence(&self, url: &str, timeout: Duration) -> Result<u16, String>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    fn method_of(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeTransport for HttpTransport {
    async fn fetch(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&str>,
        timeout: Duration,
    ) -> Result<TransportResponse, String> {
        let mut request = self
            .client
            .request(Self::method_of(method), url)
            .timeout(timeout);
        if let Some(body) = payload {
            let content_type = if body.trim_start().starts_with('{') {
                "application/json"
            } else {
                "text/plain"
            };
            request = request.header("content-type", content_type).body(body.to_string());
        }

        let resp = request.send().await.map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(TransportResponse {
            status,
            body: truncate_end(&body, MAX_PROBE_BODY_CHARS),
            opaque: false,
        })
    }

    async fn check_existence(&self, url: &str, timeout: Duration) -> Result<u16, String> {
        let resp = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(resp.status().as_u16())
    }
}

/// Executes verification probes in fixed-size concurrent batches with an
/// inter-batch delay. The delay is deliberate backpressure against the
/// target, not a performance knob. One probe's failure never aborts its
/// siblings or the batch.
pub struct ProbeExecutor {
    transport: Arc<dyn ProbeTransport>,
    config: ProbeConfig,
}

impl ProbeExecutor {
    pub fn new(transport: Arc<dyn ProbeTransport>, config: ProbeConfig) -> Self {
        Self { transport, config }
    }

    pub async fn execute_batch(&self, probes: &[ProbePlan]) -> Vec<DispatchedProbe> {
        if probes.is_empty() {
            return Vec::new();
        }
        info!(
            probes = probes.len(),
            batch_size = self.config.batch_size,
            "Executing verification probes"
        );

        let mut dispatched = Vec::with_capacity(probes.len());
        let chunks: Vec<&[ProbePlan]> = probes.chunks(self.config.batch_size.max(1)).collect();
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.into_iter().enumerate() {
            let batch = join_all(chunk.iter().map(|plan| self.dispatch(plan))).await;
            dispatched.extend(batch);
            if i < last {
                tokio::time::sleep(Duration::from_millis(self.config.inter_batch_delay_ms)).await;
            }
        }

        dispatched
    }

    async fn dispatch(&self, plan: &ProbePlan) -> DispatchedProbe {
        let timeout = self.config.timeout();
        let started = Instant::now();

        match self
            .transport
            .fetch(plan.method, &plan.endpoint, plan.payload.as_deref(), timeout)
            .await
        {
            Ok(resp) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let suspicious = assess_suspicious(resp.status, &resp.body, &plan.expected_behavior);
                DispatchedProbe {
                    plan: plan.clone(),
                    status: Some(resp.status),
                    latency_ms,
                    response_length: resp.body.len(),
                    suspicious,
                    cors_blocked: resp.opaque,
                    error: None,
                }
            }
            Err(fetch_err) => {
                debug!(endpoint = %plan.endpoint, error = %fetch_err, "Direct probe blocked, trying existence fallback");
                // Blocked cross-origin style: fall back to an existence-only
                // check. Reachability is confirmed but the body is unreadable.
                match self.transport.check_existence(&plan.endpoint, timeout).await {
                    Ok(status) => {
                        let latency_ms = started.elapsed().as_millis() as u64;
                        DispatchedProbe {
                            plan: plan.clone(),
                            status: Some(status),
                            latency_ms,
                            response_length: 0,
                            suspicious: assess_suspicious(status, "", &plan.expected_behavior),
                            cors_blocked: true,
                            error: None,
                        }
                    }
                    Err(_) => DispatchedProbe {
                        plan: plan.clone(),
                        status: None,
                        latency_ms: started.elapsed().as_millis() as u64,
                        response_length: 0,
                        suspicious: false,
                        cors_blocked: false,
                        error: Some(fetch_err),
                    },
                }
            }
        }
    }
}

/// Flag a response as suspicious when a 200 contradicts a rejection-implying
/// expectation, or when the body matches error-disclosure patterns.
pub fn assess_suspicious(status: u16, body: &str, expected_behavior: &str) -> bool {
    if status == 200 && expectation_implies_rejection(expected_behavior) {
        return true;
    }
    DISCLOSURE_PATTERNS
        .iter()
        .any(|p| regex::Regex::new(p).unwrap().is_match(body))
}

fn expectation_implies_rejection(expected: &str) -> bool {
    let lower = expected.to_lowercase();
    ["401", "403", "404", "denied", "unauthorized", "forbidden", "not found", "reject", "block"]
        .iter()
        .any(|marker| lower.contains(marker))
}
