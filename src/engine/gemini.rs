use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::EngineConfig;
use crate::errors::{with_retry, RetryConfig, SpeculaError};
use crate::models::report::UsageTotals;
use super::provider::{AnalysisRequest, EngineAnalysis, ReasoningEngine};

const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Shape instructions embedded in every analysis prompt. The response is
/// still treated as untrusted and passes through the sanitize boundary.
const RESPONSE_SHAPE: &str = r#"Respond with ONLY a JSON object of this shape:
{
  "targetIntelligence": {
    "purpose": string, "businessLogic": string, "attackSurfaceSummary": string,
    "forensicAnalysis": string, "apis": string[], "associatedLinks": string[],
    "hosting": {"provider": string, "location": string, "ip": string,
                "latitude": number, "longitude": number},
    "groundingSources": [{"url": string, "title": string}]
  },
  "activeProbes": [{"method": "GET"|"POST"|"PUT"|"DELETE", "endpoint": string,
                    "payload": string|null, "description": string,
                    "expectedBehavior": string}],
  "technologyDNA": [{"name": string, "version": string, "category": string,
                     "status": string, "actionPlan": string, "cves": string[]}],
  "findings": [{"title": string, "description": string, "severity": "low"|"medium"|"high"|"critical",
                "remediation": string, "businessImpact": string, "cwe": string,
                "origin": string, "poc": string, "confidence": "low"|"medium"|"high",
                "evidence": string[]}],
  "securityScore": number, "confidenceScore": number
}"#;

pub struct GeminiEngine {
    client: Client,
    api_key: String,
    model: String,
    retry: RetryConfig,
    config: EngineConfig,
}

impl GeminiEngine {
    pub fn new(api_key: &str, config: &EngineConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            retry: RetryConfig {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.base_delay_ms),
                max_delay: Duration::from_millis(config.max_delay_ms),
            },
            config: config.clone(),
        }
    }

    fn build_prompt(&self, request: &AnalysisRequest) -> String {
        let payload_json = serde_json::to_string_pretty(&request.payload)
            .unwrap_or_else(|_| "{}".to_string());
        let mut prompt = format!(
            "You are a defensive security analyst producing a reconnaissance report.\n\
             Target: {}\nScan intensity: {}\nReport language: {}\n\n\
             Evidence collected (some sources may be absent; treat absence as a\n\
             collection limitation, not a finding):\n{}\n",
            request.target_url, request.intensity, request.language, payload_json
        );
        if !request.recon_intel.is_empty() {
            prompt.push_str(&format!("\nRecon intelligence:\n{}\n", request.recon_intel));
        }
        if let Some(auth) = &request.auth_context {
            prompt.push_str(&format!("\nAuthentication context: {}\n", auth));
        }
        prompt.push_str("\nAll suggested probes must be read-only verification requests \
                         against the target host itself.\n\n");
        prompt.push_str(RESPONSE_SHAPE);
        prompt
    }

    async fn call_once(&self, prompt: &str, timeout: Duration, deep: bool) -> Result<EngineAnalysis, SpeculaError> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "responseMimeType": "application/json",
                "maxOutputTokens": if deep { 32_768 } else { 16_384 },
            }
        });

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeculaError::Timeout("reasoning request timed out".into())
                } else {
                    SpeculaError::Network(format!("reasoning request failed: {}", e))
                }
            })?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| SpeculaError::Network(format!("reading reasoning response failed: {}", e)))?;

        if let Some(err) = classify_http_status(status, &text) {
            return Err(err);
        }

        let data: Value = serde_json::from_str(&text)
            .map_err(|e| SpeculaError::EngineApi(format!("unparseable response: {}", e)))?;

        if let Some(error) = data.get("error") {
            let message = error["message"].as_str().unwrap_or("unknown engine error");
            if message.to_lowercase().contains("api key") {
                return Err(SpeculaError::Credential(message.to_string()));
            }
            return Err(SpeculaError::EngineApi(message.to_string()));
        }

        let content = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("");
        let document = extract_json(content).ok_or_else(|| {
            SpeculaError::OutputValidation("no JSON object in engine response".into())
        })?;

        let usage = UsageTotals {
            input_tokens: data["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0),
            output_tokens: data["usageMetadata"]["candidatesTokenCount"].as_u64().unwrap_or(0),
            total_tokens: data["usageMetadata"]["totalTokenCount"].as_u64().unwrap_or(0),
        };
        debug!(model = %self.model, tokens = usage.total_tokens, "Reasoning call complete");

        Ok(EngineAnalysis { document, usage })
    }
}

#[async_trait]
impl ReasoningEngine for GeminiEngine {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<EngineAnalysis, SpeculaError> {
        let prompt = self.build_prompt(request);
        let timeout = self.config.timeout_for(request.intensity);
        let deep = request.payload.deep_reasoning;

        with_retry("reasoning-call", &self.retry, || {
            self.call_once(&prompt, timeout, deep)
        })
        .await
    }

    fn engine_name(&self) -> &str {
        "gemini"
    }
}

/// Map an HTTP status to a typed error. Credential failures are
/// non-retryable; 429/5xx are transient.
fn classify_http_status(status: u16, body: &str) -> Option<SpeculaError> {
    match status {
        200..=299 => None,
        401 | 403 => Some(SpeculaError::Credential(
            "reasoning service rejected the API key".into(),
        )),
        429 => {
            let hint = extract_retry_delay(body)
                .map(|d| format!(" (retry suggested in {})", d))
                .unwrap_or_default();
            Some(SpeculaError::RateLimit(format!(
                "reasoning service rate limit reached{}",
                hint
            )))
        }
        500 | 503 => Some(SpeculaError::ServiceBusy(format!(
            "reasoning service returned {}",
            status
        ))),
        400 if body.to_lowercase().contains("api key") => Some(SpeculaError::Credential(
            "reasoning service reports an invalid API key".into(),
        )),
        other => Some(SpeculaError::EngineApi(format!(
            "reasoning service returned unexpected status {}",
            other
        ))),
    }
}

/// Pull a "retryDelay": "37s" style hint out of an error body.
fn extract_retry_delay(body: &str) -> Option<String> {
    let re = regex::Regex::new(r#""retryDelay"\s*:\s*"([^"]+)""#).unwrap();
    re.captures(body).map(|c| c[1].to_string())
}

/// Extract a JSON object from model output, tolerating markdown fences and
/// truncated tails.
fn extract_json(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Some(v);
    }

    let trimmed = text.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);
    if let Ok(v) = serde_json::from_str::<Value>(stripped.trim()) {
        return Some(v);
    }

    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if start >= end {
        return None;
    }
    let candidate = &stripped[start..=end];
    if let Ok(v) = serde_json::from_str::<Value>(candidate) {
        return Some(v);
    }
    repair_truncated_json(candidate).and_then(|repaired| serde_json::from_str(&repaired).ok())
}

/// Close unbalanced brackets after trimming any trailing partial object.
/// Handles the common case of a response cut off mid-array.
fn repair_truncated_json(text: &str) -> Option<String> {
    let mut s = text.to_string();
    let last_brace = s.rfind('}')?;
    s.truncate(last_brace + 1);

    let mut open_braces = 0i32;
    let mut open_brackets = 0i32;
    for ch in s.chars() {
        match ch {
            '{' => open_braces += 1,
            '}' => open_braces -= 1,
            '[' => open_brackets += 1,
            ']' => open_brackets -= 1,
            _ => {}
        }
    }
    if open_braces == 0 && open_brackets == 0 {
        return None;
    }
    for _ in 0..open_braces {
        s.push('}');
    }
    for _ in 0..open_brackets {
        s.push(']');
    }
    Some(s)
}
