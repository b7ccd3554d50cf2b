use async_trait::async_trait;
use serde_json::Value;

use crate::config::Intensity;
use crate::errors::SpeculaError;
use crate::models::report::UsageTotals;
use super::payload::EvidencePayload;

/// Everything the reasoning engine receives for one mission.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub target_url: String,
    pub intensity: Intensity,
    /// Bounded free-text recon summary.
    pub recon_intel: String,
    pub payload: EvidencePayload,
    /// Target language for report prose.
    pub language: String,
    pub auth_context: Option<String>,
}

/// Raw engine output: an untrusted JSON document plus token accounting.
/// The document must pass through the sanitize boundary before use.
#[derive(Debug, Clone)]
pub struct EngineAnalysis {
    pub document: Value,
    pub usage: UsageTotals,
}

/// External reasoning service contract. Implementations retry internally on
/// transient failures; an error surfacing from `analyze` means retries were
/// exhausted (or the failure was non-retryable, e.g. a bad credential).
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<EngineAnalysis, SpeculaError>;

    fn engine_name(&self) -> &str;
}
