use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Intensity;
use super::finding::Finding;
use super::probe::DispatchedProbe;
use super::technology::TechnologyItem;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostingInfo {
    pub provider: String,
    pub location: String,
    pub ip: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// An external source the reasoning engine grounded its analysis on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingSource {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetIntelligence {
    pub purpose: String,
    pub business_logic: String,
    pub attack_surface_summary: String,
    pub forensic_analysis: String,
    pub apis: Vec<String>,
    pub associated_links: Vec<String>,
    pub hosting: HostingInfo,
    pub grounding_sources: Vec<GroundingSource>,
}

/// Running token accounting across reasoning calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl UsageTotals {
    pub fn absorb(&mut self, other: &UsageTotals) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Which evidence slots were actually obtained for this mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFlags {
    pub dom: bool,
    pub headers: bool,
    pub tls: bool,
    pub dns: bool,
    pub osint: bool,
}

/// Derived once at Triage -> Debriefing; never mutated afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataQuality {
    /// 0-100 weighted measure of how much evidence was obtainable.
    pub trust_score: u8,
    pub sources: SourceFlags,
    pub probes_executed: usize,
    pub probes_succeeded: usize,
    /// Collector failures recorded as limitations, not errors.
    pub limitations: Vec<String>,
}

/// Terminal aggregate for a mission. Owned by the orchestrator; handed to
/// consumers as an immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionReport {
    pub mission_id: String,
    pub target: String,
    pub intensity: Intensity,
    pub generated_at: DateTime<Utc>,
    pub target_intelligence: TargetIntelligence,
    pub probes: Vec<DispatchedProbe>,
    pub technologies: Vec<TechnologyItem>,
    pub findings: Vec<Finding>,
    pub security_score: u8,
    pub confidence_score: u8,
    pub usage: UsageTotals,
    pub data_quality: DataQuality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_absorb() {
        let mut total = UsageTotals::default();
        total.absorb(&UsageTotals { input_tokens: 100, output_tokens: 50, total_tokens: 150 });
        total.absorb(&UsageTotals { input_tokens: 10, output_tokens: 5, total_tokens: 15 });
        assert_eq!(total.total_tokens, 165);
        assert_eq!(total.input_tokens, 110);
    }
}
