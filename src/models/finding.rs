use serde::{Deserialize, Serialize};

/// Severity level for a security finding, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Numeric rank where lower values indicate higher severity.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    /// Lenient parse for engine-supplied values; unknown input falls back to
    /// the safe middle value.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// How much the evidence supports the finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// Post-hoc verification outcome for a finding's referenced endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// A referenced endpoint responded and exists.
    Verified,
    /// A referenced endpoint answered 401/403: it exists behind auth.
    Protected,
    /// No endpoint reference could be checked.
    Unverified,
}

/// An evidence-based probabilistic inference, never a guaranteed
/// vulnerability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub cwe: String,
    pub remediation: String,
    pub business_impact: String,
    pub poc: String,
    pub confidence: Confidence,
    /// Which sources (headers, dom, osint, ...) support this finding.
    pub evidence: Vec<String>,
    /// Where the finding originated, e.g. "ai-analysis".
    pub origin: String,
    pub verification: Option<VerificationStatus>,
}
