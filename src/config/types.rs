use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mission intensity. Ordered: Fast < Standard < Deep. Higher levels collect
/// more evidence and grant the reasoning engine a larger budget.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Fast,
    #[default]
    Standard,
    Deep,
}

impl Intensity {
    pub fn max_level(&self) -> u8 {
        match self {
            Self::Fast => 0,
            Self::Standard => 1,
            Self::Deep => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Standard => "standard",
            Self::Deep => "deep",
        }
    }

    /// OSINT discovery only runs at Standard and above.
    pub fn includes_osint(&self) -> bool {
        self.max_level() >= 1
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "standard" => Ok(Self::Standard),
            "deep" => Ok(Self::Deep),
            other => Err(format!("unknown intensity '{}' (expected fast, standard or deep)", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpeculaConfig {
    pub engine: EngineConfig,
    pub collectors: CollectorConfig,
    pub probes: ProbeConfig,
    pub telemetry: TelemetryConfig,
    /// Short display delay before the Debriefing transition.
    pub finalize_delay_ms: u64,
}

impl Default for SpeculaConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            collectors: CollectorConfig::default(),
            probes: ProbeConfig::default(),
            telemetry: TelemetryConfig::default(),
            finalize_delay_ms: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub model: Option<String>,
    /// Load-shedding pause before the main reasoning call.
    pub cooldown_ms: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Base request timeout; scaled by intensity.
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: None,
            cooldown_ms: 1_200,
            max_retries: 3,
            base_delay_ms: 2_000,
            max_delay_ms: 30_000,
            timeout_ms: 90_000,
        }
    }
}

impl EngineConfig {
    /// Reasoning timeout grows with intensity since deeper payloads take
    /// longer to analyze.
    pub fn timeout_for(&self, intensity: Intensity) -> Duration {
        let ms = match intensity {
            Intensity::Fast => self.timeout_ms / 2,
            Intensity::Standard => self.timeout_ms,
            Intensity::Deep => self.timeout_ms * 2,
        };
        Duration::from_millis(ms.max(1_000))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub timeout_ms: u64,
    pub osint_retry_delay_ms: u64,
    pub dns_ttl_secs: u64,
    pub tls_ttl_secs: u64,
    /// Character budget for full DOM text at Deep intensity.
    pub max_dom_chars: usize,
    pub doh_endpoint: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8_000,
            osint_retry_delay_ms: 2_000,
            dns_ttl_secs: 300,
            tls_ttl_secs: 3_600,
            max_dom_chars: 60_000,
            doh_endpoint: "https://dns.google/resolve".to_string(),
        }
    }
}

impl CollectorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Probes per concurrent batch.
    pub batch_size: usize,
    /// Backpressure delay between batches, not a performance knob.
    pub inter_batch_delay_ms: u64,
    pub timeout_ms: u64,
    pub max_probes: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            inter_batch_delay_ms: 1_500,
            timeout_ms: 7_000,
            max_probes: 24,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Maximum retained telemetry entries; oldest dropped beyond this.
    pub capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { capacity: 200 }
    }
}
