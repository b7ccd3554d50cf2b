use serde::{Deserialize, Serialize};
use super::types::SpeculaError;

/// Mission-level failure taxonomy surfaced to callers. Preflight hard
/// failures use the first two kinds; everything else is derived from the
/// reasoning-engine boundary or generic connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionErrorKind {
    InvalidFormat,
    DnsFailed,
    ApiKey,
    RateLimit,
    ServiceBusy,
    Network,
    Unknown,
}

impl MissionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::DnsFailed => "dns_failed",
            Self::ApiKey => "api_key",
            Self::RateLimit => "rate_limit",
            Self::ServiceBusy => "service_busy",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }

    /// Only rate-limit and service-busy failures are transient at the
    /// mission level; they carry a human-readable retry hint.
    pub fn retry_hint(&self) -> Option<&'static str> {
        match self {
            Self::RateLimit => Some("The reasoning service is rate limited. Wait a minute before relaunching."),
            Self::ServiceBusy => Some("The reasoning service is overloaded. Retry in a few minutes."),
            _ => None,
        }
    }
}

impl std::fmt::Display for MissionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub kind: MissionErrorKind,
    pub retryable: bool,
}

impl SpeculaError {
    /// Classify this error into the mission taxonomy and determine whether
    /// the operation that produced it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            SpeculaError::InvalidTarget(_) => ErrorClassification {
                kind: MissionErrorKind::InvalidFormat,
                retryable: false,
            },
            SpeculaError::DnsResolution(_) => ErrorClassification {
                kind: MissionErrorKind::DnsFailed,
                retryable: false,
            },
            SpeculaError::Credential(_) => ErrorClassification {
                kind: MissionErrorKind::ApiKey,
                retryable: false,
            },
            SpeculaError::Config(_) => ErrorClassification {
                kind: MissionErrorKind::Unknown,
                retryable: false,
            },
            SpeculaError::RateLimit(_) => ErrorClassification {
                kind: MissionErrorKind::RateLimit,
                retryable: true,
            },
            SpeculaError::ServiceBusy(_) => ErrorClassification {
                kind: MissionErrorKind::ServiceBusy,
                retryable: true,
            },
            SpeculaError::Network(_) | SpeculaError::Timeout(_) => ErrorClassification {
                kind: MissionErrorKind::Network,
                retryable: true,
            },
            SpeculaError::EngineApi(_) | SpeculaError::OutputValidation(_) => ErrorClassification {
                kind: MissionErrorKind::Unknown,
                retryable: true,
            },
            SpeculaError::Io(_)
            | SpeculaError::Json(_)
            | SpeculaError::Yaml(_)
            | SpeculaError::Internal(_) => ErrorClassification {
                kind: MissionErrorKind::Unknown,
                retryable: true,
            },
        }
    }
}

/// Classify a free-form failure message from the engine or a fetch layer.
/// Used when no HTTP status is available to type the error directly.
pub fn classify_message(message: &str) -> MissionErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("api key")
        || lower.contains("api_key")
        || lower.contains("unauthorized")
        || lower.contains("permission denied")
        || lower.contains("invalid authentication")
    {
        MissionErrorKind::ApiKey
    } else if lower.contains("429") || lower.contains("rate limit") || lower.contains("quota") {
        MissionErrorKind::RateLimit
    } else if lower.contains("503")
        || lower.contains("500")
        || lower.contains("overloaded")
        || lower.contains("service busy")
        || lower.contains("unavailable")
    {
        MissionErrorKind::ServiceBusy
    } else if lower.contains("network")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connect")
        || lower.contains("fetch")
        || lower.contains("dns")
    {
        MissionErrorKind::Network
    } else {
        MissionErrorKind::Unknown
    }
}

/// Structured error surfaced in mission state for callers to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionError {
    pub kind: MissionErrorKind,
    pub message: String,
    pub retry_hint: Option<String>,
}

impl MissionError {
    pub fn new(kind: MissionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_hint: kind.retry_hint().map(String::from),
        }
    }
}

impl From<&SpeculaError> for MissionError {
    fn from(err: &SpeculaError) -> Self {
        let mut kind = err.classify().kind;
        // Untyped errors still get a chance at a better bucket via their text.
        if kind == MissionErrorKind::Unknown {
            kind = classify_message(&err.to_string());
        }
        MissionError::new(kind, err.to_string())
    }
}
