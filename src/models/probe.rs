use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Lenient parse for engine-supplied method strings. Anything
    /// unrecognized falls back to GET, the least intrusive verb.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            _ => Self::Get,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planned verification request. Immutable once planned; execution
/// produces a [`DispatchedProbe`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbePlan {
    pub method: HttpMethod,
    /// Absolute URL after planning; may be target-relative before.
    pub endpoint: String,
    pub payload: Option<String>,
    pub description: String,
    pub expected_behavior: String,
}

/// Outcome record for one executed probe. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchedProbe {
    pub plan: ProbePlan,
    pub status: Option<u16>,
    pub latency_ms: u64,
    pub response_length: usize,
    /// Conservative heuristic flag, not proof of exploitability.
    pub suspicious: bool,
    /// Set when the direct fetch was blocked and only an existence probe
    /// succeeded; the response body was unreadable.
    pub cors_blocked: bool,
    pub error: Option<String>,
}

impl DispatchedProbe {
    /// A probe counts as successful when it produced any observable status.
    pub fn succeeded(&self) -> bool {
        self.status.is_some() && self.error.is_none()
    }
}
