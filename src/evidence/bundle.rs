use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::report::{GroundingSource, SourceFlags};
use crate::utils::truncation::truncate_end;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSource {
    Dom,
    Headers,
    Tls,
    Dns,
    Osint,
}

impl EvidenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dom => "dom",
            Self::Headers => "headers",
            Self::Tls => "tls",
            Self::Dns => "dns",
            Self::Osint => "osint",
        }
    }
}

/// A collector failure. Always recovered locally: it degrades the evidence
/// bundle and is recorded as a limitation, never thrown up the stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorFailure {
    pub source: EvidenceSource,
    pub reason: String,
}

impl CollectorFailure {
    pub fn new(source: EvidenceSource, reason: impl Into<String>) -> Self {
        Self { source, reason: reason.into() }
    }
}

impl std::fmt::Display for CollectorFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} collection failed: {}", self.source.as_str(), self.reason)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomEvidence {
    pub text: String,
    pub title: Option<String>,
    pub script_sources: Vec<String>,
    pub meta_generator: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderEvidence {
    /// Lowercased header names.
    pub headers: BTreeMap<String, String>,
    pub missing_security_headers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsEvidence {
    /// Coarse transport-security grade, derived from HTTPS posture.
    pub grade: String,
    pub hsts: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsEvidence {
    pub addresses: Vec<String>,
    pub resolver: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsintEvidence {
    pub summary: String,
    pub discovered_hosts: Vec<String>,
    pub sources: Vec<GroundingSource>,
}

/// Per-mission aggregate of collector outputs. Every slot is independently
/// present or absent; the bundle is valid with all slots empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub dom: Option<DomEvidence>,
    pub headers: Option<HeaderEvidence>,
    pub tls: Option<TlsEvidence>,
    pub dns: Option<DnsEvidence>,
    pub osint: Option<OsintEvidence>,
    pub limitations: Vec<String>,
}

impl EvidenceBundle {
    pub fn record_failure(&mut self, failure: &CollectorFailure) {
        self.limitations.push(failure.to_string());
    }

    pub fn source_flags(&self) -> SourceFlags {
        SourceFlags {
            dom: self.dom.is_some(),
            headers: self.headers.is_some(),
            tls: self.tls.is_some(),
            dns: self.dns.is_some(),
            osint: self.osint.is_some(),
        }
    }

    /// Bounded free-text recon summary handed to the reasoning engine.
    pub fn recon_intel(&self, max_chars: usize) -> String {
        let mut out = String::new();
        if let Some(dns) = &self.dns {
            out.push_str(&format!("Resolved addresses: {}\n", dns.addresses.join(", ")));
        }
        if let Some(tls) = &self.tls {
            out.push_str(&format!("Transport security grade: {} ({})\n", tls.grade, tls.notes));
        }
        if let Some(headers) = &self.headers {
            if !headers.missing_security_headers.is_empty() {
                out.push_str(&format!(
                    "Missing security headers: {}\n",
                    headers.missing_security_headers.join(", ")
                ));
            }
        }
        if let Some(osint) = &self.osint {
            out.push_str(&format!("OSINT: {}\n", osint.summary));
            if !osint.discovered_hosts.is_empty() {
                out.push_str(&format!(
                    "Related hosts: {}\n",
                    osint.discovered_hosts.join(", ")
                ));
            }
        }
        if !self.limitations.is_empty() {
            out.push_str(&format!(
                "Collection limitations: {}\n",
                self.limitations.join("; ")
            ));
        }
        truncate_end(&out, max_chars)
    }
}
