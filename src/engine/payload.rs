use serde::{Deserialize, Serialize};

use crate::config::Intensity;
use crate::evidence::bundle::{DnsEvidence, EvidenceBundle, HeaderEvidence, OsintEvidence, TlsEvidence};
use crate::models::technology::TechnologyItem;
use crate::utils::truncation::truncate_middle;

const DOM_SIGNAL_SAMPLE_CHARS: usize = 1_500;

/// Lightweight DOM-derived signals included from Standard intensity up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomSignals {
    pub title: Option<String>,
    pub script_sources: Vec<String>,
    pub meta_generator: Option<String>,
    pub text_sample: String,
}

/// Level-tiered evidence payload for the reasoning engine. Each tier is a
/// strict superset of the one below it: Fast carries headers/TLS/DNS,
/// Standard adds DOM signals and the fingerprint, Deep adds bounded full
/// DOM text and the deep-reasoning flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidencePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HeaderEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osint: Option<OsintEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_signals: Option<DomSignals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_dom: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fingerprint: Vec<TechnologyItem>,
    pub deep_reasoning: bool,
    /// Set when direct DOM access was blocked, so the engine can compensate
    /// with network-metadata inference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_context: Option<String>,
}

pub fn build_payload(
    bundle: &EvidenceBundle,
    fingerprint: &[TechnologyItem],
    intensity: Intensity,
    max_dom_chars: usize,
) -> EvidencePayload {
    let mut payload = EvidencePayload {
        headers: bundle.headers.clone(),
        tls: bundle.tls.clone(),
        dns: bundle.dns.clone(),
        osint: bundle.osint.clone(),
        ..Default::default()
    };

    if bundle.dom.is_none() {
        payload.cors_context = Some(
            "Direct DOM access was blocked or failed; infer application \
             characteristics from network metadata instead."
                .to_string(),
        );
    }

    if intensity.max_level() >= 1 {
        payload.fingerprint = fingerprint.to_vec();
        if let Some(dom) = &bundle.dom {
            payload.dom_signals = Some(DomSignals {
                title: dom.title.clone(),
                script_sources: dom.script_sources.clone(),
                meta_generator: dom.meta_generator.clone(),
                text_sample: truncate_middle(&dom.text, DOM_SIGNAL_SAMPLE_CHARS),
            });
        }
    }

    if intensity.max_level() >= 2 {
        payload.deep_reasoning = true;
        if let Some(dom) = &bundle.dom {
            payload.full_dom = Some(truncate_middle(&dom.text, max_dom_chars));
        }
    }

    payload
}
