use serde_json::Value;

use crate::models::finding::{Confidence, Finding, Severity};
use crate::models::probe::{HttpMethod, ProbePlan};
use crate::models::report::{GroundingSource, HostingInfo, TargetIntelligence, UsageTotals};
use crate::models::technology::{TechCategory, TechStatus, TechnologyItem};

/// Placeholder for prose the engine failed to provide.
const PLACEHOLDER: &str = "Analysis incomplete";

/// Typed view of the reasoning document after sanitization. Trust and
/// verification fields are filled in later by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct EngineReport {
    pub target_intelligence: TargetIntelligence,
    pub active_probes: Vec<ProbePlan>,
    pub technologies: Vec<TechnologyItem>,
    pub findings: Vec<Finding>,
    pub security_score: u8,
    pub confidence_score: u8,
    pub usage: UsageTotals,
}

/// The single parse/validate boundary for the untrusted reasoning document.
/// Every field is validated and defaulted rather than trusted: unknown enum
/// values fall back to safe middles, missing arrays become empty, missing
/// strings become a placeholder, scores are clamped to [0,100].
pub fn sanitize_engine_report(doc: &Value) -> EngineReport {
    EngineReport {
        target_intelligence: sanitize_intelligence(&doc["targetIntelligence"]),
        active_probes: sanitize_probes(&doc["activeProbes"]),
        technologies: sanitize_technologies(&doc["technologyDNA"]),
        findings: sanitize_findings(&doc["findings"]),
        security_score: clamp_score(&doc["securityScore"]),
        confidence_score: clamp_score(&doc["confidenceScore"]),
        usage: sanitize_usage(&doc["usage"]),
    }
}

fn text_or(value: &Value, default: &str) -> String {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default.to_string(),
    }
}

fn text_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn clamp_score(value: &Value) -> u8 {
    match value.as_f64() {
        Some(n) => n.clamp(0.0, 100.0).round() as u8,
        None => 50,
    }
}

fn sanitize_intelligence(value: &Value) -> TargetIntelligence {
    let hosting = &value["hosting"];
    let grounding_sources = value["groundingSources"]
        .as_array()
        .map(|sources| {
            sources
                .iter()
                .filter_map(|s| {
                    let url = s["url"].as_str().or_else(|| s["uri"].as_str())?;
                    if url.trim().is_empty() {
                        return None;
                    }
                    Some(GroundingSource {
                        url: url.trim().to_string(),
                        title: text_or(&s["title"], "Untitled source"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    TargetIntelligence {
        purpose: text_or(&value["purpose"], PLACEHOLDER),
        business_logic: text_or(&value["businessLogic"], PLACEHOLDER),
        attack_surface_summary: text_or(&value["attackSurfaceSummary"], PLACEHOLDER),
        forensic_analysis: text_or(&value["forensicAnalysis"], PLACEHOLDER),
        apis: text_list(&value["apis"]),
        associated_links: text_list(&value["associatedLinks"]),
        hosting: HostingInfo {
            provider: text_or(&hosting["provider"], "Unknown"),
            location: text_or(&hosting["location"], "Unknown"),
            ip: text_or(&hosting["ip"], ""),
            latitude: hosting["latitude"].as_f64(),
            longitude: hosting["longitude"].as_f64(),
        },
        grounding_sources,
    }
}

fn sanitize_probes(value: &Value) -> Vec<ProbePlan> {
    value
        .as_array()
        .map(|probes| {
            probes
                .iter()
                .filter_map(|p| {
                    let endpoint = p["endpoint"].as_str()?.trim().to_string();
                    if endpoint.is_empty() {
                        return None;
                    }
                    Some(ProbePlan {
                        method: HttpMethod::parse_lenient(p["method"].as_str().unwrap_or("")),
                        endpoint,
                        payload: p["payload"].as_str().map(str::to_string),
                        description: text_or(&p["description"], PLACEHOLDER),
                        expected_behavior: text_or(&p["expectedBehavior"], PLACEHOLDER),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn sanitize_technologies(value: &Value) -> Vec<TechnologyItem> {
    value
        .as_array()
        .map(|techs| {
            techs
                .iter()
                .filter_map(|t| {
                    let name = t["name"].as_str()?.trim().to_string();
                    if name.is_empty() {
                        return None;
                    }
                    Some(TechnologyItem {
                        name,
                        version: text_or(&t["version"], ""),
                        category: TechCategory::parse_lenient(t["category"].as_str().unwrap_or("")),
                        status: TechStatus::parse_lenient(t["status"].as_str().unwrap_or("")),
                        action_plan: text_or(&t["actionPlan"], ""),
                        cves: text_list(&t["cves"]),
                        ground_truth: false,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn sanitize_findings(value: &Value) -> Vec<Finding> {
    value
        .as_array()
        .map(|findings| {
            findings
                .iter()
                .filter(|f| f.is_object())
                .map(|f| Finding {
                    title: text_or(&f["title"], PLACEHOLDER),
                    description: text_or(&f["description"], PLACEHOLDER),
                    severity: Severity::parse_lenient(f["severity"].as_str().unwrap_or("")),
                    cwe: text_or(&f["cwe"], "CWE-noinfo"),
                    remediation: text_or(&f["remediation"], PLACEHOLDER),
                    business_impact: text_or(&f["businessImpact"], PLACEHOLDER),
                    poc: text_or(&f["poc"], PLACEHOLDER),
                    confidence: Confidence::parse_lenient(f["confidence"].as_str().unwrap_or("")),
                    evidence: text_list(&f["evidence"]),
                    origin: text_or(&f["origin"], "ai-analysis"),
                    verification: None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Usage appears either as a single total or as split input/output counts.
fn sanitize_usage(value: &Value) -> UsageTotals {
    let input = value["inputTokenCount"].as_u64().unwrap_or(0);
    let output = value["outputTokenCount"].as_u64().unwrap_or(0);
    let total = value["totalTokenCount"].as_u64().unwrap_or(input + output);
    UsageTotals {
        input_tokens: input,
        output_tokens: output,
        total_tokens: total,
    }
}
