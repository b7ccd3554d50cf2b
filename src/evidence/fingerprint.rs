use regex::Regex;

use crate::models::technology::{TechCategory, TechStatus, TechnologyItem};
use super::bundle::{DomEvidence, HeaderEvidence};

/// Deterministic technology fingerprinting over whatever DOM and header
/// evidence was obtained. Runs synchronously; empty inputs yield an empty
/// fingerprint, not an error. Items are marked ground truth and take
/// precedence over engine-inferred technologies at merge time.
pub fn fingerprint_technologies(
    dom: Option<&DomEvidence>,
    headers: Option<&HeaderEvidence>,
) -> Vec<TechnologyItem> {
    let mut found: Vec<TechnologyItem> = Vec::new();

    if let Some(headers) = headers {
        fingerprint_headers(headers, &mut found);
    }
    if let Some(dom) = dom {
        fingerprint_dom(dom, &mut found);
    }

    found
}

fn push_unique(found: &mut Vec<TechnologyItem>, name: &str, version: String, category: TechCategory) {
    let key = name.to_lowercase();
    if let Some(existing) = found.iter_mut().find(|t| t.name.to_lowercase() == key) {
        if existing.version.is_empty() && !version.is_empty() {
            existing.version = version;
        }
        return;
    }
    found.push(TechnologyItem {
        name: name.to_string(),
        version,
        category,
        status: TechStatus::Unknown,
        action_plan: String::new(),
        cves: vec![],
        ground_truth: true,
    });
}

fn fingerprint_headers(headers: &HeaderEvidence, found: &mut Vec<TechnologyItem>) {
    if let Some(server) = headers.headers.get("server") {
        let lower = server.to_lowercase();
        let version = extract_version(server);
        if lower.contains("nginx") {
            push_unique(found, "Nginx", version, TechCategory::Server);
        } else if lower.contains("apache") {
            push_unique(found, "Apache httpd", version, TechCategory::Server);
        } else if lower.contains("cloudflare") {
            push_unique(found, "Cloudflare", String::new(), TechCategory::Cdn);
        } else if lower.contains("microsoft-iis") {
            push_unique(found, "Microsoft IIS", version, TechCategory::Server);
        }
    }
    if let Some(powered) = headers.headers.get("x-powered-by") {
        let lower = powered.to_lowercase();
        let version = extract_version(powered);
        if lower.contains("express") {
            push_unique(found, "Express", version, TechCategory::Backend);
        } else if lower.contains("php") {
            push_unique(found, "PHP", version, TechCategory::Language);
        } else if lower.contains("asp.net") {
            push_unique(found, "ASP.NET", version, TechCategory::Backend);
        } else if lower.contains("next.js") {
            push_unique(found, "Next.js", version, TechCategory::Frontend);
        }
    }
    if headers.headers.contains_key("cf-ray") {
        push_unique(found, "Cloudflare", String::new(), TechCategory::Cdn);
    }
    if headers.headers.contains_key("x-vercel-id") {
        push_unique(found, "Vercel", String::new(), TechCategory::Cdn);
    }
}

fn fingerprint_dom(dom: &DomEvidence, found: &mut Vec<TechnologyItem>) {
    if let Some(generator) = &dom.meta_generator {
        let version = extract_version(generator);
        let name = generator
            .split(|c: char| c.is_ascii_digit())
            .next()
            .unwrap_or(generator)
            .trim()
            .to_string();
        if !name.is_empty() {
            let category = if name.to_lowercase().contains("wordpress")
                || name.to_lowercase().contains("drupal")
                || name.to_lowercase().contains("joomla")
            {
                TechCategory::Cms
            } else {
                TechCategory::Other
            };
            push_unique(found, &name, version, category);
        }
    }

    let script_patterns: &[(&str, &str, TechCategory)] = &[
        (r"react(?:\.production)?(?:\.min)?\.js", "React", TechCategory::Frontend),
        (r"jquery[.-]?([\d.]*)(?:\.min)?\.js", "jQuery", TechCategory::Frontend),
        (r"angular(?:\.min)?\.js", "AngularJS", TechCategory::Frontend),
        (r"vue(?:\.global)?(?:\.prod)?(?:\.min)?\.js", "Vue.js", TechCategory::Frontend),
        (r"/wp-content/|/wp-includes/", "WordPress", TechCategory::Cms),
        (r"googletagmanager\.com|google-analytics\.com|gtag/js", "Google Analytics", TechCategory::Analytics),
        (r"cdn\.shopify\.com", "Shopify", TechCategory::Cms),
        (r"bootstrap(?:\.bundle)?(?:\.min)?\.js", "Bootstrap", TechCategory::Frontend),
    ];

    for src in &dom.script_sources {
        for (pattern, name, category) in script_patterns {
            let re = Regex::new(&format!("(?i){}", pattern)).unwrap();
            if let Some(caps) = re.captures(src) {
                let version = caps
                    .get(1)
                    .map(|m| m.as_str().trim_end_matches('.').to_string())
                    .unwrap_or_default();
                push_unique(found, name, version, *category);
            }
        }
    }
}

/// First dotted version number in a string, e.g. "nginx/1.24.0" -> "1.24.0".
fn extract_version(text: &str) -> String {
    let re = Regex::new(r"(\d+\.\d+(?:\.\d+)?)").unwrap();
    re.captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}
