use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::CollectorConfig;
use crate::models::report::GroundingSource;
use crate::utils::truncation::truncate_middle;
use super::bundle::{
    CollectorFailure, DnsEvidence, DomEvidence, EvidenceSource, HeaderEvidence, OsintEvidence,
    TlsEvidence,
};
use super::cache::TtlCache;

/// Security headers whose absence is recorded as evidence.
const SECURITY_HEADERS: &[&str] = &[
    "content-security-policy",
    "strict-transport-security",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
    "permissions-policy",
];

/// Independent, fallible evidence producers. Each returns a value or a
/// well-defined failure; none aborts the mission.
#[async_trait]
pub trait EvidenceCollectors: Send + Sync {
    async fn collect_dom(&self, target: &str) -> Result<DomEvidence, CollectorFailure>;
    async fn collect_headers(&self, target: &str) -> Result<HeaderEvidence, CollectorFailure>;
    async fn collect_tls(&self, host: &str) -> Result<TlsEvidence, CollectorFailure>;
    async fn collect_dns(&self, host: &str) -> Result<DnsEvidence, CollectorFailure>;
    async fn collect_osint(&self, host: &str) -> Result<OsintEvidence, CollectorFailure>;
}

/// Default HTTP adapters: DoH for DNS, a bounded GET for DOM/headers, an
/// HTTPS posture probe for the TLS grade, certificate transparency for
/// OSINT discovery. DNS and TLS results are TTL-cached.
pub struct HttpCollectors {
    client: Client,
    config: CollectorConfig,
    dns_cache: TtlCache<DnsEvidence>,
    tls_cache: TtlCache<TlsEvidence>,
}

impl HttpCollectors {
    pub fn new(config: CollectorConfig) -> Self {
        let dns_cache = TtlCache::new(Duration::from_secs(config.dns_ttl_secs));
        let tls_cache = TtlCache::new(Duration::from_secs(config.tls_ttl_secs));
        Self {
            client: Client::new(),
            config,
            dns_cache,
            tls_cache,
        }
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    fn failure(source: EvidenceSource, err: &reqwest::Error) -> CollectorFailure {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        CollectorFailure::new(source, reason)
    }
}

#[async_trait]
impl EvidenceCollectors for HttpCollectors {
    async fn collect_dom(&self, target: &str) -> Result<DomEvidence, CollectorFailure> {
        let resp = self
            .client
            .get(target)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| Self::failure(EvidenceSource::Dom, &e))?;
        let html = resp
            .text()
            .await
            .map_err(|e| Self::failure(EvidenceSource::Dom, &e))?;
        Ok(parse_dom(&html, self.config.max_dom_chars))
    }

    async fn collect_headers(&self, target: &str) -> Result<HeaderEvidence, CollectorFailure> {
        let resp = self
            .client
            .get(target)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| Self::failure(EvidenceSource::Headers, &e))?;

        let mut headers = BTreeMap::new();
        for (name, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), v.to_string());
            }
        }
        Ok(build_header_evidence(headers))
    }

    async fn collect_tls(&self, host: &str) -> Result<TlsEvidence, CollectorFailure> {
        let client = self.client.clone();
        let timeout = self.timeout();
        let url = format!("https://{}", host);
        self.tls_cache
            .get_or_try_insert(host, || async move {
                let resp = client
                    .get(&url)
                    .timeout(timeout)
                    .send()
                    .await
                    .map_err(|e| Self::failure(EvidenceSource::Tls, &e))?;
                let hsts = resp
                    .headers()
                    .get("strict-transport-security")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Ok(derive_tls_grade(hsts.as_deref()))
            })
            .await
    }

    async fn collect_dns(&self, host: &str) -> Result<DnsEvidence, CollectorFailure> {
        let client = self.client.clone();
        let timeout = self.timeout();
        let resolver = self.config.doh_endpoint.clone();
        let host_owned = host.to_string();
        self.dns_cache
            .get_or_try_insert(host, || async move {
                let url = format!("{}?name={}&type=A", resolver, host_owned);
                let resp = client
                    .get(&url)
                    .timeout(timeout)
                    .send()
                    .await
                    .map_err(|e| Self::failure(EvidenceSource::Dns, &e))?;
                let doc: Value = resp
                    .json()
                    .await
                    .map_err(|e| Self::failure(EvidenceSource::Dns, &e))?;
                debug!(host = %host_owned, "DoH lookup complete");
                parse_doh_response(&doc, &resolver)
                    .map_err(|reason| CollectorFailure::new(EvidenceSource::Dns, reason))
            })
            .await
    }

    async fn collect_osint(&self, host: &str) -> Result<OsintEvidence, CollectorFailure> {
        let url = format!("https://crt.sh/?q=%25.{}&output=json", host);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| Self::failure(EvidenceSource::Osint, &e))?;
        if !resp.status().is_success() {
            return Err(CollectorFailure::new(
                EvidenceSource::Osint,
                format!("certificate transparency lookup returned {}", resp.status()),
            ));
        }
        let doc: Value = resp
            .json()
            .await
            .map_err(|e| Self::failure(EvidenceSource::Osint, &e))?;
        Ok(parse_crtsh_response(&doc, host, &url))
    }
}

fn parse_dom(html: &str, max_chars: usize) -> DomEvidence {
    let title_re = regex::Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
    let script_re = regex::Regex::new(r#"(?i)<script[^>]+src=["']([^"']+)["']"#).unwrap();
    let generator_re =
        regex::Regex::new(r#"(?i)<meta[^>]+name=["']generator["'][^>]+content=["']([^"']+)["']"#)
            .unwrap();

    let title = title_re
        .captures(html)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty());
    let script_sources: Vec<String> = script_re
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect();
    let meta_generator = generator_re.captures(html).map(|c| c[1].to_string());

    DomEvidence {
        text: truncate_middle(html, max_chars),
        title,
        script_sources,
        meta_generator,
    }
}

fn build_header_evidence(headers: BTreeMap<String, String>) -> HeaderEvidence {
    let missing_security_headers = SECURITY_HEADERS
        .iter()
        .filter(|h| !headers.contains_key(**h))
        .map(|h| h.to_string())
        .collect();
    HeaderEvidence {
        headers,
        missing_security_headers,
    }
}

/// Coarse grade from HTTPS posture alone. Not a full handshake audit.
fn derive_tls_grade(hsts: Option<&str>) -> TlsEvidence {
    match hsts {
        Some(value) if value.contains("preload") => TlsEvidence {
            grade: "A+".into(),
            hsts: true,
            notes: "HTTPS with preloaded HSTS".into(),
        },
        Some(_) => TlsEvidence {
            grade: "A".into(),
            hsts: true,
            notes: "HTTPS with HSTS".into(),
        },
        None => TlsEvidence {
            grade: "B".into(),
            hsts: false,
            notes: "HTTPS reachable, no HSTS header".into(),
        },
    }
}

/// Parse a DoH response. NXDOMAIN yields an empty address list (the domain
/// confirmably does not exist); a resolver error is a failure.
fn parse_doh_response(doc: &Value, resolver: &str) -> Result<DnsEvidence, String> {
    let status = doc["Status"].as_i64().ok_or("malformed resolver response")?;
    match status {
        0 => {
            let addresses = doc["Answer"]
                .as_array()
                .map(|answers| {
                    answers
                        .iter()
                        .filter(|a| a["type"].as_i64() == Some(1))
                        .filter_map(|a| a["data"].as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
            Ok(DnsEvidence {
                addresses,
                resolver: resolver.to_string(),
            })
        }
        3 => Ok(DnsEvidence {
            addresses: vec![],
            resolver: resolver.to_string(),
        }),
        other => Err(format!("resolver returned status {}", other)),
    }
}

fn parse_crtsh_response(doc: &Value, host: &str, source_url: &str) -> OsintEvidence {
    let mut discovered: Vec<String> = Vec::new();
    if let Some(entries) = doc.as_array() {
        for entry in entries {
            if let Some(names) = entry["name_value"].as_str() {
                for name in names.lines() {
                    let name = name.trim().trim_start_matches("*.").to_lowercase();
                    if !name.is_empty() && name != host && !discovered.contains(&name) {
                        discovered.push(name);
                    }
                }
            }
        }
    }
    discovered.truncate(15);

    let summary = if discovered.is_empty() {
        format!("No additional hosts found in certificate transparency logs for {}", host)
    } else {
        format!(
            "Certificate transparency logs list {} related host(s) for {}",
            discovered.len(),
            host
        )
    };

    OsintEvidence {
        summary,
        discovered_hosts: discovered,
        sources: vec![GroundingSource {
            url: source_url.to_string(),
            title: "Certificate transparency log search".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dom_extracts_signals() {
        let html = r#"<html><head><title> Shop </title>
            <meta name="generator" content="WordPress 6.2">
            <script src="/js/react.production.min.js"></script>
            </head><body>hi</body></html>"#;
        let dom = parse_dom(html, 10_000);
        assert_eq!(dom.title.as_deref(), Some("Shop"));
        assert_eq!(dom.meta_generator.as_deref(), Some("WordPress 6.2"));
        assert_eq!(dom.script_sources, vec!["/js/react.production.min.js"]);
    }

    #[test]
    fn test_parse_dom_empty_input() {
        let dom = parse_dom("", 1000);
        assert!(dom.title.is_none());
        assert!(dom.script_sources.is_empty());
    }

    #[test]
    fn test_missing_security_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("content-security-policy".to_string(), "default-src 'self'".to_string());
        headers.insert("server".to_string(), "nginx".to_string());
        let ev = build_header_evidence(headers);
        assert!(!ev.missing_security_headers.contains(&"content-security-policy".to_string()));
        assert!(ev.missing_security_headers.contains(&"x-frame-options".to_string()));
    }

    #[test]
    fn test_tls_grade_from_hsts() {
        assert_eq!(derive_tls_grade(Some("max-age=63072000; includeSubDomains; preload")).grade, "A+");
        assert_eq!(derive_tls_grade(Some("max-age=31536000")).grade, "A");
        assert_eq!(derive_tls_grade(None).grade, "B");
    }

    #[test]
    fn test_parse_doh_success() {
        let doc = json!({
            "Status": 0,
            "Answer": [
                {"type": 1, "data": "93.184.216.34"},
                {"type": 5, "data": "cname.example.com."}
            ]
        });
        let ev = parse_doh_response(&doc, "https://dns.google/resolve").unwrap();
        assert_eq!(ev.addresses, vec!["93.184.216.34"]);
    }

    #[test]
    fn test_parse_doh_nxdomain_is_empty_not_error() {
        let doc = json!({"Status": 3});
        let ev = parse_doh_response(&doc, "r").unwrap();
        assert!(ev.addresses.is_empty());
    }

    #[test]
    fn test_parse_doh_resolver_error() {
        assert!(parse_doh_response(&json!({"Status": 2}), "r").is_err());
        assert!(parse_doh_response(&json!({"nope": true}), "r").is_err());
    }

    #[test]
    fn test_parse_crtsh_dedupes_and_bounds() {
        let doc = json!([
            {"name_value": "api.example.com\nwww.example.com"},
            {"name_value": "*.example.com\napi.example.com"}
        ]);
        let ev = parse_crtsh_response(&doc, "example.com", "https://crt.sh/?q=example.com");
        assert_eq!(ev.discovered_hosts.len(), 2);
        assert!(ev.discovered_hosts.contains(&"api.example.com".to_string()));
        assert!(!ev.discovered_hosts.contains(&"example.com".to_string()));
    }
}
