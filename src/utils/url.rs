use crate::errors::SpeculaError;

/// Normalize a raw target into scheme-qualified form. Bare hostnames get
/// `https://`; anything that cannot be a plausible http(s) URL is rejected.
pub fn normalize_target(raw: &str) -> Result<String, SpeculaError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SpeculaError::InvalidTarget("empty target URL".into()));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(SpeculaError::InvalidTarget(format!(
            "target contains whitespace: '{}'", trimmed
        )));
    }

    let url = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let scheme = url.split("://").next().unwrap_or_default().to_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(SpeculaError::InvalidTarget(format!(
            "unsupported scheme '{}'", scheme
        )));
    }

    let host = host_of(&url)
        .ok_or_else(|| SpeculaError::InvalidTarget(format!("no hostname in '{}'", url)))?;
    if !host.contains('.') && host != "localhost" {
        return Err(SpeculaError::InvalidTarget(format!(
            "'{}' does not look like a hostname", host
        )));
    }

    // Strip a bare root slash so probes resolve cleanly against the base.
    Ok(url.trim_end_matches('/').to_string())
}

/// Extract the lowercased hostname from a URL, without port or userinfo.
pub fn host_of(url: &str) -> Option<String> {
    let after_scheme = if url.contains("://") {
        url.splitn(2, "://").nth(1)?
    } else {
        url
    };
    let authority = after_scheme.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = host_port.split(':').next()?.to_lowercase();
    if host.is_empty() { None } else { Some(host) }
}

/// The `scheme://host[:port]` base of a URL.
pub fn base_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    if authority.is_empty() {
        return None;
    }
    Some(format!("{}://{}", scheme, authority))
}

/// Resolve a probe endpoint against the normalized target URL.
/// Absolute http(s) endpoints pass through unchanged (the same-host filter
/// runs separately); non-http schemes are dropped.
pub fn resolve_endpoint(target: &str, endpoint: &str) -> Option<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return None;
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return Some(endpoint.to_string());
    }
    if let Some(rest) = endpoint.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if endpoint.contains("://") {
        return None;
    }
    let base = base_of(target)?;
    if let Some(path) = endpoint.strip_prefix('/') {
        Some(format!("{}/{}", base, path))
    } else {
        Some(format!("{}/{}", base, endpoint))
    }
}

pub fn same_host(a: &str, b: &str) -> bool {
    match (host_of(a), host_of(b)) {
        (Some(ha), Some(hb)) => ha == hb,
        _ => false,
    }
}

/// Hosts that can never be legitimate remote targets for a probe.
pub fn is_private_host(host: &str) -> bool {
    let host = host.to_lowercase();
    if host == "localhost"
        || host == "0.0.0.0"
        || host == "::1"
        || host.ends_with(".local")
        || host.ends_with(".internal")
    {
        return true;
    }
    if host.starts_with("127.")
        || host.starts_with("10.")
        || host.starts_with("192.168.")
        || host.starts_with("169.254.")
    {
        return true;
    }
    if let Some(rest) = host.strip_prefix("172.") {
        if let Some(second) = rest.split('.').next().and_then(|o| o.parse::<u8>().ok()) {
            return (16..=31).contains(&second);
        }
    }
    false
}

/// Dedup key for probe planning: lowercased host + path, query dropped,
/// trailing slash stripped.
pub fn normalize_path_key(url: &str) -> String {
    let host = host_of(url).unwrap_or_default();
    let path = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url)
        .split_once('/')
        .map(|(_, p)| format!("/{}", p))
        .unwrap_or_else(|| "/".to_string());
    let path = path.split(['?', '#']).next().unwrap_or("/");
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
    format!("{}{}", host, path.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme() {
        assert_eq!(normalize_target("example.com").unwrap(), "https://example.com");
        assert_eq!(normalize_target("http://example.com/").unwrap(), "http://example.com");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_target("").is_err());
        assert!(normalize_target("not a url").is_err());
        assert!(normalize_target("ftp://example.com").is_err());
        assert!(normalize_target("https://nodots").is_err());
    }

    #[test]
    fn test_normalize_accepts_localhost() {
        assert_eq!(normalize_target("http://localhost:3000").unwrap(), "http://localhost:3000");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://Example.COM:8443/a/b").unwrap(), "example.com");
        assert_eq!(host_of("https://user@example.com/x").unwrap(), "example.com");
        assert!(host_of("https://").is_none());
    }

    #[test]
    fn test_resolve_endpoint() {
        let target = "https://example.com";
        assert_eq!(
            resolve_endpoint(target, "/api/users").unwrap(),
            "https://example.com/api/users"
        );
        assert_eq!(
            resolve_endpoint(target, "admin").unwrap(),
            "https://example.com/admin"
        );
        assert_eq!(
            resolve_endpoint(target, "http://other.com/x").unwrap(),
            "http://other.com/x"
        );
        assert_eq!(
            resolve_endpoint(target, "//cdn.example.com/x").unwrap(),
            "https://cdn.example.com/x"
        );
        assert!(resolve_endpoint(target, "javascript:alert(1)").is_none());
        assert!(resolve_endpoint(target, "  ").is_none());
    }

    #[test]
    fn test_resolve_endpoint_preserves_port() {
        assert_eq!(
            resolve_endpoint("http://localhost:3000", "/health").unwrap(),
            "http://localhost:3000/health"
        );
    }

    #[test]
    fn test_same_host_ignores_port_and_case() {
        assert!(same_host("https://example.com:443/a", "http://EXAMPLE.com/b"));
        assert!(!same_host("https://example.com", "https://evil.com"));
    }

    #[test]
    fn test_private_hosts() {
        for host in ["localhost", "127.0.0.1", "10.1.2.3", "192.168.0.1", "172.16.0.9", "169.254.1.1", "api.internal"] {
            assert!(is_private_host(host), "{} should be private", host);
        }
        assert!(!is_private_host("example.com"));
        assert!(!is_private_host("172.15.0.1"));
        assert!(!is_private_host("172.32.0.1"));
    }

    #[test]
    fn test_normalize_path_key() {
        assert_eq!(
            normalize_path_key("https://example.com/Admin/"),
            "example.com/admin"
        );
        assert_eq!(
            normalize_path_key("https://example.com/api?x=1"),
            "example.com/api"
        );
        assert_eq!(normalize_path_key("https://example.com"), "example.com/");
    }
}
