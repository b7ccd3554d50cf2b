use crate::models::probe::{HttpMethod, ProbePlan};

pub struct SensitivePath {
    pub path: &'static str,
    pub description: &'static str,
    pub expected_behavior: &'static str,
}

/// Well-known sensitive paths probed on every mission, merged with
/// engine-suggested probes at planning time.
pub static SENSITIVE_PATHS: &[SensitivePath] = &[
    SensitivePath {
        path: "/.env",
        description: "Environment file with credentials",
        expected_behavior: "Should return 404 or be blocked",
    },
    SensitivePath {
        path: "/.git/config",
        description: "Exposed git repository metadata",
        expected_behavior: "Should return 404 or be blocked",
    },
    SensitivePath {
        path: "/admin",
        description: "Administrative interface",
        expected_behavior: "Should require authentication or return 404",
    },
    SensitivePath {
        path: "/wp-login.php",
        description: "WordPress login page",
        expected_behavior: "Should return 404 unless the site runs WordPress",
    },
    SensitivePath {
        path: "/server-status",
        description: "Apache server status page",
        expected_behavior: "Should be access denied or 404",
    },
    SensitivePath {
        path: "/phpinfo.php",
        description: "PHP configuration disclosure",
        expected_behavior: "Should return 404",
    },
    SensitivePath {
        path: "/config.json",
        description: "Application configuration file",
        expected_behavior: "Should return 404 or require authentication",
    },
    SensitivePath {
        path: "/backup.zip",
        description: "Site backup archive",
        expected_behavior: "Should return 404",
    },
    SensitivePath {
        path: "/swagger.json",
        description: "OpenAPI specification",
        expected_behavior: "Should not expose internal API surface publicly",
    },
    SensitivePath {
        path: "/api-docs",
        description: "API documentation endpoint",
        expected_behavior: "Should not expose internal API surface publicly",
    },
    SensitivePath {
        path: "/graphql",
        description: "GraphQL endpoint, introspection risk",
        expected_behavior: "Should reject unauthenticated introspection",
    },
    SensitivePath {
        path: "/.DS_Store",
        description: "macOS directory listing artifact",
        expected_behavior: "Should return 404",
    },
    SensitivePath {
        path: "/.well-known/security.txt",
        description: "Security contact disclosure",
        expected_behavior: "Informational; 200 is acceptable",
    },
    SensitivePath {
        path: "/robots.txt",
        description: "Crawler policy, may reveal hidden paths",
        expected_behavior: "Informational; 200 is acceptable",
    },
    SensitivePath {
        path: "/debug",
        description: "Debug endpoint left enabled",
        expected_behavior: "Should return 404 in production",
    },
    SensitivePath {
        path: "/actuator/health",
        description: "Spring Boot actuator endpoint",
        expected_behavior: "Should be restricted or 404",
    },
];

/// The static table as target-relative probe plans.
pub fn static_probes() -> Vec<ProbePlan> {
    SENSITIVE_PATHS
        .iter()
        .map(|entry| ProbePlan {
            method: HttpMethod::Get,
            endpoint: entry.path.to_string(),
            payload: None,
            description: entry.description.to_string(),
            expected_behavior: entry.expected_behavior.to_string(),
        })
        .collect()
}
