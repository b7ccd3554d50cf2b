use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeculaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Service busy: {0}")]
    ServiceBusy(String),

    #[error("Reasoning engine error: {0}")]
    EngineApi(String),

    #[error("Output validation error: {0}")]
    OutputValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
