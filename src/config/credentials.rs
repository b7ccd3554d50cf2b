use tracing::debug;
use crate::errors::SpeculaError;

/// Minimum plausible key length. Checked before any network call is made.
pub const MIN_KEY_LENGTH: usize = 30;
/// Expected key prefix for the default reasoning provider.
pub const KEY_PREFIX: &str = "AIza";

/// Credential access is injected into the orchestrator; it never reads
/// ambient global state.
pub trait CredentialProvider: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

/// Reads the key from an environment variable at access time.
pub struct EnvCredentials {
    var_name: String,
}

impl EnvCredentials {
    pub fn new(var_name: impl Into<String>) -> Self {
        Self { var_name: var_name.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Option<String> {
        std::env::var(&self.var_name).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed key, typically from a CLI flag.
pub struct StaticCredentials(pub String);

impl CredentialProvider for StaticCredentials {
    fn api_key(&self) -> Option<String> {
        if self.0.is_empty() { None } else { Some(self.0.clone()) }
    }
}

/// Resolve a credential value. A leading '$' marks an environment variable
/// reference.
pub fn resolve_credential(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved credential from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "Environment variable not set, using literal");
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

/// Gate a mission launch on a valid-looking key. Missing and malformed keys
/// are reported distinctly; both classify as `api_key` failures.
pub fn validate_api_key(key: Option<&str>) -> Result<String, SpeculaError> {
    let key = match key {
        Some(k) if !k.trim().is_empty() => k.trim(),
        _ => {
            return Err(SpeculaError::Credential(
                "No API key configured. Set one before launching a mission.".into(),
            ))
        }
    };
    if key.len() < MIN_KEY_LENGTH {
        return Err(SpeculaError::Credential(format!(
            "API key looks malformed: shorter than {} characters",
            MIN_KEY_LENGTH
        )));
    }
    if !key.starts_with(KEY_PREFIX) {
        return Err(SpeculaError::Credential(
            "API key has an unexpected format for this provider".into(),
        ));
    }
    Ok(key.to_string())
}
