use std::path::Path;
use crate::errors::SpeculaError;
use super::types::SpeculaConfig;

/// Load a configuration file. All sections are optional; omitted fields
/// fall back to defaults.
pub fn load_config(path: &Path) -> Result<SpeculaConfig, SpeculaError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SpeculaError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    let config: SpeculaConfig = serde_yaml::from_str(&content)
        .map_err(|e| SpeculaError::Config(format!("Invalid config {}: {}", path.display(), e)))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "probes:\n  batch_size: 2\n  inter_batch_delay_ms: 100").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.probes.batch_size, 2);
        assert_eq!(config.probes.inter_batch_delay_ms, 100);
        // Untouched sections keep defaults
        assert_eq!(config.telemetry.capacity, 200);
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{}}").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.probes.batch_size, 4);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = load_config(Path::new("/nonexistent/specula.yaml")).unwrap_err();
        assert!(matches!(err, SpeculaError::Config(_)));
    }

    #[test]
    fn test_load_malformed_yaml_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "probes: [not a map").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, SpeculaError::Config(_)));
    }
}
