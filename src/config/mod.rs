pub mod types;
pub mod parser;
pub mod credentials;

pub use types::{
    CollectorConfig, EngineConfig, Intensity, ProbeConfig, SpeculaConfig, TelemetryConfig,
};
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials, validate_api_key};
