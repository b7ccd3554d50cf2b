pub mod types;
pub mod classification;
pub mod retry;

pub use types::SpeculaError;
pub use classification::{ErrorClassification, MissionError, MissionErrorKind};
pub use retry::{RetryConfig, with_retry};
