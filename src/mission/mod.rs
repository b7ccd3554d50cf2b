pub mod orchestrator;
pub mod preflight;
pub mod scoring;
pub mod state;
pub mod telemetry;

pub use orchestrator::{LaunchOptions, MissionOrchestrator};
pub use state::MissionState;
pub use telemetry::{TelemetryEvent, TelemetryLevel, TelemetryLog};
