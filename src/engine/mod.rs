pub mod provider;
pub mod payload;
pub mod gemini;
pub mod sanitize;

pub use provider::{AnalysisRequest, EngineAnalysis, ReasoningEngine};
pub use payload::{build_payload, EvidencePayload};
pub use gemini::GeminiEngine;
pub use sanitize::{sanitize_engine_report, EngineReport};
