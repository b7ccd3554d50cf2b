use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Intensity;
use crate::errors::MissionError;
use crate::models::mission::{MissionPhase, MissionStatus};
use crate::models::report::{MissionReport, UsageTotals};

/// Observable mission state. Mutated only by the orchestrator; external
/// consumers receive cloned snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionState {
    pub phase: MissionPhase,
    pub status: MissionStatus,
    /// 0-100.
    pub progress: u8,
    pub mission_id: Option<String>,
    pub target: Option<String>,
    pub intensity: Option<Intensity>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<MissionError>,
    pub usage: UsageTotals,
    pub report: Option<MissionReport>,
}

impl MissionState {
    pub fn new() -> Self {
        Self {
            phase: MissionPhase::Briefing,
            status: MissionStatus::Idle,
            progress: 0,
            mission_id: None,
            target: None,
            intensity: None,
            started_at: None,
            finished_at: None,
            error: None,
            usage: UsageTotals::default(),
            report: None,
        }
    }
}

impl Default for MissionState {
    fn default() -> Self {
        Self::new()
    }
}
