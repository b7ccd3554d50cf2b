use serde::{Deserialize, Serialize};

/// Coarse mission lifecycle. Moves strictly forward; a fatal error resets
/// to Briefing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MissionPhase {
    Briefing,
    Simulation,
    Debriefing,
}

impl std::fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Briefing => write!(f, "briefing"),
            Self::Simulation => write!(f, "simulation"),
            Self::Debriefing => write!(f, "debriefing"),
        }
    }
}

/// Fine-grained activity within the Simulation phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Idle,
    Recon,
    Discovery,
    Probing,
    Triage,
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Recon => write!(f, "recon"),
            Self::Discovery => write!(f, "discovery"),
            Self::Probing => write!(f, "probing"),
            Self::Triage => write!(f, "triage"),
        }
    }
}
