use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub at: DateTime<Utc>,
    pub level: TelemetryLevel,
    pub message: String,
}

/// Append-only bounded log of orchestration events. Owned by the
/// orchestrator; consumers receive snapshots. Oldest entries are dropped
/// once capacity is reached so a long mission cannot grow memory unbounded.
#[derive(Debug)]
pub struct TelemetryLog {
    entries: VecDeque<TelemetryEvent>,
    capacity: usize,
}

impl TelemetryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, level: TelemetryLevel, message: impl Into<String>) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(TelemetryEvent {
            at: Utc::now(),
            level,
            message: message.into(),
        });
    }

    pub fn snapshot(&self) -> Vec<TelemetryEvent> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
