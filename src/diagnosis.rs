//! Opt-in history of finished assessments

use crate::assessment::AssessmentResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Entries kept before the oldest are dropped
pub const MAX_ENTRIES: usize = 50;

const NEUTRAL_MOOD: &str = "neutral";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// What the user opened the assessment with
    pub message: String,
    pub diagnosis: String,
    pub mood: String,
}

/// Newest-first log, populated only while tracking is enabled
#[derive(Debug, Default)]
pub struct DiagnosisLog {
    enabled: bool,
    entries: VecDeque<DiagnosisEntry>,
}

impl DiagnosisLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning tracking off discards everything recorded so far
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entries.clear();
        }
    }

    /// Record a finished assessment. Returns `None` when tracking is off.
    pub fn record(&mut self, opening: &str, result: &AssessmentResult) -> Option<&DiagnosisEntry> {
        if !self.enabled {
            return None;
        }

        let mood = result
            .severity
            .map_or(NEUTRAL_MOOD, |s| s.label())
            .to_string();
        self.entries.push_front(DiagnosisEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            message: opening.to_string(),
            diagnosis: result.verdict.clone(),
            mood,
        });
        self.entries.truncate(MAX_ENTRIES);
        self.entries.front()
    }

    pub fn entries(&self) -> Vec<DiagnosisEntry> {
        self.entries.iter().cloned().collect()
    }
}
