//! Assessment run state types

use super::detector::{braces_present, predicate_by_name, CompletionPredicate};
use super::scores::AssessmentResult;
use serde::{Deserialize, Serialize};

/// Assessment protocol state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssessmentState {
    /// No assessment has been started in this conversation
    #[default]
    Idle,

    /// The opening question has been requested and has not arrived yet
    Opening {
        /// Store index of the opening user message
        since: usize,
    },

    /// Questions are being asked and answered
    Collecting {
        /// Store index of the opening user message
        since: usize,
        /// Completed question/answer exchanges
        turns: u32,
        /// A user turn was appended and its reply has not arrived yet
        awaiting_reply: bool,
    },

    /// Completion was detected; waiting for the model to restate its scores
    Scoring {
        since: usize,
        turns: u32,
        /// The reply that signalled completion
        draft: String,
    },

    /// Scores and verdict were produced
    Finished {
        since: usize,
        result: AssessmentResult,
    },
}

impl AssessmentState {
    /// Coarse view exposed to the UI
    pub fn run_state(&self) -> AssessmentRunState {
        match self {
            AssessmentState::Idle => AssessmentRunState::Idle,
            AssessmentState::Opening { .. }
            | AssessmentState::Collecting { .. }
            | AssessmentState::Scoring { .. } => AssessmentRunState::InProgress,
            AssessmentState::Finished { .. } => AssessmentRunState::Completed,
        }
    }

    /// Store index where the current run began
    pub fn since(&self) -> Option<usize> {
        match self {
            AssessmentState::Idle => None,
            AssessmentState::Opening { since }
            | AssessmentState::Collecting { since, .. }
            | AssessmentState::Scoring { since, .. }
            | AssessmentState::Finished { since, .. } => Some(*since),
        }
    }

    /// A completion call for this run is outstanding
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            AssessmentState::Opening { .. }
                | AssessmentState::Collecting {
                    awaiting_reply: true,
                    ..
                }
                | AssessmentState::Scoring { .. }
        )
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        match self {
            AssessmentState::Finished { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Lifecycle of an assessment as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentRunState {
    #[default]
    Idle,
    InProgress,
    Completed,
}

/// Immutable configuration for the transition function
#[derive(Debug, Clone, Copy)]
pub struct AssessmentContext {
    pub is_complete: CompletionPredicate,
}

impl AssessmentContext {
    pub fn new(is_complete: CompletionPredicate) -> Self {
        Self { is_complete }
    }

    /// Select the predicate from `MINDSYNC_COMPLETION_DETECTOR`
    /// (`braces` or `scores`), defaulting to braces
    pub fn from_env() -> Self {
        match std::env::var("MINDSYNC_COMPLETION_DETECTOR") {
            Ok(name) => match predicate_by_name(&name) {
                Some(predicate) => Self::new(predicate),
                None => {
                    tracing::warn!(detector = %name, "Unknown completion detector, using braces");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

impl Default for AssessmentContext {
    fn default() -> Self {
        Self::new(braces_present)
    }
}
