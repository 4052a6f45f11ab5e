//! Effects produced by assessment transitions

use super::scores::AssessmentResult;
use crate::llm::CompletionOptions;

/// Which completion call the driver is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPurpose {
    /// Persona prompt plus the opening message
    Opening,
    /// Persona prompt plus the whole run so far
    Continue,
    /// The run so far, the completion reply, and a request to restate scores
    Scoring,
}

impl CompletionPurpose {
    pub fn options(self) -> CompletionOptions {
        match self {
            CompletionPurpose::Opening | CompletionPurpose::Continue => {
                CompletionOptions::CONVERSATIONAL
            }
            CompletionPurpose::Scoring => CompletionOptions::SCORING,
        }
    }
}

/// Effects to be executed by the orchestrator after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssessmentEffect {
    /// Append a user message in `sending` status
    AppendUser { text: String },

    /// Issue a completion call; its outcome becomes the next event
    RequestCompletion { purpose: CompletionPurpose },

    /// Settle the pending user message as `sent`
    ResolvePending,

    /// Append a model reply verbatim
    AppendReply { text: String },

    /// Append the formatted score summary
    AppendSummary { result: AssessmentResult },

    /// Mark the most recent message `error` and append the fallback reply
    RecordFailure,
}
