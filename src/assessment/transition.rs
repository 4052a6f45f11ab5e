//! Pure assessment transition function
//!
//! Given the current state and an event, decide the next state and the
//! effects the orchestrator must carry out. No I/O happens here.

use super::scores::{AssessmentResult, AssessmentScores};
use super::{
    AssessmentContext, AssessmentEffect, AssessmentEvent, AssessmentState, CompletionPurpose,
};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: AssessmentState,
    pub effects: Vec<AssessmentEffect>,
}

impl TransitionResult {
    pub fn new(state: AssessmentState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: AssessmentEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = AssessmentEffect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Waiting for the assessment reply")]
    Busy,
    #[error("No assessment is in progress")]
    NotInProgress,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &AssessmentState,
    context: &AssessmentContext,
    event: AssessmentEvent,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Opening: allowed from any state that is not waiting on a reply
        (state, AssessmentEvent::Begin { .. }) if state.is_awaiting() => {
            Err(TransitionError::Busy)
        }
        (_, AssessmentEvent::Begin { opening, at }) => Ok(TransitionResult::new(
            AssessmentState::Opening { since: at },
        )
        .with_effects([
            AssessmentEffect::AppendUser { text: opening },
            AssessmentEffect::RequestCompletion {
                purpose: CompletionPurpose::Opening,
            },
        ])),

        // Answers
        (
            AssessmentState::Collecting {
                since,
                turns,
                awaiting_reply: false,
            },
            AssessmentEvent::UserReply { text },
        ) => Ok(TransitionResult::new(AssessmentState::Collecting {
            since: *since,
            turns: *turns,
            awaiting_reply: true,
        })
        .with_effects([
            AssessmentEffect::AppendUser { text },
            AssessmentEffect::RequestCompletion {
                purpose: CompletionPurpose::Continue,
            },
        ])),
        (
            AssessmentState::Opening { .. }
            | AssessmentState::Collecting { .. }
            | AssessmentState::Scoring { .. },
            AssessmentEvent::UserReply { .. },
        ) => Err(TransitionError::Busy),
        (
            AssessmentState::Idle | AssessmentState::Finished { .. },
            AssessmentEvent::UserReply { .. },
        ) => Err(TransitionError::NotInProgress),

        // Model replies
        (AssessmentState::Opening { since }, AssessmentEvent::Reply { text }) => {
            Ok(model_reply(context, *since, 0, text))
        }
        (
            AssessmentState::Collecting {
                since,
                turns,
                awaiting_reply: true,
            },
            AssessmentEvent::Reply { text },
        ) => Ok(model_reply(context, *since, *turns, text)),

        // Score restatement
        (AssessmentState::Scoring { since, draft, .. }, AssessmentEvent::ScoresReply { text }) => {
            let parsed = AssessmentResult::parse(&text);
            let scores = parsed.scores.or(AssessmentScores::parse(draft));
            let result = AssessmentResult::new(scores, parsed.verdict);
            Ok(TransitionResult::new(AssessmentState::Finished {
                since: *since,
                result: result.clone(),
            })
            .with_effect(AssessmentEffect::AppendSummary { result }))
        }

        // Failures
        (AssessmentState::Opening { .. }, AssessmentEvent::CompletionFailed { .. }) => {
            Ok(TransitionResult::new(AssessmentState::Idle)
                .with_effect(AssessmentEffect::RecordFailure))
        }
        (
            AssessmentState::Collecting {
                since,
                turns,
                awaiting_reply: true,
            },
            AssessmentEvent::CompletionFailed { .. },
        )
        | (AssessmentState::Scoring { since, turns, .. }, AssessmentEvent::CompletionFailed { .. }) => {
            Ok(TransitionResult::new(AssessmentState::Collecting {
                since: *since,
                turns: *turns,
                awaiting_reply: false,
            })
            .with_effect(AssessmentEffect::RecordFailure))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

/// A question or completion signal arrived for the outstanding user turn
fn model_reply(
    context: &AssessmentContext,
    since: usize,
    turns: u32,
    text: String,
) -> TransitionResult {
    if (context.is_complete)(&text) {
        TransitionResult::new(AssessmentState::Scoring {
            since,
            turns,
            draft: text,
        })
        .with_effects([
            AssessmentEffect::ResolvePending,
            AssessmentEffect::RequestCompletion {
                purpose: CompletionPurpose::Scoring,
            },
        ])
    } else {
        TransitionResult::new(AssessmentState::Collecting {
            since,
            turns: turns + 1,
            awaiting_reply: false,
        })
        .with_effects([
            AssessmentEffect::ResolvePending,
            AssessmentEffect::AppendReply { text },
        ])
    }
}
