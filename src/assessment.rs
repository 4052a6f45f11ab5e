//! Assessment protocol
//!
//! A guided questionnaire run inside a conversation. The model asks
//! questions one at a time; once its reply signals completion it is asked
//! to restate the scores, which are parsed into an [`AssessmentResult`].
//!
//! The protocol is a pure state machine ([`transition`]) whose effects are
//! carried out by the conversation orchestrator.

mod detector;
mod effect;
mod event;
mod scores;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

#[allow(unused_imports)] // Public API re-exports
pub use detector::{braces_present, predicate_by_name, scores_present, CompletionPredicate};
pub use effect::{AssessmentEffect, CompletionPurpose};
pub use event::AssessmentEvent;
pub use scores::{AssessmentResult, AssessmentScores, Severity};
pub use state::{AssessmentContext, AssessmentRunState, AssessmentState};
pub use transition::{transition, TransitionError, TransitionResult};
