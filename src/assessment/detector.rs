//! Completion predicates for the assessment
//!
//! A predicate inspects a raw model reply during questioning and decides
//! whether the model has moved on to reporting scores.

use super::scores::AssessmentScores;

/// Decides whether a questioning reply ends the assessment
pub type CompletionPredicate = fn(&str) -> bool;

/// The reply contains both a `{` and a `}` anywhere in its text.
///
/// Ordinary prose containing braces also triggers completion.
pub fn braces_present(text: &str) -> bool {
    text.contains('{') && text.contains('}')
}

/// All three scores can be read from the reply
pub fn scores_present(text: &str) -> bool {
    AssessmentScores::parse(text).is_complete()
}

/// Look up a predicate by its configuration name
pub fn predicate_by_name(name: &str) -> Option<CompletionPredicate> {
    match name.trim().to_ascii_lowercase().as_str() {
        "braces" => Some(braces_present),
        "scores" => Some(scores_present),
        _ => None,
    }
}
