//! Property-based tests for the assessment state machine

use super::*;
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z ?.{}:0-9]{1,60}"
}

fn arb_state() -> impl Strategy<Value = AssessmentState> {
    prop_oneof![
        Just(AssessmentState::Idle),
        (0usize..50).prop_map(|since| AssessmentState::Opening { since }),
        (0usize..50, 0u32..20, any::<bool>()).prop_map(|(since, turns, awaiting_reply)| {
            AssessmentState::Collecting {
                since,
                turns,
                awaiting_reply,
            }
        }),
        (0usize..50, 0u32..20, arb_text()).prop_map(|(since, turns, draft)| {
            AssessmentState::Scoring {
                since,
                turns,
                draft,
            }
        }),
        (0usize..50, arb_text()).prop_map(|(since, text)| AssessmentState::Finished {
            since,
            result: AssessmentResult::parse(&text),
        }),
    ]
}

fn arb_event() -> impl Strategy<Value = AssessmentEvent> {
    prop_oneof![
        (arb_text(), 0usize..100).prop_map(|(opening, at)| AssessmentEvent::Begin { opening, at }),
        arb_text().prop_map(|text| AssessmentEvent::UserReply { text }),
        arb_text().prop_map(|text| AssessmentEvent::Reply { text }),
        arb_text().prop_map(|text| AssessmentEvent::ScoresReply { text }),
        arb_text().prop_map(|message| AssessmentEvent::CompletionFailed { message }),
    ]
}

fn arb_context() -> impl Strategy<Value = AssessmentContext> {
    prop_oneof![
        Just(AssessmentContext::new(braces_present)),
        Just(AssessmentContext::new(scores_present)),
    ]
}

fn requests_completion(effects: &[AssessmentEffect]) -> bool {
    effects
        .iter()
        .any(|e| matches!(e, AssessmentEffect::RequestCompletion { .. }))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// A completion is requested exactly when the new state waits for one
    #[test]
    fn prop_request_iff_awaiting(state in arb_state(), event in arb_event(), ctx in arb_context()) {
        if let Ok(result) = transition(&state, &ctx, event) {
            prop_assert_eq!(requests_completion(&result.effects), result.new_state.is_awaiting());
        }
    }

    /// While a reply is outstanding the user cannot add input
    #[test]
    fn prop_waiting_rejects_user_input(state in arb_state(), text in arb_text(), at in 0usize..100) {
        prop_assume!(state.is_awaiting());
        let ctx = AssessmentContext::default();
        prop_assert_eq!(
            transition(&state, &ctx, AssessmentEvent::UserReply { text: text.clone() }).unwrap_err(),
            TransitionError::Busy
        );
        prop_assert_eq!(
            transition(&state, &ctx, AssessmentEvent::Begin { opening: text, at }).unwrap_err(),
            TransitionError::Busy
        );
    }

    /// The run's starting index never moves except on Begin
    #[test]
    fn prop_since_is_stable(state in arb_state(), event in arb_event(), ctx in arb_context()) {
        let is_begin = matches!(event, AssessmentEvent::Begin { .. });
        if let Ok(result) = transition(&state, &ctx, event) {
            if !is_begin && result.new_state != AssessmentState::Idle {
                prop_assert_eq!(result.new_state.since(), state.since());
            }
        }
    }

    /// Failures always leave a state that accepts new user input
    #[test]
    fn prop_failure_releases_wait(state in arb_state(), message in arb_text()) {
        prop_assume!(state.is_awaiting());
        let result = transition(&state, &AssessmentContext::default(), AssessmentEvent::CompletionFailed { message }).unwrap();
        prop_assert!(!result.new_state.is_awaiting());
        prop_assert_eq!(result.effects, vec![AssessmentEffect::RecordFailure]);
    }

    /// Any event sequence keeps the state machine consistent
    #[test]
    fn prop_sequences_never_panic(events in proptest::collection::vec(arb_event(), 0..25)) {
        let ctx = AssessmentContext::default();
        let mut state = AssessmentState::Idle;
        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                if let AssessmentState::Finished { result: outcome, .. } = &result.new_state {
                    prop_assert!(!outcome.verdict.is_empty());
                }
                state = result.new_state;
            }
        }
    }
}
