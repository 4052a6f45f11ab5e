//! Inputs to the assessment state machine

/// Events that drive assessment transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssessmentEvent {
    /// User opens a new assessment; `at` is the store index the opening
    /// message will occupy
    Begin { opening: String, at: usize },

    /// User answers the latest question
    UserReply { text: String },

    /// Model reply to an opening or questioning turn
    Reply { text: String },

    /// Model reply to the score restatement request
    ScoresReply { text: String },

    /// The completion call failed
    CompletionFailed { message: String },
}
