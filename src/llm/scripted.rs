//! Offline scripted provider
//!
//! Produces canned replies so the service can be exercised without any API
//! key. Mode is inferred from the request's system turn.

use super::types::{LlmRequest, LlmResponse, MessageRole};
use super::{LlmError, LlmService};
use crate::conversation::prompts::{ASSESSMENT_SYSTEM_PROMPT, SCORE_REQUEST};
use async_trait::async_trait;
use std::time::Duration;

const OPENING_QUESTION: &str = "Hello! I'm here to help assess how you've been feeling. Over the last 2 weeks, how often have you been bothered by feeling down, depressed, or hopeless?";
const AFFIRMATIVE_FOLLOW_UP: &str =
    "I understand. Could you tell me more about what's been on your mind lately?";
const NEGATIVE_FOLLOW_UP: &str =
    "I see. Have you been able to find pleasure in things you usually enjoy?";
const NEUTRAL_FOLLOW_UP: &str = "Thank you for sharing that. How has your sleep been recently?";
/// User answers collected before the script wraps up with scores
const ANSWERS_BEFORE_SCORES: usize = 5;
const SCORE_REPLY: &str = r#"Thank you, I now have enough to assess.
{
  "PHQ-9": 5 (out of 27),
  "BDI-II": 12 (out of 63),
  "Hamilton": 8 (out of 52)
}
Verdict: Based on our conversation, you're showing minimal to mild symptoms of depression. This is a positive sign, but remember that I'm here to help if you ever want to talk more about how you're feeling."#;

/// Canned-reply completion service
pub struct ScriptedService {
    delay: Duration,
}

impl ScriptedService {
    pub const MODEL_ID: &'static str = "scripted";

    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// Simulated latency before each reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn reply_for(request: &LlmRequest) -> String {
        let last = request.last_user_text().unwrap_or_default();

        if request.system_prompt() != Some(ASSESSMENT_SYSTEM_PROMPT) {
            return format!("I received your message: \"{last}\"");
        }

        if last == SCORE_REQUEST {
            return SCORE_REPLY.to_string();
        }

        let user_turns = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();
        if user_turns <= 1 {
            return OPENING_QUESTION.to_string();
        }
        if user_turns > ANSWERS_BEFORE_SCORES {
            return SCORE_REPLY.to_string();
        }

        let lowered = last.to_lowercase();
        if ["yes", "yeah", "sure"].iter().any(|w| lowered.contains(w)) {
            AFFIRMATIVE_FOLLOW_UP.to_string()
        } else if ["no", "not"].iter().any(|w| lowered.contains(w)) {
            NEGATIVE_FOLLOW_UP.to_string()
        } else {
            NEUTRAL_FOLLOW_UP.to_string()
        }
    }
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for ScriptedService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(LlmResponse::text(Self::reply_for(request)))
    }

    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }
}
