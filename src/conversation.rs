//! Conversation orchestrator
//!
//! Owns one conversation's message log, request lifecycle flags and
//! assessment state. Every public operation settles before returning:
//! `loading` is cleared and no message is left in `sending` status,
//! whatever the completion client does.

pub mod prompts;

use crate::assessment::{
    transition, AssessmentContext, AssessmentEffect, AssessmentEvent, AssessmentResult,
    AssessmentRunState, AssessmentScores, AssessmentState, CompletionPurpose, TransitionError,
};
use crate::llm::{CompletionOptions, LlmError, LlmErrorKind, LlmMessage, LlmRequest, LlmService};
use crate::store::{ChatMessage, MessageStatus, MessageStore, NewMessage, StoreError};
use prompts::{
    ASSESSMENT_CONTINUE_ERROR, ASSESSMENT_FALLBACK, ASSESSMENT_START_ERROR,
    ASSESSMENT_SYSTEM_PROMPT, CHAT_ERROR, CHAT_FALLBACK, CHAT_SYSTEM_PROMPT, EMPTY_REPLY,
    SCORE_REQUEST,
};
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use thiserror::Error;

/// Externally observable state, rendered by the UI after every operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
    pub is_typing: bool,
    pub error: Option<String>,
    pub assessment: AssessmentRunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AssessmentResult>,
}

/// Result of `send_message`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendOutcome {
    /// Blank input; nothing changed
    Ignored,
    Replied,
    /// The completion call failed and the fallback reply was appended
    Failed { kind: LlmErrorKind },
}

/// Result of `continue_assessment`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContinueOutcome {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<AssessmentScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AssessmentResult>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("A request is already in flight for this conversation")]
    Busy,
    #[error("An assessment is in progress; continue or reset it first")]
    AssessmentInProgress,
    #[error("No assessment is in progress")]
    AssessmentNotStarted,
    #[error(transparent)]
    Assessment(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Conversation {
    id: String,
    store: MessageStore,
    loading: bool,
    is_typing: bool,
    error: Option<String>,
    assessment: AssessmentState,
    context: AssessmentContext,
    llm: Arc<dyn LlmService>,
}

/// Holds `loading` for the duration of one operation. On every exit path,
/// including early returns and dropped futures, it releases `loading` and
/// settles anything the operation left outstanding.
struct InFlight<'a> {
    conversation: &'a mut Conversation,
}

impl Deref for InFlight<'_> {
    type Target = Conversation;

    fn deref(&self) -> &Conversation {
        self.conversation
    }
}

impl DerefMut for InFlight<'_> {
    fn deref_mut(&mut self) -> &mut Conversation {
        self.conversation
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.conversation.settle_interrupted();
        self.conversation.loading = false;
        self.conversation.is_typing = false;
    }
}

impl Conversation {
    pub fn new(
        id: impl Into<String>,
        llm: Arc<dyn LlmService>,
        context: AssessmentContext,
    ) -> Self {
        Self {
            id: id.into(),
            store: MessageStore::new(),
            loading: false,
            is_typing: false,
            error: None,
            assessment: AssessmentState::Idle,
            context,
            llm,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn begin(&mut self) -> Result<InFlight<'_>, ChatError> {
        if self.loading {
            return Err(ChatError::Busy);
        }
        self.loading = true;
        self.is_typing = true;
        self.error = None;
        Ok(InFlight { conversation: self })
    }

    /// Free-form chat turn
    pub async fn send_message(&mut self, text: &str) -> Result<SendOutcome, ChatError> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        if self.assessment.run_state() == AssessmentRunState::InProgress {
            return Err(ChatError::AssessmentInProgress);
        }

        let mut this = self.begin()?;
        let user_id = this
            .store
            .append(NewMessage::user(text).with_status(MessageStatus::Sending))?
            .id
            .clone();

        let mut messages = vec![LlmMessage::system(CHAT_SYSTEM_PROMPT)];
        messages.extend(this.store.turns_since(0));
        let request = LlmRequest::new(messages, CompletionOptions::CONVERSATIONAL);

        let llm = Arc::clone(&this.llm);
        match llm.complete(&request).await {
            Ok(response) => {
                this.store.update_status(&user_id, MessageStatus::Sent)?;
                this.store.append(NewMessage::ai(non_empty_reply(response.text)))?;
                Ok(SendOutcome::Replied)
            }
            Err(e) => {
                tracing::warn!(conv_id = %this.id, error = %e, "Chat completion failed");
                this.store.update_status(&user_id, MessageStatus::Error)?;
                this.store
                    .append(NewMessage::ai(CHAT_FALLBACK).with_status(MessageStatus::Error))?;
                this.error = Some(CHAT_ERROR.to_string());
                Ok(SendOutcome::Failed { kind: e.kind })
            }
        }
    }

    /// Open a new assessment run. Returns whether the run is underway.
    pub async fn start_assessment(&mut self, opening: &str) -> Result<bool, ChatError> {
        if opening.trim().is_empty() {
            return Ok(false);
        }

        let mut this = self.begin()?;
        let at = this.store.len();
        let failure = this
            .drive(AssessmentEvent::Begin {
                opening: opening.to_string(),
                at,
            })
            .await?;

        if failure.is_some() {
            this.error = Some(ASSESSMENT_START_ERROR.to_string());
        }
        Ok(this.assessment.run_state() != AssessmentRunState::Idle)
    }

    /// Answer the latest assessment question
    pub async fn continue_assessment(&mut self, reply: &str) -> Result<ContinueOutcome, ChatError> {
        if self.assessment.run_state() != AssessmentRunState::InProgress {
            return Err(ChatError::AssessmentNotStarted);
        }
        if reply.trim().is_empty() {
            return Ok(ContinueOutcome::default());
        }

        let mut this = self.begin()?;
        let failure = this
            .drive(AssessmentEvent::UserReply {
                text: reply.to_string(),
            })
            .await?;

        if failure.is_some() {
            this.error = Some(ASSESSMENT_CONTINUE_ERROR.to_string());
            return Ok(ContinueOutcome {
                error: true,
                ..Default::default()
            });
        }

        Ok(match this.assessment.result() {
            Some(result) => ContinueOutcome {
                completed: true,
                scores: Some(result.scores),
                result: Some(result.clone()),
                error: false,
            },
            None => ContinueOutcome::default(),
        })
    }

    /// Back to an empty conversation
    pub fn reset(&mut self) {
        self.store.clear();
        self.loading = false;
        self.is_typing = false;
        self.error = None;
        self.assessment = AssessmentState::Idle;
    }

    pub fn snapshot(&self) -> ConversationState {
        ConversationState {
            messages: self.store.snapshot().to_vec(),
            loading: self.loading,
            is_typing: self.is_typing,
            error: self.error.clone(),
            assessment: self.assessment.run_state(),
            result: self.assessment.result().cloned(),
        }
    }

    pub fn assessment_result(&self) -> Option<&AssessmentResult> {
        self.assessment.result()
    }

    /// Text the user opened the current assessment run with
    pub fn assessment_opening(&self) -> Option<&str> {
        let since = self.assessment.since()?;
        self.store.snapshot().get(since).map(|m| m.message.as_str())
    }

    /// Feed an event through the assessment state machine and execute the
    /// resulting effects until no completion call is outstanding. Returns
    /// the completion failure, if one happened along the way.
    async fn drive(&mut self, event: AssessmentEvent) -> Result<Option<LlmError>, ChatError> {
        let mut next = Some(event);
        let mut failure = None;

        while let Some(event) = next.take() {
            let result = transition(&self.assessment, &self.context, event)?;
            self.assessment = result.new_state;

            for effect in result.effects {
                match effect {
                    AssessmentEffect::RequestCompletion { purpose } => {
                        let request = self.assessment_request(purpose);
                        let llm = Arc::clone(&self.llm);
                        next = Some(match llm.complete(&request).await {
                            Ok(response) if purpose == CompletionPurpose::Scoring => {
                                AssessmentEvent::ScoresReply {
                                    text: response.text,
                                }
                            }
                            Ok(response) => AssessmentEvent::Reply {
                                text: response.text,
                            },
                            Err(e) => {
                                tracing::warn!(
                                    conv_id = %self.id,
                                    ?purpose,
                                    error = %e,
                                    "Assessment completion failed"
                                );
                                let message = e.message.clone();
                                failure = Some(e);
                                AssessmentEvent::CompletionFailed { message }
                            }
                        });
                    }
                    other => self.apply(other)?,
                }
            }
        }

        if let AssessmentState::Finished { result, .. } = &self.assessment {
            tracing::info!(
                conv_id = %self.id,
                phq9 = ?result.scores.phq9,
                bdi_ii = ?result.scores.bdi_ii,
                hamilton = ?result.scores.hamilton,
                "Assessment finished"
            );
        }
        Ok(failure)
    }

    fn apply(&mut self, effect: AssessmentEffect) -> Result<(), ChatError> {
        match effect {
            AssessmentEffect::AppendUser { text } => {
                self.store
                    .append(NewMessage::user(text).with_status(MessageStatus::Sending))?;
            }
            AssessmentEffect::ResolvePending => {
                if let Some(id) = self.store.pending_user().map(|m| m.id.clone()) {
                    self.store.update_status(&id, MessageStatus::Sent)?;
                }
            }
            AssessmentEffect::AppendReply { text } => {
                self.store.append(NewMessage::ai(non_empty_reply(text)))?;
            }
            AssessmentEffect::AppendSummary { result } => {
                self.store.append(NewMessage::ai(result.summary()))?;
            }
            AssessmentEffect::RecordFailure => {
                if let Some(id) = self.store.last().map(|m| m.id.clone()) {
                    self.store.update_status(&id, MessageStatus::Error)?;
                }
                self.store.append(
                    NewMessage::ai(ASSESSMENT_FALLBACK).with_status(MessageStatus::Error),
                )?;
            }
            // Executed by `drive`, which owns the await point
            AssessmentEffect::RequestCompletion { .. } => {}
        }
        Ok(())
    }

    /// Resolve a completion call that will never answer: the assessment
    /// leaves its waiting state and no user message stays `sending`.
    /// A no-op after an operation that ran to completion.
    fn settle_interrupted(&mut self) {
        if self.assessment.is_awaiting() {
            let cancelled = AssessmentEvent::CompletionFailed {
                message: "completion interrupted".to_string(),
            };
            let settled = transition(&self.assessment, &self.context, cancelled)
                .map_err(ChatError::from)
                .and_then(|result| {
                    self.assessment = result.new_state;
                    result.effects.into_iter().try_for_each(|e| self.apply(e))
                });
            if let Err(e) = settled {
                tracing::warn!(conv_id = %self.id, error = %e, "Failed to settle assessment");
            }
        }

        if let Some(id) = self.store.pending_user().map(|m| m.id.clone()) {
            if let Err(e) = self.store.update_status(&id, MessageStatus::Error) {
                tracing::warn!(conv_id = %self.id, error = %e, "Failed to settle message");
            }
        }
    }

    /// Persona turn plus everything since the run began
    fn assessment_request(&self, purpose: CompletionPurpose) -> LlmRequest {
        let since = self.assessment.since().unwrap_or(0);
        let mut messages = vec![LlmMessage::system(ASSESSMENT_SYSTEM_PROMPT)];
        messages.extend(self.store.turns_since(since));
        if let AssessmentState::Scoring { draft, .. } = &self.assessment {
            messages.push(LlmMessage::assistant(draft.clone()));
            messages.push(LlmMessage::user(SCORE_REQUEST));
        }
        LlmRequest::new(messages, purpose.options())
    }
}

/// Model text shown to the user, with a gentle stand-in for an empty reply
pub fn non_empty_reply(text: String) -> String {
    if text.trim().is_empty() {
        EMPTY_REPLY.to_string()
    } else {
        text
    }
}
