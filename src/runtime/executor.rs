//! Per-conversation runtime task
//!
//! Owns a [`Conversation`] exclusively and applies commands one at a time,
//! publishing a fresh snapshot after each.

use crate::conversation::{ChatError, ContinueOutcome, Conversation, ConversationState, SendOutcome};
use crate::diagnosis::DiagnosisLog;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, RwLock};

/// Operation requests delivered to a conversation's task
#[derive(Debug)]
pub enum Command {
    SendMessage {
        text: String,
        respond: oneshot::Sender<Result<SendOutcome, ChatError>>,
    },
    StartAssessment {
        message: String,
        respond: oneshot::Sender<Result<bool, ChatError>>,
    },
    ContinueAssessment {
        reply: String,
        respond: oneshot::Sender<Result<ContinueOutcome, ChatError>>,
    },
    Reset {
        respond: oneshot::Sender<()>,
    },
}

pub struct ConversationRuntime {
    conversation: Conversation,
    command_rx: mpsc::Receiver<Command>,
    state_tx: Arc<watch::Sender<ConversationState>>,
    diagnoses: Arc<RwLock<DiagnosisLog>>,
}

impl ConversationRuntime {
    pub fn new(
        conversation: Conversation,
        command_rx: mpsc::Receiver<Command>,
        state_tx: Arc<watch::Sender<ConversationState>>,
        diagnoses: Arc<RwLock<DiagnosisLog>>,
    ) -> Self {
        Self {
            conversation,
            command_rx,
            state_tx,
            diagnoses,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(conv_id = %self.conversation.id(), "Starting conversation runtime");

        while let Some(command) = self.command_rx.recv().await {
            self.handle(command).await;
        }

        tracing::info!(conv_id = %self.conversation.id(), "Conversation runtime stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::SendMessage { text, respond } => {
                let result = self.conversation.send_message(&text).await;
                self.publish();
                let _ = respond.send(result);
            }
            Command::StartAssessment { message, respond } => {
                let result = self.conversation.start_assessment(&message).await;
                // A run begun by this command can finish on its opening reply
                let began = matches!(result, Ok(true));
                if began && self.conversation.assessment_result().is_some() {
                    self.record_diagnosis().await;
                }
                self.publish();
                let _ = respond.send(result);
            }
            Command::ContinueAssessment { reply, respond } => {
                let result = self.conversation.continue_assessment(&reply).await;
                if matches!(&result, Ok(outcome) if outcome.completed) {
                    self.record_diagnosis().await;
                }
                self.publish();
                let _ = respond.send(result);
            }
            Command::Reset { respond } => {
                self.conversation.reset();
                self.publish();
                let _ = respond.send(());
            }
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.conversation.snapshot());
    }

    async fn record_diagnosis(&self) {
        let (Some(result), Some(opening)) = (
            self.conversation.assessment_result(),
            self.conversation.assessment_opening(),
        ) else {
            return;
        };

        let mut log = self.diagnoses.write().await;
        if let Some(entry) = log.record(opening, result) {
            tracing::info!(
                conv_id = %self.conversation.id(),
                entry_id = %entry.id,
                mood = %entry.mood,
                "Diagnosis recorded"
            );
        }
    }
}
