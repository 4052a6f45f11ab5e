//! Runtime for executing conversations
//!
//! Each conversation runs on its own task and is only mutated there. The
//! manager hands out cloneable [`ConversationHandle`]s that enqueue
//! commands and read the latest published snapshot.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{Command, ConversationRuntime};

use crate::assessment::AssessmentContext;
use crate::conversation::{ChatError, ContinueOutcome, Conversation, ConversationState, SendOutcome};
use crate::diagnosis::DiagnosisLog;
use crate::llm::ModelRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch, RwLock};

const COMMAND_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Conversation not found: {0}")]
    NotFound(String),
    #[error("A request is already in flight for this conversation")]
    Busy,
    #[error("No completion model is available")]
    NoModel,
    #[error("Conversation runtime stopped")]
    ChannelClosed,
    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    command_tx: mpsc::Sender<Command>,
    state_tx: Arc<watch::Sender<ConversationState>>,
}

impl ConversationHandle {
    /// Latest published state
    pub fn snapshot(&self) -> ConversationState {
        self.state_tx.borrow().clone()
    }

    /// Mark the published state as loading unless it already is
    fn try_acquire(&self) -> bool {
        self.state_tx.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.loading = true;
            state.is_typing = true;
            true
        })
    }

    fn release(&self) {
        self.state_tx.send_modify(|state| {
            state.loading = false;
            state.is_typing = false;
        });
    }

    /// Enqueue an operation that needs exclusive use of the conversation
    async fn exclusive<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        if !self.try_acquire() {
            return Err(RuntimeError::Busy);
        }
        let (tx, rx) = oneshot::channel();
        if let Err(e) = self.command_tx.try_send(make(tx)) {
            self.release();
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => RuntimeError::Busy,
                mpsc::error::TrySendError::Closed(_) => RuntimeError::ChannelClosed,
            });
        }
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    pub async fn send_message(&self, text: String) -> Result<SendOutcome, RuntimeError> {
        let outcome = self
            .exclusive(|respond| Command::SendMessage { text, respond })
            .await??;
        Ok(outcome)
    }

    pub async fn start_assessment(&self, message: String) -> Result<bool, RuntimeError> {
        let started = self
            .exclusive(|respond| Command::StartAssessment { message, respond })
            .await??;
        Ok(started)
    }

    pub async fn continue_assessment(&self, reply: String) -> Result<ContinueOutcome, RuntimeError> {
        let outcome = self
            .exclusive(|respond| Command::ContinueAssessment { reply, respond })
            .await??;
        Ok(outcome)
    }

    /// Queued behind any in-flight operation rather than rejected
    pub async fn reset(&self) -> Result<(), RuntimeError> {
        let (respond, rx) = oneshot::channel();
        self.command_tx
            .send(Command::Reset { respond })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

/// Manager for all conversation runtimes
pub struct RuntimeManager {
    llm_registry: Arc<ModelRegistry>,
    context: AssessmentContext,
    diagnoses: Arc<RwLock<DiagnosisLog>>,
    runtimes: RwLock<HashMap<String, ConversationHandle>>,
}

impl RuntimeManager {
    pub fn new(llm_registry: Arc<ModelRegistry>, context: AssessmentContext) -> Self {
        Self {
            llm_registry,
            context,
            diagnoses: Arc::new(RwLock::new(DiagnosisLog::new())),
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    pub fn diagnoses(&self) -> &Arc<RwLock<DiagnosisLog>> {
        &self.diagnoses
    }

    /// Start a new, empty conversation on the default model
    pub async fn create(&self) -> Result<(String, ConversationState), RuntimeError> {
        let llm = self.llm_registry.default().ok_or(RuntimeError::NoModel)?;
        let id = uuid::Uuid::new_v4().to_string();
        let conversation = Conversation::new(&id, llm, self.context);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let state_tx = Arc::new(watch::Sender::new(conversation.snapshot()));
        let runtime = ConversationRuntime::new(
            conversation,
            command_rx,
            Arc::clone(&state_tx),
            Arc::clone(&self.diagnoses),
        );

        let handle = ConversationHandle {
            command_tx,
            state_tx,
        };
        let state = handle.snapshot();
        self.runtimes.write().await.insert(id.clone(), handle);

        tokio::spawn(runtime.run());
        tracing::info!(
            conv_id = %id,
            model = %self.llm_registry.default_model_id(),
            "Created conversation"
        );
        Ok((id, state))
    }

    pub async fn get(&self, id: &str) -> Result<ConversationHandle, RuntimeError> {
        self.runtimes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }

    pub async fn snapshot(&self, id: &str) -> Result<ConversationState, RuntimeError> {
        Ok(self.get(id).await?.snapshot())
    }

    pub async fn send_message(
        &self,
        id: &str,
        text: String,
    ) -> Result<(SendOutcome, ConversationState), RuntimeError> {
        let handle = self.get(id).await?;
        let outcome = handle.send_message(text).await?;
        Ok((outcome, handle.snapshot()))
    }

    pub async fn start_assessment(
        &self,
        id: &str,
        message: String,
    ) -> Result<(bool, ConversationState), RuntimeError> {
        let handle = self.get(id).await?;
        let started = handle.start_assessment(message).await?;
        Ok((started, handle.snapshot()))
    }

    pub async fn continue_assessment(
        &self,
        id: &str,
        reply: String,
    ) -> Result<(ContinueOutcome, ConversationState), RuntimeError> {
        let handle = self.get(id).await?;
        let outcome = handle.continue_assessment(reply).await?;
        Ok((outcome, handle.snapshot()))
    }

    pub async fn reset(&self, id: &str) -> Result<ConversationState, RuntimeError> {
        let handle = self.get(id).await?;
        handle.reset().await?;
        Ok(handle.snapshot())
    }

    /// Reset and forget a conversation; its task ends once the last handle
    /// is dropped
    pub async fn close(&self, id: &str) -> Result<(), RuntimeError> {
        let handle = self
            .runtimes
            .write()
            .await
            .remove(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        handle.reset().await?;
        tracing::info!(conv_id = %id, "Closed conversation");
        Ok(())
    }
}
