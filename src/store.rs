//! Append-only chat message log
//!
//! Messages are built from a [`NewMessage`] whose missing fields (id,
//! timestamp, status) are filled in on append. Once appended, a message's id,
//! sender and text never change; only its status may be corrected through
//! [`MessageStore::update_status`].

use crate::llm::{LlmMessage, MessageRole};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
    System,
}

impl Sender {
    pub fn role(self) -> MessageRole {
        match self {
            Sender::User => MessageRole::User,
            Sender::Ai => MessageRole::Assistant,
            Sender::System => MessageRole::System,
        }
    }
}

/// Delivery status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    #[default]
    Sent,
    Error,
}

impl MessageStatus {
    /// Allowed in-place corrections: a pending message settles, and a sent
    /// message can be marked failed when its follow-up call fails.
    fn can_become(self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (MessageStatus::Sending, MessageStatus::Sent | MessageStatus::Error)
                | (MessageStatus::Sent, MessageStatus::Error)
        ) || self == next
    }
}

/// A fully populated message as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub message: String,
    /// Capture time, milliseconds since the Unix epoch
    pub timestamp: i64,
    pub status: MessageStatus,
}

impl ChatMessage {
    pub fn to_turn(&self) -> LlmMessage {
        LlmMessage {
            role: self.sender.role(),
            content: self.message.clone(),
        }
    }
}

/// Message with optional fields, completed by [`MessageStore::append`]
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: Option<String>,
    pub sender: Sender,
    pub message: String,
    pub timestamp: Option<i64>,
    pub status: Option<MessageStatus>,
}

impl NewMessage {
    pub fn new(sender: Sender, message: impl Into<String>) -> Self {
        Self {
            id: None,
            sender,
            message: message.into(),
            timestamp: None,
            status: None,
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(Sender::User, message)
    }

    pub fn ai(message: impl Into<String>) -> Self {
        Self::new(Sender::Ai, message)
    }

    #[must_use]
    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Message text must not be empty")]
    EmptyMessage,
    #[error("Message id already exists: {0}")]
    DuplicateId(String),
    #[error("Message not found: {0}")]
    NotFound(String),
    #[error("Cannot change status of {id} from {from:?} to {to:?}")]
    InvalidStatus {
        id: String,
        from: MessageStatus,
        to: MessageStatus,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered, append-only message log
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
    last_timestamp: i64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill defaults and push to the end of the log
    pub fn append(&mut self, new: NewMessage) -> StoreResult<&ChatMessage> {
        if new.message.trim().is_empty() {
            return Err(StoreError::EmptyMessage);
        }

        let id = match new.id {
            Some(id) if self.get(&id).is_some() => return Err(StoreError::DuplicateId(id)),
            Some(id) => id,
            None => uuid::Uuid::new_v4().to_string(),
        };

        // Wall clock, but never earlier than the previous entry
        let timestamp = new
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis().max(self.last_timestamp));
        self.last_timestamp = self.last_timestamp.max(timestamp);

        let index = self.messages.len();
        self.messages.push(ChatMessage {
            id,
            sender: new.sender,
            message: new.message,
            timestamp,
            status: new.status.unwrap_or_default(),
        });
        Ok(&self.messages[index])
    }

    pub fn update_status(&mut self, id: &str, status: MessageStatus) -> StoreResult<()> {
        let msg = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !msg.status.can_become(status) {
            return Err(StoreError::InvalidStatus {
                id: id.to_string(),
                from: msg.status,
                to: status,
            });
        }
        msg.status = status;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Most recent user message still waiting on a reply
    pub fn pending_user(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::User && m.status == MessageStatus::Sending)
    }

    pub fn snapshot(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Completion turns for messages from `start` onwards. Failed messages
    /// are left out so a resend does not repeat them.
    pub fn turns_since(&self, start: usize) -> Vec<LlmMessage> {
        self.messages
            .get(start..)
            .unwrap_or_default()
            .iter()
            .filter(|m| m.status != MessageStatus::Error)
            .map(ChatMessage::to_turn)
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_append_fills_defaults() {
        let mut store = MessageStore::new();
        let msg = store.append(NewMessage::user("hello")).unwrap().clone();
        assert!(!msg.id.is_empty());
        assert!(msg.timestamp > 0);
        assert_eq!(msg.status, MessageStatus::Sent);
        assert_eq!(msg.sender, Sender::User);
    }

    #[test]
    fn test_append_keeps_explicit_fields() {
        let mut store = MessageStore::new();
        let msg = store
            .append(
                NewMessage::ai("hi")
                    .with_id("fixed")
                    .with_timestamp(1234)
                    .with_status(MessageStatus::Error),
            )
            .unwrap();
        assert_eq!(msg.id, "fixed");
        assert_eq!(msg.timestamp, 1234);
        assert_eq!(msg.status, MessageStatus::Error);
    }

    #[test]
    fn test_append_rejects_blank_and_duplicates() {
        let mut store = MessageStore::new();
        assert_eq!(
            store.append(NewMessage::user("   ")).unwrap_err(),
            StoreError::EmptyMessage
        );
        store.append(NewMessage::user("a").with_id("x")).unwrap();
        assert_eq!(
            store.append(NewMessage::user("b").with_id("x")).unwrap_err(),
            StoreError::DuplicateId("x".to_string())
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_status_corrections() {
        let mut store = MessageStore::new();
        let id = store
            .append(NewMessage::user("hi").with_status(MessageStatus::Sending))
            .unwrap()
            .id
            .clone();
        assert_eq!(store.pending_user().map(|m| m.id.as_str()), Some(id.as_str()));

        store.update_status(&id, MessageStatus::Sent).unwrap();
        assert!(store.pending_user().is_none());
        store.update_status(&id, MessageStatus::Error).unwrap();

        let err = store.update_status(&id, MessageStatus::Sending).unwrap_err();
        assert!(matches!(err, StoreError::InvalidStatus { .. }));
        assert_eq!(
            store.update_status("missing", MessageStatus::Sent).unwrap_err(),
            StoreError::NotFound("missing".to_string())
        );
    }

    #[test]
    fn test_turns_since_skips_failed_messages() {
        let mut store = MessageStore::new();
        store.append(NewMessage::user("before")).unwrap();
        store
            .append(NewMessage::user("failed").with_status(MessageStatus::Error))
            .unwrap();
        store.append(NewMessage::ai("reply")).unwrap();

        let turns = store.turns_since(0);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1], LlmMessage::assistant("reply"));
        assert_eq!(store.turns_since(2).len(), 1);
        assert!(store.turns_since(10).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut store = MessageStore::new();
        store.append(NewMessage::user("hi")).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    proptest! {
        #[test]
        fn prop_append_preserves_order_and_monotonic_time(
            texts in proptest::collection::vec("[a-z]{1,12}", 1..30)
        ) {
            let mut store = MessageStore::new();
            for text in &texts {
                store.append(NewMessage::user(text.clone())).unwrap();
            }
            let snapshot = store.snapshot();
            prop_assert_eq!(snapshot.len(), texts.len());
            for (msg, text) in snapshot.iter().zip(&texts) {
                prop_assert_eq!(&msg.message, text);
            }
            for pair in snapshot.windows(2) {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
                prop_assert_ne!(&pair[0].id, &pair[1].id);
            }
        }
    }
}
