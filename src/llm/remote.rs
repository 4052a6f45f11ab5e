//! Remote chat endpoint transport
//!
//! Talks to a `POST /api/chat` endpoint that accepts the UI's own message
//! shape (`{sender, message, timestamp}`) and answers with `{reply}`. The
//! remote server owns its persona prompt, so system turns are not forwarded.

use super::types::{LlmMessage, LlmRequest, LlmResponse, MessageRole};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Who wrote a message on the chat endpoint wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireSender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub sender: WireSender,
    pub message: String,
    pub timestamp: i64,
}

/// `POST /api/chat` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEndpointRequest {
    pub messages: Vec<WireMessage>,
}

/// `POST /api/chat` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEndpointResponse {
    #[serde(default)]
    pub reply: Option<String>,
}

impl ChatEndpointRequest {
    /// Build a request body from completion turns. System turns are dropped.
    pub fn from_turns(turns: &[LlmMessage], timestamp: i64) -> Self {
        let messages = turns
            .iter()
            .filter_map(|turn| {
                let sender = match turn.role {
                    MessageRole::User => WireSender::User,
                    MessageRole::Assistant => WireSender::Ai,
                    MessageRole::System => return None,
                };
                Some(WireMessage {
                    sender,
                    message: turn.content.clone(),
                    timestamp,
                })
            })
            .collect();
        Self { messages }
    }

    /// Schema check applied before a body is sent or accepted.
    pub fn validate(&self) -> Result<(), LlmError> {
        let Some(last) = self.messages.last() else {
            return Err(LlmError::invalid_request("messages must not be empty"));
        };
        if let Some(index) = self
            .messages
            .iter()
            .position(|m| m.message.trim().is_empty())
        {
            return Err(LlmError::invalid_request(format!(
                "messages[{index}].message must not be empty"
            )));
        }
        if last.sender != WireSender::User {
            return Err(LlmError::invalid_request(
                "the last message must come from the user",
            ));
        }
        Ok(())
    }

    /// Convert an accepted body back into completion turns
    pub fn to_turns(&self) -> Vec<LlmMessage> {
        self.messages
            .iter()
            .map(|m| match m.sender {
                WireSender::User => LlmMessage::user(m.message.clone()),
                WireSender::Ai => LlmMessage::assistant(m.message.clone()),
            })
            .collect()
    }
}

/// Completion client backed by a remote chat endpoint
pub struct RemoteChatService {
    client: Client,
    url: String,
    model_id: String,
}

impl RemoteChatService {
    pub const MODEL_ID: &'static str = "remote-chat";

    pub fn new(base_url: &str) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/chat", base_url.trim_end_matches('/')),
            model_id: Self::MODEL_ID.to_string(),
        })
    }
}

#[async_trait]
impl LlmService for RemoteChatService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = ChatEndpointRequest::from_turns(
            &request.messages,
            chrono::Utc::now().timestamp_millis(),
        );
        body.validate()?;

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), &text));
        }

        let parsed: ChatEndpointResponse = response
            .json()
            .await
            .map_err(|e| LlmError::unknown(format!("Failed to parse chat reply: {e}")))?;

        Ok(LlmResponse::text(parsed.reply.unwrap_or_default()))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
