//! API request and response types

use crate::conversation::{ContinueOutcome, ConversationState, SendOutcome};
use crate::diagnosis::DiagnosisEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct StartAssessmentRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ContinueAssessmentRequest {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackingRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateConversationResponse {
    pub id: String,
    pub state: ConversationState,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: ConversationState,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub outcome: SendOutcome,
    pub state: ConversationState,
}

#[derive(Debug, Serialize)]
pub struct StartAssessmentResponse {
    pub started: bool,
    pub state: ConversationState,
}

#[derive(Debug, Serialize)]
pub struct ContinueAssessmentResponse {
    #[serde(flatten)]
    pub outcome: ContinueOutcome,
    pub state: ConversationState,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct DiagnosesResponse {
    pub enabled: bool,
    pub entries: Vec<DiagnosisEntry>,
}

/// Model information with metadata
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
    pub description: String,
}

/// Response for model list
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
