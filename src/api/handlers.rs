//! HTTP request handlers

use super::types::{
    ContinueAssessmentRequest, ContinueAssessmentResponse, CreateConversationResponse,
    DiagnosesResponse, ErrorResponse, ModelsResponse, SendMessageRequest, SendMessageResponse,
    StartAssessmentRequest, StartAssessmentResponse, StateResponse, SuccessResponse,
    TrackingRequest,
};
use super::AppState;
use crate::assessment::TransitionError;
use crate::conversation::prompts::CHAT_SYSTEM_PROMPT;
use crate::conversation::{non_empty_reply, ChatError};
use crate::llm::{
    ChatEndpointRequest, ChatEndpointResponse, CompletionOptions, LlmMessage, LlmRequest,
};
use crate::runtime::RuntimeError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Conversation lifecycle
        .route("/api/conversations/new", post(create_conversation))
        .route("/api/conversations/:id", get(get_conversation))
        .route("/api/conversations/:id/reset", post(reset_conversation))
        .route("/api/conversations/:id/close", post(close_conversation))
        // Chat and assessment
        .route("/api/conversations/:id/send", post(send_message))
        .route(
            "/api/conversations/:id/assessment/start",
            post(start_assessment),
        )
        .route(
            "/api/conversations/:id/assessment/continue",
            post(continue_assessment),
        )
        // Stateless chat endpoint
        .route("/api/chat", post(chat))
        // Diagnosis history
        .route("/api/diagnoses", get(list_diagnoses))
        .route("/api/diagnoses/tracking", post(set_tracking))
        // Model info
        .route("/api/models", get(list_models))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversation Lifecycle
// ============================================================

async fn create_conversation(
    State(state): State<AppState>,
) -> Result<Json<CreateConversationResponse>, AppError> {
    let (id, conversation) = state.runtime.create().await?;
    Ok(Json(CreateConversationResponse {
        id,
        state: conversation,
    }))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, AppError> {
    let conversation = state.runtime.snapshot(&id).await?;
    Ok(Json(StateResponse {
        state: conversation,
    }))
}

async fn reset_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, AppError> {
    let conversation = state.runtime.reset(&id).await?;
    Ok(Json(StateResponse {
        state: conversation,
    }))
}

async fn close_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.runtime.close(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Chat and Assessment
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let (outcome, conversation) = state.runtime.send_message(&id, req.text).await?;
    Ok(Json(SendMessageResponse {
        outcome,
        state: conversation,
    }))
}

async fn start_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StartAssessmentRequest>,
) -> Result<Json<StartAssessmentResponse>, AppError> {
    let (started, conversation) = state.runtime.start_assessment(&id, req.message).await?;
    Ok(Json(StartAssessmentResponse {
        started,
        state: conversation,
    }))
}

async fn continue_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ContinueAssessmentRequest>,
) -> Result<Json<ContinueAssessmentResponse>, AppError> {
    let (outcome, conversation) = state.runtime.continue_assessment(&id, req.reply).await?;
    Ok(Json(ContinueAssessmentResponse {
        outcome,
        state: conversation,
    }))
}

// ============================================================
// Stateless Chat Endpoint
// ============================================================

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatEndpointRequest>,
) -> Result<Json<ChatEndpointResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.message))?;

    let llm = state
        .llm_registry
        .default()
        .ok_or_else(|| AppError::Internal("No completion model is available".to_string()))?;

    let mut messages = vec![LlmMessage::system(CHAT_SYSTEM_PROMPT)];
    messages.extend(req.to_turns());
    let request = LlmRequest::new(messages, CompletionOptions::CONVERSATIONAL);

    let response = llm.complete(&request).await.map_err(|e| {
        tracing::warn!(model = %llm.model_id(), error = %e, "Chat endpoint completion failed");
        AppError::BadGateway(e.message)
    })?;

    Ok(Json(ChatEndpointResponse {
        reply: Some(non_empty_reply(response.text)),
    }))
}

// ============================================================
// Diagnosis History
// ============================================================

async fn list_diagnoses(State(state): State<AppState>) -> Json<DiagnosesResponse> {
    let log = state.runtime.diagnoses().read().await;
    Json(DiagnosesResponse {
        enabled: log.is_enabled(),
        entries: log.entries(),
    })
}

async fn set_tracking(
    State(state): State<AppState>,
    Json(req): Json<TrackingRequest>,
) -> Json<DiagnosesResponse> {
    let mut log = state.runtime.diagnoses().write().await;
    log.set_enabled(req.enabled);
    tracing::info!(enabled = req.enabled, "Diagnosis tracking updated");
    Json(DiagnosesResponse {
        enabled: log.is_enabled(),
        entries: log.entries(),
    })
}

// ============================================================
// Model Info
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.llm_registry.available_model_info(),
        default: state.llm_registry.default_model_id().to_string(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("mindsync ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        let message = err.to_string();
        match err {
            RuntimeError::NotFound(_) => AppError::NotFound(message),
            RuntimeError::Busy
            | RuntimeError::Chat(
                ChatError::Busy
                | ChatError::AssessmentInProgress
                | ChatError::AssessmentNotStarted
                | ChatError::Assessment(TransitionError::Busy | TransitionError::NotInProgress),
            ) => AppError::Conflict(message),
            RuntimeError::NoModel
            | RuntimeError::ChannelClosed
            | RuntimeError::Chat(
                ChatError::Store(_) | ChatError::Assessment(TransitionError::InvalidTransition(_)),
            ) => {
                tracing::error!(error = %message, "Conversation operation failed");
                AppError::Internal(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
