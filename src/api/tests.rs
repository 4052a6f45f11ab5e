//! Router tests driven through `tower::ServiceExt::oneshot`

use super::{create_router, AppState};
use crate::assessment::AssessmentContext;
use crate::conversation::prompts::EMPTY_REPLY;
use crate::llm::{LlmError, ModelRegistry};
use crate::runtime::testing::MockLlmClient;
use crate::runtime::RuntimeManager;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(llm: &Arc<MockLlmClient>) -> Router {
    let registry = Arc::new(ModelRegistry::with_service(llm.clone()));
    let runtime = RuntimeManager::new(Arc::clone(&registry), AssessmentContext::default());
    create_router(AppState::new(runtime, registry))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn new_conversation(app: &Router) -> String {
    let (status, body) = call(app, "POST", "/api/conversations/new", None).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_send_message_flow() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    llm.queue_text("I hear you.");
    let app = app(&llm);
    let id = new_conversation(&app).await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/conversations/{id}/send"),
        Some(json!({"text": "I feel anxious"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["status"], "replied");
    let messages = body["state"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[0]["status"], "sent");
    assert_eq!(messages[1]["message"], "I hear you.");
    assert_eq!(body["state"]["loading"], false);

    let (status, body) = call(&app, "GET", &format!("/api/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_send_reports_kind() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    llm.queue_error(LlmError::rate_limit("429"));
    let app = app(&llm);
    let id = new_conversation(&app).await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/conversations/{id}/send"),
        Some(json!({"text": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], json!({"status": "failed", "kind": "rate_limit"}));
    assert_eq!(
        body["state"]["error"],
        "Failed to get response. Please try again."
    );
}

#[tokio::test]
async fn test_unknown_conversation_is_404() {
    let app = app(&Arc::new(MockLlmClient::new("mock")));
    let (status, body) = call(&app, "GET", "/api/conversations/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_assessment_endpoints() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    llm.queue_text("How have you been?");
    llm.queue_text("{\"PHQ-9\": 3}");
    llm.queue_text("PHQ-9: 3\nBDI-II: 5\nHamilton: 4\nVerdict: Minimal symptoms.");
    let app = app(&llm);
    let id = new_conversation(&app).await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/conversations/{id}/assessment/continue"),
        Some(json!({"reply": "yes"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/conversations/{id}/assessment/start"),
        Some(json!({"message": "I want an assessment"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], true);
    assert_eq!(body["state"]["assessment"], "in_progress");

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/conversations/{id}/send"),
        Some(json!({"text": "side question"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/conversations/{id}/assessment/continue"),
        Some(json!({"reply": "not well"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], true);
    assert_eq!(body["scores"], json!({"PHQ-9": 3, "BDI-II": 5, "Hamilton": 4}));
    assert!(body.get("error").is_none());
    assert_eq!(body["state"]["assessment"], "completed");
    assert_eq!(body["state"]["result"]["severity"], "minimal");
}

#[tokio::test]
async fn test_reset_and_close() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    llm.queue_text("hi");
    let app = app(&llm);
    let id = new_conversation(&app).await;
    call(
        &app,
        "POST",
        &format!("/api/conversations/{id}/send"),
        Some(json!({"text": "hello"})),
    )
    .await;

    let (status, body) = call(&app, "POST", &format!("/api/conversations/{id}/reset"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["messages"], json!([]));

    let (status, body) = call(&app, "POST", &format!("/api/conversations/{id}/close"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = call(&app, "GET", &format!("/api/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_endpoint() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    llm.queue_text("Take a slow breath with me.");
    let app = app(&llm);

    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        Some(json!({"messages": [
            {"sender": "user", "message": "I can't sleep", "timestamp": 1},
            {"sender": "ai", "message": "I'm sorry to hear that.", "timestamp": 2},
            {"sender": "user", "message": "Any tips?", "timestamp": 3}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Take a slow breath with me.");

    let request = &llm.recorded_requests()[0];
    assert_eq!(request.messages.len(), 4);
    assert!(request.system_prompt().is_some());
}

#[tokio::test]
async fn test_chat_endpoint_substitutes_empty_reply() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    llm.queue_text("   ");
    let app = app(&llm);

    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        Some(json!({"messages": [{"sender": "user", "message": "hello", "timestamp": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], EMPTY_REPLY);
}

#[tokio::test]
async fn test_chat_endpoint_validation_and_upstream_failure() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    llm.queue_error(LlmError::server_error("upstream down"));
    let app = app(&llm);

    let (status, body) = call(&app, "POST", "/api/chat", Some(json!({"messages": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = call(
        &app,
        "POST",
        "/api/chat",
        Some(json!({"messages": [{"sender": "ai", "message": "hello", "timestamp": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(llm.recorded_requests().is_empty());

    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        Some(json!({"messages": [{"sender": "user", "message": "hi", "timestamp": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream down");
}

#[tokio::test]
async fn test_diagnosis_tracking() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    llm.queue_text("{\"PHQ-9\": 22}");
    llm.queue_text("PHQ-9: 22, BDI-II: 40, Hamilton: 30. Verdict: Severe depression.");
    let app = app(&llm);

    let (_, body) = call(&app, "GET", "/api/diagnoses", None).await;
    assert_eq!(body, json!({"enabled": false, "entries": []}));

    let (status, body) = call(
        &app,
        "POST",
        "/api/diagnoses/tracking",
        Some(json!({"enabled": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], true);

    let id = new_conversation(&app).await;
    call(
        &app,
        "POST",
        &format!("/api/conversations/{id}/assessment/start"),
        Some(json!({"message": "Please assess me"})),
    )
    .await;

    let (_, body) = call(&app, "GET", "/api/diagnoses", None).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["message"], "Please assess me");
    assert_eq!(entries[0]["diagnosis"], "Severe depression.");
    assert_eq!(entries[0]["mood"], "severe");

    let (_, body) = call(
        &app,
        "POST",
        "/api/diagnoses/tracking",
        Some(json!({"enabled": false})),
    )
    .await;
    assert_eq!(body["entries"], json!([]));
}

#[tokio::test]
async fn test_models_and_version() {
    let app = app(&Arc::new(MockLlmClient::new("mock")));

    let (status, body) = call(&app, "GET", "/api/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default"], "mock");

    let response = app
        .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
