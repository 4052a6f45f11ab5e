//! `MindSync`: mental-health support chat service
//!
//! A Rust backend holding chat conversations and running a guided
//! depression-screening assessment against a completion model.

mod api;
mod assessment;
mod conversation;
mod diagnosis;
mod llm;
mod runtime;
mod store;

use api::{create_router, AppState};
use assessment::AssessmentContext;
use llm::{LlmConfig, ModelRegistry};
use runtime::RuntimeManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindsync=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("MINDSYNC_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    // Initialize completion model registry
    let llm_config = LlmConfig::from_env();
    let llm_registry = Arc::new(ModelRegistry::new(&llm_config));

    if llm_registry.has_live_models() {
        tracing::info!(
            models = ?llm_registry.available_models(),
            default = %llm_registry.default_model_id(),
            "Model registry initialized"
        );
    } else {
        tracing::warn!(
            "No completion provider configured, using scripted replies. \
             Set GROQ_API_KEY, OPENAI_API_KEY or MINDSYNC_REMOTE_CHAT_URL."
        );
    }

    let context = AssessmentContext::from_env();

    // Create application state
    let runtime = RuntimeManager::new(Arc::clone(&llm_registry), context);
    let state = AppState::new(runtime, llm_registry);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("MindSync server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
