//! HTTP API for `MindSync`

mod handlers;
#[cfg(test)]
mod tests;
mod types;

pub use handlers::create_router;
pub use types::ModelInfo;

use crate::llm::ModelRegistry;
use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(runtime: RuntimeManager, llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            runtime: Arc::new(runtime),
            llm_registry,
        }
    }
}
