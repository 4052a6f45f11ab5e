//! Model registry for managing available completion providers

use super::{all_models, LlmService, LoggingService, ScriptedService};
use std::collections::HashMap;
use std::sync::Arc;

/// Model preferred when no default is configured
const PREFERRED_DEFAULT: &str = "llama-3-70b-8192";

/// Configuration for completion providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Base URL of a remote chat API, e.g. `http://localhost:3000/api`
    pub remote_chat_url: Option<String>,
    /// Default model ID
    pub default_model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            groq_api_key: std::env::var("GROQ_API_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            remote_chat_url: std::env::var("MINDSYNC_REMOTE_CHAT_URL").ok(),
            default_model: std::env::var("DEFAULT_MODEL").ok(),
        }
    }
}

/// Registry of available completion models
pub struct ModelRegistry {
    services: HashMap<String, Arc<dyn LlmService>>,
    default_model: String,
}

impl ModelRegistry {
    /// Registry with no models at all
    #[cfg(test)]
    pub fn new_empty() -> Self {
        Self {
            services: HashMap::new(),
            default_model: "test-model".to_string(),
        }
    }

    /// Registry serving a single service as the default (for tests)
    #[cfg(test)]
    pub fn with_service(service: Arc<dyn LlmService>) -> Self {
        let id = service.model_id().to_string();
        let mut services = HashMap::new();
        services.insert(id.clone(), service);
        Self {
            services,
            default_model: id,
        }
    }

    pub fn new(config: &LlmConfig) -> Self {
        let mut services: HashMap<String, Arc<dyn LlmService>> = HashMap::new();

        for model_def in all_models() {
            match (model_def.factory)(config) {
                Ok(service) => {
                    services.insert(
                        model_def.id.to_string(),
                        Arc::new(LoggingService::new(service)),
                    );
                }
                Err(reason) => {
                    tracing::debug!(model = model_def.id, %reason, "Model unavailable");
                }
            }
        }

        let default_model = config
            .default_model
            .clone()
            .filter(|id| {
                let known = services.contains_key(id);
                if !known {
                    tracing::warn!(model = %id, "Configured default model is unavailable");
                }
                known
            })
            .or_else(|| {
                if services.contains_key(PREFERRED_DEFAULT) {
                    return Some(PREFERRED_DEFAULT.to_string());
                }
                // First configured provider in catalog order, scripted last
                all_models()
                    .iter()
                    .map(|m| m.id)
                    .find(|id| *id != ScriptedService::MODEL_ID && services.contains_key(*id))
                    .map(String::from)
            })
            .unwrap_or_else(|| ScriptedService::MODEL_ID.to_string());

        Self {
            services,
            default_model,
        }
    }

    /// Get a model by ID
    pub fn get(&self, model_id: &str) -> Option<Arc<dyn LlmService>> {
        self.services.get(model_id).cloned()
    }

    /// Get the default model
    pub fn default(&self) -> Option<Arc<dyn LlmService>> {
        self.get(&self.default_model)
    }

    pub fn default_model_id(&self) -> &str {
        &self.default_model
    }

    /// List all available model IDs
    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<_> = self.services.keys().cloned().collect();
        models.sort();
        models
    }

    /// Metadata for every available model, in catalog order
    pub fn available_model_info(&self) -> Vec<crate::api::ModelInfo> {
        all_models()
            .iter()
            .filter(|def| self.services.contains_key(def.id))
            .map(|def| crate::api::ModelInfo {
                id: def.id.to_string(),
                provider: def.provider.display_name().to_string(),
                description: def.description.to_string(),
            })
            .collect()
    }

    /// Whether any provider backed by a real model is configured
    pub fn has_live_models(&self) -> bool {
        self.services
            .keys()
            .any(|id| id != ScriptedService::MODEL_ID)
    }
}
