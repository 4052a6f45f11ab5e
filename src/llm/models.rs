//! Centralized model definitions for all completion providers

use super::openai::OpenAIModel;
use super::{LlmConfig, LlmService, OpenAIService, RemoteChatService, ScriptedService};
use std::sync::Arc;
use std::time::Duration;

/// Latency the scripted model simulates so the UI's typing state is visible
const SCRIPTED_DELAY: Duration = Duration::from_millis(800);

/// Completion provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Groq,
    OpenAI,
    RemoteChat,
    Scripted,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
            Provider::RemoteChat => "Remote chat endpoint",
            Provider::Scripted => "Scripted (offline)",
        }
    }

    /// Environment variable that enables this provider, if any
    pub fn config_env_var(self) -> Option<&'static str> {
        match self {
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::RemoteChat => Some("MINDSYNC_REMOTE_CHAT_URL"),
            Provider::Scripted => None,
        }
    }
}

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// User-facing model ID
    pub id: &'static str,
    pub provider: Provider,
    pub description: &'static str,
    /// Builds the service; `Err` explains the missing prerequisite
    pub factory: fn(&LlmConfig) -> Result<Arc<dyn LlmService>, String>,
}

fn openai_compatible(
    key: Option<&String>,
    model: OpenAIModel,
    env_var: &str,
) -> Result<Arc<dyn LlmService>, String> {
    let key = key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| format!("{} requires {env_var}", model.model_id()))?;
    let service = OpenAIService::new(key.clone(), model).map_err(|e| e.message)?;
    Ok(Arc::new(service))
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "llama-3-70b-8192",
            provider: Provider::Groq,
            description: "Llama 3 70B on Groq (default)",
            factory: |config| {
                openai_compatible(
                    config.groq_api_key.as_ref(),
                    OpenAIModel::Llama3_70b,
                    "GROQ_API_KEY",
                )
            },
        },
        ModelDef {
            id: "llama-3.1-8b-instant",
            provider: Provider::Groq,
            description: "Llama 3.1 8B on Groq (fast)",
            factory: |config| {
                openai_compatible(
                    config.groq_api_key.as_ref(),
                    OpenAIModel::Llama31_8bInstant,
                    "GROQ_API_KEY",
                )
            },
        },
        ModelDef {
            id: "gpt-4o",
            provider: Provider::OpenAI,
            description: "GPT-4o",
            factory: |config| {
                openai_compatible(
                    config.openai_api_key.as_ref(),
                    OpenAIModel::GPT4o,
                    "OPENAI_API_KEY",
                )
            },
        },
        ModelDef {
            id: "gpt-4o-mini",
            provider: Provider::OpenAI,
            description: "GPT-4o mini (fast, inexpensive)",
            factory: |config| {
                openai_compatible(
                    config.openai_api_key.as_ref(),
                    OpenAIModel::GPT4oMini,
                    "OPENAI_API_KEY",
                )
            },
        },
        ModelDef {
            id: RemoteChatService::MODEL_ID,
            provider: Provider::RemoteChat,
            description: "Relay to a remote /api/chat endpoint",
            factory: |config| {
                let url = config
                    .remote_chat_url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| "remote-chat requires MINDSYNC_REMOTE_CHAT_URL".to_string())?;
                let service = RemoteChatService::new(url).map_err(|e| e.message)?;
                Ok(Arc::new(service))
            },
        },
        ModelDef {
            id: ScriptedService::MODEL_ID,
            provider: Provider::Scripted,
            description: "Canned replies for offline use",
            factory: |_| Ok(Arc::new(ScriptedService::new().with_delay(SCRIPTED_DELAY))),
        },
    ]
}
