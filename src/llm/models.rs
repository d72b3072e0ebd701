//! Model definitions for all supported providers

use super::openai::{OpenAiCompatService, ProviderModel};
use super::LlmService;
use std::sync::Arc;

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Groq,
    OpenAI,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// User-facing model ID (e.g., "llama-4-scout")
    pub id: &'static str,
    pub provider: Provider,
    pub model: ProviderModel,
    pub description: &'static str,
}

impl ModelDef {
    pub fn create(
        &self,
        api_key: &str,
        gateway: Option<&str>,
    ) -> Result<Arc<dyn LlmService>, String> {
        if api_key.is_empty() {
            return Err(format!(
                "{} requires {} or a gateway",
                self.id,
                self.provider.api_key_env_var()
            ));
        }
        let service = OpenAiCompatService::new(api_key.to_string(), self.model, gateway)
            .map_err(|e| e.to_string())?;
        Ok(Arc::new(service))
    }
}

const MODELS: &[ModelDef] = &[
    ModelDef {
        id: "llama-4-scout",
        provider: Provider::Groq,
        model: ProviderModel::Llama4Scout,
        description: "Llama 4 Scout on Groq (default interviewer)",
    },
    ModelDef {
        id: "llama-3.3-70b",
        provider: Provider::Groq,
        model: ProviderModel::Llama33Versatile,
        description: "Llama 3.3 70B Versatile on Groq",
    },
    ModelDef {
        id: "llama-3.1-8b",
        provider: Provider::Groq,
        model: ProviderModel::Llama31Instant,
        description: "Llama 3.1 8B Instant on Groq (fast grading)",
    },
    ModelDef {
        id: "gpt-4o",
        provider: Provider::OpenAI,
        model: ProviderModel::GPT4o,
        description: "OpenAI GPT-4o",
    },
    ModelDef {
        id: "gpt-4o-mini",
        provider: Provider::OpenAI,
        model: ProviderModel::GPT4oMini,
        description: "OpenAI GPT-4o mini (fast, cheap)",
    },
];

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    MODELS
}
