//! `OpenAI`-compatible chat completions (`OpenAI` and Groq)

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService, Provider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Models reachable through a chat/completions endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderModel {
    // Groq-hosted open models
    Llama4Scout,
    Llama33Versatile,
    Llama31Instant,
    // OpenAI
    GPT4o,
    GPT4oMini,
}

impl ProviderModel {
    pub fn api_name(self) -> &'static str {
        match self {
            ProviderModel::Llama4Scout => "meta-llama/llama-4-scout-17b-16e-instruct",
            ProviderModel::Llama33Versatile => "llama-3.3-70b-versatile",
            ProviderModel::Llama31Instant => "llama-3.1-8b-instant",
            ProviderModel::GPT4o => "gpt-4o",
            ProviderModel::GPT4oMini => "gpt-4o-mini",
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            ProviderModel::Llama4Scout => "llama-4-scout",
            ProviderModel::Llama33Versatile => "llama-3.3-70b",
            ProviderModel::Llama31Instant => "llama-3.1-8b",
            ProviderModel::GPT4o => "gpt-4o",
            ProviderModel::GPT4oMini => "gpt-4o-mini",
        }
    }

    pub fn provider(self) -> Provider {
        match self {
            ProviderModel::Llama4Scout
            | ProviderModel::Llama33Versatile
            | ProviderModel::Llama31Instant => Provider::Groq,
            ProviderModel::GPT4o | ProviderModel::GPT4oMini => Provider::OpenAI,
        }
    }
}

/// Chat-completions endpoint for a provider, direct or through a gateway
pub fn endpoint_url(provider: Provider, gateway: Option<&str>) -> String {
    match (gateway, provider) {
        (Some(gw), Provider::Groq) => {
            format!("{}/groq/openai/v1/chat/completions", gw.trim_end_matches('/'))
        }
        (Some(gw), Provider::OpenAI) => {
            format!("{}/openai/v1/chat/completions", gw.trim_end_matches('/'))
        }
        (None, Provider::Groq) => "https://api.groq.com/openai/v1/chat/completions".to_string(),
        (None, Provider::OpenAI) => "https://api.openai.com/v1/chat/completions".to_string(),
    }
}

/// OpenAI-compatible service implementation
pub struct OpenAiCompatService {
    client: Client,
    api_key: String,
    model: ProviderModel,
    base_url: String,
}

impl OpenAiCompatService {
    pub fn new(
        api_key: String,
        model: ProviderModel,
        gateway: Option<&str>,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: endpoint_url(model.provider(), gateway),
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = request.system.as_deref().filter(|s| !s.is_empty()) {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(system.to_string()),
            });
        }

        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: m.role.as_str().to_string(),
            content: Some(m.text.clone()),
        }));

        ChatRequest {
            model: self.model.api_name().to_string(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        }
    }

    fn normalize_response(resp: ChatResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::unknown("Empty completion"));
        }

        let usage = resp.usage.unwrap_or_default();
        Ok(LlmResponse {
            text,
            end_turn: choice.finish_reason.as_deref() == Some("stop"),
            usage: Usage {
                input_tokens: u64::from(usage.prompt_tokens),
                output_tokens: u64::from(usage.completion_tokens),
            },
        })
    }
}

#[async_trait]
impl LlmService for OpenAiCompatService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let chat_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            return Err(LlmError::from_status(status.as_u16(), &message));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(chat_response)
    }

    fn model_id(&self) -> &str {
        self.model.model_id()
    }
}

// Chat completions wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
