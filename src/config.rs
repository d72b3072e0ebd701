//! Application configuration from environment variables

use crate::llm::{LlmConfig, ModelRegistry};
use crate::state_machine::TerminationKeywords;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HISTORY_WINDOW: usize = 10;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No language model is configured. Set GROQ_API_KEY (or OPENAI_API_KEY), \
         or point LLM_GATEWAY at a gateway, then restart."
    )]
    NoModels,
    #[error("DEFAULT_MODEL={model} is not available. Available models: {available}")]
    UnknownDefaultModel { model: String, available: String },
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Where finished interviews are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// One pretty-printed JSON file per interview
    #[default]
    File,
    /// Rows in a SQLite database
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub db_path: PathBuf,
    pub keywords: TerminationKeywords,
    /// Number of transcript entries sent to the model as context
    pub history_window: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(get("TALENTSCOUT_DATA_DIR").unwrap_or_else(|| "data".into()));
        let db_path = get("TALENTSCOUT_DB_PATH")
            .map_or_else(|| data_dir.join("talent_scout.db"), PathBuf::from);

        let store = match get("TALENTSCOUT_STORE").as_deref() {
            None | Some("file") => StoreKind::File,
            Some("sqlite") => StoreKind::Sqlite,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "TALENTSCOUT_STORE",
                    value: other.to_string(),
                })
            }
        };

        let keywords = get("TALENTSCOUT_END_KEYWORDS")
            .map(|list| TerminationKeywords::parse(&list))
            .unwrap_or_default();
        if keywords.words().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "TALENTSCOUT_END_KEYWORDS",
                value: get("TALENTSCOUT_END_KEYWORDS").unwrap_or_default(),
            });
        }

        Ok(Self {
            port: parse_var(&get, "TALENTSCOUT_PORT", DEFAULT_PORT)?,
            data_dir,
            store,
            db_path,
            keywords,
            history_window: parse_var(&get, "TALENTSCOUT_HISTORY_WINDOW", DEFAULT_HISTORY_WINDOW)?,
            temperature: parse_var(&get, "TALENTSCOUT_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_tokens: parse_var(&get, "TALENTSCOUT_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            llm: LlmConfig {
                groq_api_key: get("GROQ_API_KEY"),
                openai_api_key: get("OPENAI_API_KEY"),
                gateway: get("LLM_GATEWAY"),
                default_model: get("DEFAULT_MODEL"),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}

/// Startup check: the interview cannot run without a usable default model
pub fn ensure_models(registry: &ModelRegistry) -> Result<(), ConfigError> {
    if !registry.has_models() {
        return Err(ConfigError::NoModels);
    }
    if registry.default().is_none() {
        return Err(ConfigError::UnknownDefaultModel {
            model: registry.default_model_id().to_string(),
            available: registry.available_models().join(", "),
        });
    }
    Ok(())
}
