use std::str::FromStr;

use anyhow::{Context, Result};

/// Which hosted LLM backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    OpenAi,
    #[default]
    DeepSeek,
}

impl FromStr for ProviderKind {
    type Err = std::convert::Infallible;

    /// Anything other than `openai` selects DeepSeek.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Self::OpenAi,
            _ => Self::DeepSeek,
        })
    }
}

/// Application configuration loaded from environment variables.
/// Every variable is optional; missing API keys select the offline mock provider.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub use_mock_responses: bool,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub deepseek_api_key: Option<String>,
    pub deepseek_model: String,
    /// Basic-auth credentials for the log endpoint. Unset means the endpoint always refuses.
    pub log_user: Option<String>,
    pub log_password: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::DeepSeek,
            use_mock_responses: false,
            openai_api_key: None,
            openai_model: "gpt-4o".to_string(),
            openai_temperature: 0.7,
            deepseek_api_key: None,
            deepseek_model: "deepseek-chat".to_string(),
            log_user: None,
            log_password: None,
            port: 8000,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Config {
            provider: get("LLM_PROVIDER")
                .map(|v| v.parse().unwrap_or_default())
                .unwrap_or(defaults.provider),
            use_mock_responses: get("USE_MOCK_RESPONSES")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_temperature: match get("OPENAI_TEMPERATURE") {
                Some(v) => v
                    .trim()
                    .parse::<f32>()
                    .context("OPENAI_TEMPERATURE must be a number")?,
                None => defaults.openai_temperature,
            },
            deepseek_api_key: get("DEEPSEEK_API_KEY"),
            deepseek_model: get("DEEPSEEK_MODEL").unwrap_or(defaults.deepseek_model),
            log_user: get("USER_NAME"),
            log_password: get("USER_PASSWORD"),
            port: match get("PORT") {
                Some(v) => v
                    .trim()
                    .parse::<u16>()
                    .context("PORT must be a valid port number")?,
                None => defaults.port,
            },
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}
