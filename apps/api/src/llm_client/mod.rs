/// LLM Client: the capability interface every provider implements, and the shared
/// chat-completions transport used by the hosted providers.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// All LLM interactions go through `LlmProvider`.
///
/// Provider is chosen once at startup from configuration (`provider_from_config`).
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ProviderKind};
use crate::models::analysis::JdAnalysis;
use crate::models::evaluation::EvaluationResult;
use crate::models::question::QuestionDraft;

pub mod deepseek;
pub mod mock;
pub mod openai;
pub mod parsing;
pub mod prompts;
pub mod recording;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Incremental answer text. Finite, not restartable; dropping it cancels generation.
pub type AnswerStream = BoxStream<'static, Result<String, LlmError>>;

/// Everything the interview core needs from a language model.
///
/// Carried as `Arc<dyn LlmProvider>`; implementations are swapped at startup
/// without touching callers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider label, used in logs.
    fn name(&self) -> &'static str;

    async fn analyze_job_description(&self, jd_text: &str) -> Result<JdAnalysis, LlmError>;

    /// May return fewer (or zero) questions than requested.
    async fn generate_questions(
        &self,
        jd_text: &str,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, LlmError>;

    async fn evaluate_answer(
        &self,
        question_text: &str,
        user_answer: &str,
        reference_answer: &str,
    ) -> Result<EvaluationResult, LlmError>;

    async fn generate_answer(&self, question_text: &str) -> Result<String, LlmError>;

    /// Second attempt with a shorter, simpler prompt after an unusable full answer.
    async fn generate_brief_answer(&self, question_text: &str) -> Result<String, LlmError> {
        self.generate_answer(question_text).await
    }

    fn generate_answer_stream(&self, question_text: &str) -> AnswerStream;
}

/// Builds the provider selected by configuration. Falls back to the offline mock
/// provider when mocking is forced or the selected provider has no API key.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn LlmProvider>, LlmError> {
    if config.use_mock_responses {
        info!("USE_MOCK_RESPONSES is set; using mock LLM provider");
        return Ok(Arc::new(mock::MockProvider));
    }

    match config.provider {
        ProviderKind::OpenAi => match &config.openai_api_key {
            Some(key) => Ok(Arc::new(openai::OpenAiProvider::new(
                key.clone(),
                config.openai_model.clone(),
                config.openai_temperature,
            )?)),
            None => {
                warn!("LLM_PROVIDER=openai but OPENAI_API_KEY is not set; using mock provider");
                Ok(Arc::new(mock::MockProvider))
            }
        },
        ProviderKind::DeepSeek => match &config.deepseek_api_key {
            Some(key) => Ok(Arc::new(deepseek::DeepSeekProvider::new(
                key.clone(),
                config.deepseek_model.clone(),
            )?)),
            None => {
                warn!("LLM_PROVIDER=deepseek but DEEPSEEK_API_KEY is not set; using mock provider");
                Ok(Arc::new(mock::MockProvider))
            }
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chat-completions transport (OpenAI-compatible wire format)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for a `/v1/chat/completions` endpoint, with retry on 429 and 5xx.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(base_url: &str, api_key: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a system + user message pair and returns the assistant's text.
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let response = self.send(system, prompt, temperature, false).await?;
        let body: ChatResponse = response.json().await?;

        if let Some(usage) = &body.usage {
            debug!(
                "Chat completion succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                self.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    /// Opens a server-sent-events completion. The caller consumes the body.
    pub async fn open_stream(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<Response, LlmError> {
        self.send(system, prompt, temperature, true).await
    }

    async fn send(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
        stream: bool,
    ) -> Result<Response, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
            stream,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted provider for tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::stream::{self, StreamExt};

    use super::*;

    /// A provider whose every answer is fixed up front. `None` means the call fails.
    #[derive(Default)]
    pub struct ScriptedProvider {
        pub analysis: Option<JdAnalysis>,
        pub questions: Option<Vec<QuestionDraft>>,
        pub evaluation: Option<EvaluationResult>,
        pub answer: Option<String>,
        pub brief_answer: Option<String>,
        /// `Err(msg)` items become `LlmError::Stream(msg)`.
        pub stream: Vec<Result<String, String>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedProvider {
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record_call(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scripted_failure() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "scripted failure".to_string(),
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn analyze_job_description(&self, _jd_text: &str) -> Result<JdAnalysis, LlmError> {
            self.record_call();
            self.analysis.clone().ok_or_else(scripted_failure)
        }

        async fn generate_questions(
            &self,
            _jd_text: &str,
            _count: usize,
        ) -> Result<Vec<QuestionDraft>, LlmError> {
            self.record_call();
            self.questions.clone().ok_or_else(scripted_failure)
        }

        async fn evaluate_answer(
            &self,
            _question_text: &str,
            _user_answer: &str,
            _reference_answer: &str,
        ) -> Result<EvaluationResult, LlmError> {
            self.record_call();
            self.evaluation.clone().ok_or_else(scripted_failure)
        }

        async fn generate_answer(&self, _question_text: &str) -> Result<String, LlmError> {
            self.record_call();
            self.answer.clone().ok_or_else(scripted_failure)
        }

        async fn generate_brief_answer(&self, _question_text: &str) -> Result<String, LlmError> {
            self.record_call();
            self.brief_answer.clone().ok_or_else(scripted_failure)
        }

        fn generate_answer_stream(&self, _question_text: &str) -> AnswerStream {
            self.record_call();
            stream::iter(
                self.stream
                    .clone()
                    .into_iter()
                    .map(|item| item.map_err(LlmError::Stream)),
            )
            .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn test_mock_forced_by_flag() {
        let mut config = config();
        config.use_mock_responses = true;
        config.openai_api_key = Some("sk-test".to_string());
        config.provider = ProviderKind::OpenAi;

        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_missing_key_falls_back_to_mock() {
        let mut config = config();
        config.provider = ProviderKind::DeepSeek;
        config.deepseek_api_key = None;

        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_openai_selected_when_key_present() {
        let mut config = config();
        config.provider = ProviderKind::OpenAi;
        config.openai_api_key = Some("sk-test".to_string());

        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_deepseek_selected_when_key_present() {
        let mut config = config();
        config.provider = ProviderKind::DeepSeek;
        config.deepseek_api_key = Some("ds-test".to_string());

        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "deepseek");
    }

    #[test]
    fn test_chat_request_omits_stream_flag_when_false() {
        let request = ChatRequest {
            model: "deepseek-chat",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.5,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("stream").is_none());
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_chat_client_endpoint_has_no_double_slash() {
        let client =
            ChatClient::new("https://api.example.com/", "k".to_string(), "m".to_string()).unwrap();
        assert_eq!(client.endpoint, "https://api.example.com/v1/chat/completions");
        assert_eq!(client.model(), "m");
    }
}
