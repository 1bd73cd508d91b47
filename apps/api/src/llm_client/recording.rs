use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::StreamExt;
use serde_json::json;

use crate::activity::{ActivityLog, LogChannel, LogLevel};
use crate::llm_client::{AnswerStream, LlmError, LlmProvider};
use crate::models::analysis::JdAnalysis;
use crate::models::evaluation::EvaluationResult;
use crate::models::question::QuestionDraft;

/// Wraps a provider and records every call on the `llm` activity channel.
pub struct RecordingProvider {
    inner: Arc<dyn LlmProvider>,
    log: ActivityLog,
}

impl RecordingProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, log: ActivityLog) -> Self {
        Self { inner, log }
    }

    fn record<T>(&self, operation: &str, started: Instant, result: &Result<T, LlmError>) {
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(_) => {
                self.log.record(
                    LogChannel::Llm,
                    LogLevel::Info,
                    format!("{} {operation}", self.inner.name()),
                    json!({
                        "provider": self.inner.name(),
                        "operation": operation,
                        "duration_ms": duration_ms,
                    }),
                );
            }
            Err(e) => {
                self.log.record(
                    LogChannel::Llm,
                    LogLevel::Error,
                    format!("{} {operation} failed", self.inner.name()),
                    json!({
                        "provider": self.inner.name(),
                        "operation": operation,
                        "duration_ms": duration_ms,
                        "error": e.to_string(),
                    }),
                );
            }
        }
    }
}

#[async_trait]
impl LlmProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn analyze_job_description(&self, jd_text: &str) -> Result<JdAnalysis, LlmError> {
        let started = Instant::now();
        let result = self.inner.analyze_job_description(jd_text).await;
        self.record("analyze_jd", started, &result);
        result
    }

    async fn generate_questions(
        &self,
        jd_text: &str,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, LlmError> {
        let started = Instant::now();
        let result = self.inner.generate_questions(jd_text, count).await;
        self.record("generate_questions", started, &result);
        result
    }

    async fn evaluate_answer(
        &self,
        question_text: &str,
        user_answer: &str,
        reference_answer: &str,
    ) -> Result<EvaluationResult, LlmError> {
        let started = Instant::now();
        let result = self
            .inner
            .evaluate_answer(question_text, user_answer, reference_answer)
            .await;
        self.record("evaluate_answer", started, &result);
        result
    }

    async fn generate_answer(&self, question_text: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let result = self.inner.generate_answer(question_text).await;
        self.record("generate_answer", started, &result);
        result
    }

    async fn generate_brief_answer(&self, question_text: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let result = self.inner.generate_brief_answer(question_text).await;
        self.record("generate_brief_answer", started, &result);
        result
    }

    /// Only stream failures are recorded; a successful stream has no single end point
    /// worth timing.
    fn generate_answer_stream(&self, question_text: &str) -> AnswerStream {
        let log = self.log.clone();
        let provider = self.inner.name();
        self.inner
            .generate_answer_stream(question_text)
            .inspect(move |item| {
                if let Err(e) = item {
                    log.record(
                        LogChannel::Llm,
                        LogLevel::Error,
                        format!("{provider} generate_answer_stream failed"),
                        json!({
                            "provider": provider,
                            "operation": "generate_answer_stream",
                            "error": e.to_string(),
                        }),
                    );
                }
            })
            .boxed()
    }
}
