//! OpenAI provider: chat completions with true server-sent-event streaming for answers.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};

use crate::llm_client::parsing::{parse_analysis, parse_evaluation, parse_questions};
use crate::llm_client::prompts::{
    analyze_prompt, answer_prompt, brief_answer_prompt, evaluate_prompt, json_system,
    questions_prompt, ANALYZE_SYSTEM, ANSWER_SYSTEM, BRIEF_ANSWER_SYSTEM, EVALUATE_SYSTEM,
    QUESTIONS_SYSTEM,
};
use crate::llm_client::{AnswerStream, ChatClient, LlmError, LlmProvider};
use crate::models::analysis::JdAnalysis;
use crate::models::evaluation::EvaluationResult;
use crate::models::question::QuestionDraft;

pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// OpenAI-backed provider. One temperature (from config) is used for every call.
#[derive(Clone)]
pub struct OpenAiProvider {
    chat: ChatClient,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, temperature: f32) -> Result<Self, LlmError> {
        let chat = ChatClient::new(OPENAI_API_BASE, api_key, model)?;
        info!(
            "OpenAI provider initialized (model: {}, temperature: {})",
            chat.model(),
            temperature
        );
        Ok(Self { chat, temperature })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn analyze_job_description(&self, jd_text: &str) -> Result<JdAnalysis, LlmError> {
        let content = self
            .chat
            .complete(
                &json_system(ANALYZE_SYSTEM),
                &analyze_prompt(jd_text),
                self.temperature,
            )
            .await?;
        Ok(parse_analysis(&content))
    }

    async fn generate_questions(
        &self,
        jd_text: &str,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, LlmError> {
        let content = self
            .chat
            .complete(
                &json_system(QUESTIONS_SYSTEM),
                &questions_prompt(jd_text, count),
                self.temperature,
            )
            .await?;
        Ok(parse_questions(&content))
    }

    async fn evaluate_answer(
        &self,
        question_text: &str,
        user_answer: &str,
        reference_answer: &str,
    ) -> Result<EvaluationResult, LlmError> {
        let content = self
            .chat
            .complete(
                &json_system(EVALUATE_SYSTEM),
                &evaluate_prompt(question_text, user_answer, reference_answer),
                self.temperature,
            )
            .await?;
        Ok(parse_evaluation(&content))
    }

    async fn generate_answer(&self, question_text: &str) -> Result<String, LlmError> {
        let content = self
            .chat
            .complete(ANSWER_SYSTEM, &answer_prompt(question_text), self.temperature)
            .await?;
        Ok(content.trim().to_string())
    }

    async fn generate_brief_answer(&self, question_text: &str) -> Result<String, LlmError> {
        let content = self
            .chat
            .complete(
                BRIEF_ANSWER_SYSTEM,
                &brief_answer_prompt(question_text),
                self.temperature,
            )
            .await?;
        Ok(content.trim().to_string())
    }

    fn generate_answer_stream(&self, question_text: &str) -> AnswerStream {
        let chat = self.chat.clone();
        let temperature = self.temperature;
        let prompt = answer_prompt(question_text);

        stream::once(async move { chat.open_stream(ANSWER_SYSTEM, &prompt, temperature).await })
            .map(|opened| match opened {
                Ok(response) => sse_deltas(response.bytes_stream().boxed()),
                Err(e) => stream::once(async move { Err(e) }).boxed(),
            })
            .flatten()
            .boxed()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Server-sent events
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Delta(String),
    Done,
    Ignored,
}

/// Interprets one SSE line of a chat-completions stream.
fn parse_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return SseEvent::Ignored;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|text| !text.is_empty())
            .map(SseEvent::Delta)
            .unwrap_or(SseEvent::Ignored),
        Err(e) => {
            debug!("Skipping undecodable stream event: {e}");
            SseEvent::Ignored
        }
    }
}

struct SseState {
    body: BoxStream<'static, Result<Bytes, reqwest::Error>>,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    done: bool,
}

impl SseState {
    /// Moves every complete line in the buffer into `pending`.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            match parse_sse_line(&String::from_utf8_lossy(&line)) {
                SseEvent::Delta(text) => self.pending.push_back(text),
                SseEvent::Done => {
                    self.done = true;
                    self.buffer.clear();
                    return;
                }
                SseEvent::Ignored => {}
            }
        }
    }
}

/// Turns a raw SSE byte stream into content deltas. Lines are split on bytes so
/// multi-byte characters straddling network chunks are decoded intact.
fn sse_deltas(body: BoxStream<'static, Result<Bytes, reqwest::Error>>) -> AnswerStream {
    let state = SseState {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(delta) = state.pending.pop_front() {
                return Some((Ok(delta), state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.extend_from_slice(&bytes);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(LlmError::Http(e)), state));
                }
                None => {
                    state.done = true;
                    state.buffer.push(b'\n');
                    state.drain_lines();
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: Vec<&'static [u8]>) -> BoxStream<'static, Result<Bytes, reqwest::Error>> {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p)))).boxed()
    }

    #[test]
    fn test_parse_sse_line_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(parse_sse_line(line), SseEvent::Delta("Hello".to_string()));
    }

    #[test]
    fn test_parse_sse_line_done() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseEvent::Done);
    }

    #[test]
    fn test_parse_sse_line_role_only_delta_is_ignored() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_sse_line(line), SseEvent::Ignored);
    }

    #[test]
    fn test_parse_sse_line_comment_is_ignored() {
        assert_eq!(parse_sse_line(": keep-alive"), SseEvent::Ignored);
    }

    #[tokio::test]
    async fn test_sse_deltas_reassembles_split_lines() {
        let deltas: Vec<String> = sse_deltas(body(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choi",
            b"ces\":[{\"delta\":{\"content\":\"lo \"}}]}\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"world\"}}]}\n\ndata: [DONE]\n\n",
        ]))
        .map(|d| d.unwrap())
        .collect()
        .await;

        assert_eq!(deltas, vec!["Hel", "lo ", "world"]);
    }

    #[tokio::test]
    async fn test_sse_deltas_handles_multibyte_split() {
        let full = "data: {\"choices\":[{\"delta\":{\"content\":\"caf\u{e9}\"}}]}\n";
        let bytes = full.as_bytes();
        // split inside the two-byte 'é'
        let cut = full.find('\u{e9}').unwrap() + 1;
        let (head, tail) = bytes.split_at(cut);
        let head: &'static [u8] = Box::leak(head.to_vec().into_boxed_slice());
        let tail: &'static [u8] = Box::leak(tail.to_vec().into_boxed_slice());

        let deltas: Vec<String> = sse_deltas(body(vec![head, tail]))
            .map(|d| d.unwrap())
            .collect()
            .await;

        assert_eq!(deltas, vec!["caf\u{e9}"]);
    }

    #[tokio::test]
    async fn test_sse_deltas_flushes_unterminated_last_line() {
        let deltas: Vec<String> = sse_deltas(body(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}",
        ]))
        .map(|d| d.unwrap())
        .collect()
        .await;

        assert_eq!(deltas, vec!["tail"]);
    }

    #[test]
    fn test_provider_name() {
        let provider =
            OpenAiProvider::new("sk-test".to_string(), "gpt-4o".to_string(), 0.7).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
