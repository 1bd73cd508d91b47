use async_trait::async_trait;
use futures::stream::{self, StreamExt};
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
use crate::streaming::{paced, sentence_chunks, SENTENCE_DELAY};

pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";

const ANALYSIS_TEMPERATURE: f32 = 0.3;
const QUESTIONS_TEMPERATURE: f32 = 0.5;
const EVALUATION_TEMPERATURE: f32 = 0.3;
const ANSWER_TEMPERATURE: f32 = 0.7;

/// Answers shorter than this are treated as a failed stream.
const MIN_STREAMED_ANSWER_CHARS: usize = 20;

/// DeepSeek-backed provider. Streaming is simulated: the full answer is fetched,
/// then replayed sentence by sentence.
#[derive(Clone)]
pub struct DeepSeekProvider {
    chat: ChatClient,
}

impl DeepSeekProvider {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        let chat = ChatClient::new(DEEPSEEK_API_BASE, api_key, model)?;
        info!("DeepSeek provider initialized (model: {})", chat.model());
        Ok(Self { chat })
    }
}

/// Drops a leading `Answer:` label (any case) the model sometimes echoes back.
fn strip_answer_prefix(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.get(..7) {
        Some(head) if head.eq_ignore_ascii_case("answer:") => trimmed[7..].trim_start(),
        _ => trimmed,
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    async fn analyze_job_description(&self, jd_text: &str) -> Result<JdAnalysis, LlmError> {
        let content = self
            .chat
            .complete(
                &json_system(ANALYZE_SYSTEM),
                &analyze_prompt(jd_text),
                ANALYSIS_TEMPERATURE,
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
                QUESTIONS_TEMPERATURE,
            )
            .await?;
        let questions = parse_questions(&content);
        debug!(
            "Parsed {} questions from DeepSeek response (requested {})",
            questions.len(),
            count
        );
        Ok(questions)
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
                EVALUATION_TEMPERATURE,
            )
            .await?;
        Ok(parse_evaluation(&content))
    }

    async fn generate_answer(&self, question_text: &str) -> Result<String, LlmError> {
        let content = self
            .chat
            .complete(ANSWER_SYSTEM, &answer_prompt(question_text), ANSWER_TEMPERATURE)
            .await?;
        Ok(strip_answer_prefix(&content).to_string())
    }

    async fn generate_brief_answer(&self, question_text: &str) -> Result<String, LlmError> {
        let content = self
            .chat
            .complete(
                BRIEF_ANSWER_SYSTEM,
                &brief_answer_prompt(question_text),
                ANSWER_TEMPERATURE,
            )
            .await?;
        Ok(strip_answer_prefix(&content).to_string())
    }

    fn generate_answer_stream(&self, question_text: &str) -> AnswerStream {
        let provider = self.clone();
        let question = question_text.to_string();

        stream::once(async move { provider.generate_answer(&question).await })
            .map(|answer| match answer {
                Ok(text) if text.chars().count() >= MIN_STREAMED_ANSWER_CHARS => {
                    paced(sentence_chunks(&text), SENTENCE_DELAY)
                        .map(Ok)
                        .boxed()
                }
                Ok(_) => stream::once(async { Err(LlmError::EmptyContent) }).boxed(),
                Err(e) => stream::once(async move { Err(e) }).boxed(),
            })
            .flatten()
            .boxed()
    }
}
