use std::sync::Arc;

use tracing::{debug, warn};

use crate::interview::store::QuestionStore;
use crate::llm_client::LlmProvider;
use crate::models::evaluation::EvaluationResult;

/// Answers shorter than this (after trimming) are scored without asking the LLM.
pub const MIN_ANSWER_CHARS: usize = 20;

pub const UNKNOWN_QUESTION_SCORE: f64 = 65.0;
pub const TOO_BRIEF_SCORE: f64 = 30.0;
pub const LLM_FAILURE_SCORE: f64 = 60.0;

/// Scores candidate answers against the reference answer stored with the question.
#[derive(Clone)]
pub struct AnswerEvaluationService {
    llm: Arc<dyn LlmProvider>,
    store: QuestionStore,
}

impl AnswerEvaluationService {
    pub fn new(llm: Arc<dyn LlmProvider>, store: QuestionStore) -> Self {
        Self { llm, store }
    }

    /// Never fails. `_supplied_reference` is accepted from older clients but the stored
    /// reference answer is always the one used.
    pub async fn evaluate(
        &self,
        question_id: &str,
        user_answer: &str,
        _supplied_reference: &str,
    ) -> EvaluationResult {
        let Some(question) = self.store.get(question_id) else {
            debug!("Question {question_id} not found; returning context-free evaluation");
            return EvaluationResult::new(
                UNKNOWN_QUESTION_SCORE,
                "Your answer was evaluated without the original question context.",
                "Try to be more specific and provide concrete examples.",
            );
        };

        if user_answer.trim().chars().count() < MIN_ANSWER_CHARS {
            return EvaluationResult::new(
                TOO_BRIEF_SCORE,
                "Your answer is too brief to properly address the question.",
                "Please provide a more detailed response with specific examples from your experience.",
            );
        }

        match self
            .llm
            .evaluate_answer(&question.text, user_answer, &question.reference_answer)
            .await
        {
            Ok(result) => EvaluationResult::new(
                result.score,
                result.feedback,
                result.improvement_suggestions,
            ),
            Err(e) => {
                warn!("Answer evaluation failed for question {question_id}: {e}");
                EvaluationResult::new(
                    LLM_FAILURE_SCORE,
                    "We encountered an issue while evaluating your answer with our AI system.",
                    "While we couldn't provide specific feedback, generally strong answers include \
                     concrete examples from your experience and address all parts of the question.",
                )
            }
        }
    }
}
