use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A question/reference-answer pair that has not been given an identity yet.
/// Produced by an LLM provider or by the template generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub reference_answer: String,
}

impl QuestionDraft {
    pub fn new(text: impl Into<String>, reference_answer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference_answer: reference_answer.into(),
        }
    }
}

/// A question accepted by the pipeline. `id` is an opaque capability token
/// handed back to clients; it is only ever minted by the question store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub reference_answer: String,
}
