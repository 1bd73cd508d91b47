use serde::{Deserialize, Serialize};

/// Outcome of scoring a candidate's answer. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 0.0 – 100.0
    pub score: f64,
    pub feedback: String,
    pub improvement_suggestions: String,
}

impl EvaluationResult {
    pub fn new(score: f64, feedback: impl Into<String>, suggestions: impl Into<String>) -> Self {
        Self {
            score: score.clamp(0.0, 100.0),
            feedback: feedback.into(),
            improvement_suggestions: suggestions.into(),
        }
    }
}
