//! Decoding of provider output into typed values.
//!
//! Models do not always honour the JSON-only instruction, so every decoder first tries
//! strict JSON and then recovers what it can with patterns. Decoding never fails outright;
//! the worst case is an empty question list or an all-defaults analysis/evaluation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::models::analysis::JdAnalysis;
use crate::models::evaluation::EvaluationResult;
use crate::models::question::QuestionDraft;

const DEFAULT_SCORE: f64 = 50.0;
const DEFAULT_FEEDBACK: &str = "Feedback could not be extracted.";
const DEFAULT_SUGGESTIONS: &str = "Try to be more specific and provide examples.";
const MISSING_REFERENCE_ANSWER: &str = "No reference answer provided.";

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static pattern is valid")
}

static VALID_FLAG: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)"?is_valid_jd"?\s*:\s*(true|false)"#));
static CONFIDENCE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)"?confidence"?\s*:\s*"?(\d+(?:\.\d+)?)"#));
static OVERVIEW: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)"?overview"?\s*:\s*"([^"]*)""#));
static QA_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#""text"\s*:\s*"([^"]*)"\s*,\s*"reference_answer"\s*:\s*"([^"]*)""#)
});
static NUMBERED_QUESTION: LazyLock<Regex> = LazyLock::new(|| pattern(r"\d+\.\s*[^?]+\?"));
static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?:Reference Answer|Answer):\s*([^\n]+)"));
static SCORE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)"?score"?\s*:?\s*"?(\d+(?:\.\d+)?)"#));
static FEEDBACK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)"?feedback"?\s*:?\s*"([^"]+)""#));
static SUGGESTIONS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)"?improvement_suggestions"?\s*:?\s*"([^"]+)""#));

// ────────────────────────────────────────────────────────────────────────────
// JSON framing
// ────────────────────────────────────────────────────────────────────────────

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Narrows output to its outermost `{ ... }` span, dropping chatter around it.
pub fn extract_json_object(text: &str) -> &str {
    let text = strip_json_fences(text);
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// JD analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    is_valid_jd: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    overview: String,
}

pub fn parse_analysis(content: &str) -> JdAnalysis {
    let (is_valid_jd, confidence, overview) =
        match serde_json::from_str::<RawAnalysis>(extract_json_object(content)) {
            Ok(raw) => (raw.is_valid_jd, raw.confidence, raw.overview),
            Err(e) => {
                debug!("Analysis output was not valid JSON ({e}); extracting by pattern");
                let lower = content.to_lowercase();
                let is_valid = match VALID_FLAG.captures(content) {
                    Some(caps) => caps[1].eq_ignore_ascii_case("true"),
                    None => lower.contains("true") && !lower.contains("false"),
                };
                let confidence = CONFIDENCE
                    .captures(content)
                    .and_then(|caps| caps[1].parse::<f64>().ok())
                    .unwrap_or(0.0);
                let overview = OVERVIEW
                    .captures(content)
                    .map(|caps| caps[1].to_string())
                    .unwrap_or_default();
                (is_valid, confidence, overview)
            }
        };

    JdAnalysis {
        is_valid_jd,
        confidence: confidence.clamp(0.0, 100.0),
        overview: if is_valid_jd { overview } else { String::new() },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Questions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QuestionsEnvelope {
    questions: Vec<QuestionDraft>,
}

pub fn parse_questions(content: &str) -> Vec<QuestionDraft> {
    if let Ok(envelope) = serde_json::from_str::<QuestionsEnvelope>(extract_json_object(content)) {
        return envelope.questions;
    }
    if let Ok(list) = serde_json::from_str::<Vec<QuestionDraft>>(strip_json_fences(content)) {
        return list;
    }

    debug!("Question output was not valid JSON; extracting by pattern");
    let questions = extract_questions_by_pattern(content);
    debug!("Extracted {} questions by pattern", questions.len());
    questions
}

fn extract_questions_by_pattern(content: &str) -> Vec<QuestionDraft> {
    let pairs: Vec<QuestionDraft> = QA_PAIR
        .captures_iter(content)
        .map(|caps| QuestionDraft::new(&caps[1], &caps[2]))
        .collect();
    if !pairs.is_empty() {
        return pairs;
    }

    let answers: Vec<&str> = ANSWER_LINE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
        .collect();

    NUMBERED_QUESTION
        .find_iter(content)
        .enumerate()
        .map(|(i, question)| {
            QuestionDraft::new(
                question.as_str().trim(),
                answers.get(i).copied().unwrap_or(MISSING_REFERENCE_ANSWER),
            )
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    score: Option<f64>,
    feedback: Option<String>,
    improvement_suggestions: Option<String>,
}

pub fn parse_evaluation(content: &str) -> EvaluationResult {
    let raw = serde_json::from_str::<RawEvaluation>(extract_json_object(content))
        .unwrap_or_else(|e| {
            debug!("Evaluation output was not valid JSON ({e}); extracting by pattern");
            RawEvaluation {
                score: SCORE
                    .captures(content)
                    .and_then(|caps| caps[1].parse::<f64>().ok()),
                feedback: FEEDBACK.captures(content).map(|caps| caps[1].to_string()),
                improvement_suggestions: SUGGESTIONS
                    .captures(content)
                    .map(|caps| caps[1].to_string()),
            }
        });

    EvaluationResult::new(
        raw.score.unwrap_or(DEFAULT_SCORE),
        raw.feedback.unwrap_or_else(|| DEFAULT_FEEDBACK.to_string()),
        raw.improvement_suggestions
            .unwrap_or_else(|| DEFAULT_SUGGESTIONS.to_string()),
    )
}
