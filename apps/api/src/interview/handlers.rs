use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::activity::LogChannel;
use crate::errors::{AppError, AppJson};
use crate::interview::analysis::JdAnalysisReport;
use crate::interview::answers::{truncate_words, DEFAULT_WORD_LIMIT};
use crate::interview::store::StoredQuestion;
use crate::models::evaluation::EvaluationResult;
use crate::models::question::Question;
use crate::state::AppState;

/// Job descriptions shorter than this are rejected at the API boundary.
pub const MIN_JD_LENGTH: usize = 200;
pub const MIN_QUESTION_COUNT: usize = 5;
pub const MAX_QUESTION_COUNT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AnalyzeJdRequest {
    pub jd_text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    pub jd_text: String,
    pub question_count: usize,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateAnswerRequest {
    pub question_id: String,
    pub user_answer: String,
    /// Ignored when the question is known; the stored reference answer is used.
    #[serde(default)]
    pub reference_answer: String,
    /// Accepted for compatibility; questions are never re-registered from it.
    #[serde(default)]
    pub question_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateAnswerRequest {
    pub question_text: String,
    pub word_limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GenerateAnswerResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct DebugQuestionResponse {
    pub question_found: bool,
    pub question_data: Option<StoredQuestion>,
    pub total_questions: usize,
}

fn require_jd_length(jd_text: &str) -> Result<(), AppError> {
    if jd_text.chars().count() < MIN_JD_LENGTH {
        return Err(AppError::Validation(format!(
            "Job description must be at least {MIN_JD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// POST /api/analyze-jd
pub async fn handle_analyze_jd(
    State(state): State<AppState>,
    AppJson(req): AppJson<AnalyzeJdRequest>,
) -> Result<Json<JdAnalysisReport>, AppError> {
    require_jd_length(&req.jd_text)?;

    let report = state.analyzer.analyze(&req.jd_text).await;
    state.activity.info(
        LogChannel::App,
        "JD analyzed",
        json!({
            "jd_length": req.jd_text.chars().count(),
            "is_valid_jd": report.is_valid_jd,
            "confidence": report.confidence,
            "error": report.error,
        }),
    );
    Ok(Json(report))
}

/// POST /api/generate-questions
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    AppJson(req): AppJson<GenerateQuestionsRequest>,
) -> Result<Json<GenerateQuestionsResponse>, AppError> {
    require_jd_length(&req.jd_text)?;
    if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&req.question_count) {
        return Err(AppError::Validation(format!(
            "question_count must be between {MIN_QUESTION_COUNT} and {MAX_QUESTION_COUNT}"
        )));
    }

    let questions = state
        .questions
        .generate_questions(&req.jd_text, req.question_count)
        .await;
    state.activity.info(
        LogChannel::App,
        "Questions generated",
        json!({
            "jd_length": req.jd_text.chars().count(),
            "requested": req.question_count,
            "returned": questions.len(),
        }),
    );
    Ok(Json(GenerateQuestionsResponse { questions }))
}

/// POST /api/evaluate-answer
pub async fn handle_evaluate_answer(
    State(state): State<AppState>,
    AppJson(req): AppJson<EvaluateAnswerRequest>,
) -> Result<Json<EvaluationResult>, AppError> {
    if req.user_answer.trim().is_empty() {
        return Err(AppError::Validation("User answer cannot be empty".to_string()));
    }

    let result = state
        .evaluator
        .evaluate(&req.question_id, &req.user_answer, &req.reference_answer)
        .await;
    state.activity.info(
        LogChannel::App,
        "Answer evaluated",
        json!({
            "question_id": req.question_id,
            "answer_length": req.user_answer.chars().count(),
            "question_text_supplied": req.question_text.is_some(),
            "score": result.score,
        }),
    );
    Ok(Json(result))
}

/// POST /api/generate-answer
pub async fn handle_generate_answer(
    State(state): State<AppState>,
    AppJson(req): AppJson<GenerateAnswerRequest>,
) -> Json<GenerateAnswerResponse> {
    let limit = req.word_limit.unwrap_or(DEFAULT_WORD_LIMIT);
    let answer = state.answers.generate(&req.question_text).await;
    Json(GenerateAnswerResponse {
        answer: truncate_words(&answer, limit),
    })
}

/// POST /api/generate-answer-stream
///
/// Plain-text chunked body, capped at `word_limit` words (default 100). A client
/// disconnect drops the stream, which stops generation at the next chunk boundary.
pub async fn handle_generate_answer_stream(
    State(state): State<AppState>,
    AppJson(req): AppJson<GenerateAnswerRequest>,
) -> Response {
    let limit = req.word_limit.unwrap_or(DEFAULT_WORD_LIMIT);
    let chunks = state
        .answers
        .stream(&req.question_text, limit)
        .map(Ok::<_, Infallible>);

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(chunks),
    )
        .into_response()
}

/// GET /api/debug-question/:id
pub async fn handle_debug_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<DebugQuestionResponse> {
    if state.store.is_empty() {
        debug!("Debug lookup for {id} before any questions were generated");
    }
    let question = state.store.get(&id);
    Json(DebugQuestionResponse {
        question_found: question.is_some(),
        question_data: question,
        total_questions: state.store.len(),
    })
}
