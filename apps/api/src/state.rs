use std::sync::Arc;

use crate::activity::ActivityLog;
use crate::config::Config;
use crate::interview::analysis::JdAnalysisService;
use crate::interview::answers::AnswerService;
use crate::interview::evaluation::AnswerEvaluationService;
use crate::interview::pipeline::QuestionPipeline;
use crate::interview::store::QuestionStore;
use crate::llm_client::LlmProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Questions issued by the pipeline, looked up again at evaluation time.
    pub store: QuestionStore,
    pub questions: QuestionPipeline,
    pub evaluator: AnswerEvaluationService,
    pub analyzer: JdAnalysisService,
    pub answers: AnswerService,
    pub activity: ActivityLog,
}

impl AppState {
    /// Wires every service to the same provider and question store.
    pub fn new(config: Config, llm: Arc<dyn LlmProvider>, activity: ActivityLog) -> Self {
        let store = QuestionStore::new();
        Self {
            config,
            questions: QuestionPipeline::new(llm.clone(), store.clone()),
            evaluator: AnswerEvaluationService::new(llm.clone(), store.clone()),
            analyzer: JdAnalysisService::new(llm.clone()),
            answers: AnswerService::new(llm),
            store,
            activity,
        }
    }
}
