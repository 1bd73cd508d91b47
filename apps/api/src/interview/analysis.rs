use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::llm_client::LlmProvider;

/// Words that mark text as a job posting.
pub const JOB_WORDS: [&str; 10] = [
    "job",
    "position",
    "role",
    "responsibilities",
    "requirements",
    "qualifications",
    "skills",
    "experience",
    "salary",
    "apply",
];

/// Texts shorter than this (after trimming) are rejected without asking the LLM.
pub const MIN_JD_CHARS: usize = 50;
/// Provider confidence below this triggers the keyword heuristic.
const LOW_CONFIDENCE: f64 = 10.0;
const HEURISTIC_MIN_HITS: usize = 3;
const HEURISTIC_MIN_CHARS: usize = 200;
const HEURISTIC_CONFIDENCE: f64 = 60.0;

pub const TOO_SHORT_OVERVIEW: &str = "The provided text is too short to be a valid job description.";
pub const HEURISTIC_OVERVIEW: &str =
    "This appears to be a job description based on keyword analysis.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JdAnalysisReport {
    pub is_valid_jd: bool,
    pub confidence: f64,
    pub overview: String,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct JdAnalysisService {
    llm: Arc<dyn LlmProvider>,
}

impl JdAnalysisService {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Never fails; provider errors are reported in `error`.
    pub async fn analyze(&self, jd_text: &str) -> JdAnalysisReport {
        let trimmed_len = jd_text.trim().chars().count();
        if trimmed_len < MIN_JD_CHARS {
            return JdAnalysisReport {
                is_valid_jd: false,
                confidence: 0.0,
                overview: TOO_SHORT_OVERVIEW.to_string(),
                error: None,
            };
        }

        let mut analysis = match self.llm.analyze_job_description(jd_text).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("JD analysis failed: {e}");
                return JdAnalysisReport {
                    is_valid_jd: false,
                    confidence: 0.0,
                    overview: String::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        if analysis.confidence < LOW_CONFIDENCE {
            let lower = jd_text.to_lowercase();
            let hits = JOB_WORDS.iter().filter(|w| lower.contains(*w)).count();

            if hits >= HEURISTIC_MIN_HITS && trimmed_len > HEURISTIC_MIN_CHARS {
                info!("Low LLM confidence but {hits} job keywords found; treating as a JD");
                analysis.is_valid_jd = true;
                analysis.confidence = analysis.confidence.max(HEURISTIC_CONFIDENCE);
                if analysis.overview.is_empty() {
                    analysis.overview = HEURISTIC_OVERVIEW.to_string();
                }
            }
        }

        JdAnalysisReport {
            is_valid_jd: analysis.is_valid_jd,
            confidence: analysis.confidence,
            overview: analysis.overview,
            error: None,
        }
    }
}
