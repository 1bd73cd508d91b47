use serde::{Deserialize, Serialize};

/// Provider verdict on whether a text is a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JdAnalysis {
    pub is_valid_jd: bool,
    /// 0.0 – 100.0
    pub confidence: f64,
    pub overview: String,
}
