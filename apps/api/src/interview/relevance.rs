use crate::interview::keywords::KeywordSet;
use crate::models::question::QuestionDraft;

/// Minimum number of distinct keywords a question must mention to be kept.
/// Fixed regardless of how large the keyword set is.
pub const RELEVANCE_THRESHOLD: usize = 2;

/// Number of distinct keywords occurring (as substrings, case-insensitively) in the
/// question text or its reference answer.
pub fn relevance_score(question: &QuestionDraft, keywords: &KeywordSet) -> usize {
    let text = question.text.to_lowercase();
    let reference = question.reference_answer.to_lowercase();

    keywords
        .iter()
        .filter(|term| text.contains(term) || reference.contains(term))
        .count()
}

pub fn is_relevant(question: &QuestionDraft, keywords: &KeywordSet) -> bool {
    relevance_score(question, keywords) >= RELEVANCE_THRESHOLD
}
