//! Question pipeline: LLM generation, relevance filtering, template backfill, identity.
//!
//! The pipeline never fails: any provider error or empty response degrades to a full
//! batch of template questions, so callers always get exactly the requested count.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::interview::keywords::{extract_keywords, KeywordSet};
use crate::interview::relevance::is_relevant;
use crate::interview::store::QuestionStore;
use crate::interview::templates::generate_template_questions;
use crate::llm_client::LlmProvider;
use crate::models::question::{Question, QuestionDraft};

/// Below this share of kept questions the batch is reported as mostly off-topic.
/// Logging only; backfill is always the exact shortfall.
pub const MIN_KEPT_RATIO: f64 = 0.7;

#[derive(Clone)]
pub struct QuestionPipeline {
    llm: Arc<dyn LlmProvider>,
    store: QuestionStore,
}

impl QuestionPipeline {
    pub fn new(llm: Arc<dyn LlmProvider>, store: QuestionStore) -> Self {
        Self { llm, store }
    }

    /// Returns exactly `requested` questions, each stored under a fresh identity.
    pub async fn generate_questions(&self, jd_text: &str, requested: usize) -> Vec<Question> {
        let keywords = extract_keywords(jd_text);
        debug!(
            "Extracted {} key terms from JD: {:?}",
            keywords.len(),
            keywords.sorted().into_iter().take(10).collect::<Vec<_>>()
        );

        let kept = match self.llm.generate_questions(jd_text, requested).await {
            Ok(drafts) if drafts.is_empty() => {
                warn!("LLM returned no questions; using template questions");
                Vec::new()
            }
            Ok(drafts) => select_relevant(drafts, &keywords),
            Err(e) => {
                warn!("LLM question generation failed: {e}; using template questions");
                Vec::new()
            }
        };

        assemble(kept, jd_text, requested)
            .into_iter()
            .map(|draft| self.store.insert(draft))
            .collect()
    }
}

/// Keeps the drafts that mention enough JD keywords, in their original order.
pub fn select_relevant(drafts: Vec<QuestionDraft>, keywords: &KeywordSet) -> Vec<QuestionDraft> {
    let total = drafts.len();
    let kept: Vec<QuestionDraft> = drafts
        .into_iter()
        .filter(|draft| {
            let relevant = is_relevant(draft, keywords);
            if !relevant {
                debug!("Discarding irrelevant question: {}", preview(&draft.text));
            }
            relevant
        })
        .collect();

    if kept.len() < total {
        info!("Kept {} of {} LLM questions", kept.len(), total);
    }
    kept
}

/// Kept questions first, then template questions for the shortfall, cut to `requested`.
pub fn assemble(mut kept: Vec<QuestionDraft>, jd_text: &str, requested: usize) -> Vec<QuestionDraft> {
    if (kept.len() as f64) < requested as f64 * MIN_KEPT_RATIO {
        warn!(
            "Only {} of {} requested questions were relevant; filling with template questions",
            kept.len(),
            requested
        );
    }

    let shortfall = requested.saturating_sub(kept.len());
    if shortfall > 0 {
        kept.extend(generate_template_questions(jd_text, shortfall));
    }
    kept.truncate(requested);
    kept
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::llm_client::testing::ScriptedProvider;

    const JD: &str = "Senior backend engineer. You will design Python microservices deployed with \
        Docker on Kubernetes, expose REST APIs backed by PostgreSQL, and keep the CI/CD pipeline \
        healthy. Strong testing habits and clear written communication are expected.";

    fn on_topic(n: usize) -> Vec<QuestionDraft> {
        (0..n)
            .map(|i| {
                QuestionDraft::new(
                    format!("Question {i}: how do you run Python services in Docker?"),
                    "Mention Kubernetes rollouts.",
                )
            })
            .collect()
    }

    fn off_topic(n: usize) -> Vec<QuestionDraft> {
        (0..n)
            .map(|i| QuestionDraft::new(format!("Favourite colour number {i}?"), "Blue."))
            .collect()
    }

    fn build(provider: ScriptedProvider) -> (QuestionPipeline, QuestionStore) {
        let store = QuestionStore::new();
        (QuestionPipeline::new(Arc::new(provider), store.clone()), store)
    }

    fn drafts(questions: &[Question]) -> Vec<QuestionDraft> {
        questions
            .iter()
            .map(|q| QuestionDraft::new(q.text.clone(), q.reference_answer.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_all_relevant_questions_are_used_as_is() {
        let (pipeline, store) = build(ScriptedProvider {
            questions: Some(on_topic(5)),
            ..Default::default()
        });

        let questions = pipeline.generate_questions(JD, 5).await;
        assert_eq!(drafts(&questions), on_topic(5));
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_template_batch() {
        let (pipeline, store) = build(ScriptedProvider::default());

        let questions = pipeline.generate_questions(JD, 8).await;
        assert_eq!(drafts(&questions), generate_template_questions(JD, 8));
        assert_eq!(store.len(), 8);
    }

    #[tokio::test]
    async fn test_empty_response_yields_template_batch() {
        let (pipeline, _) = build(ScriptedProvider {
            questions: Some(Vec::new()),
            ..Default::default()
        });

        let questions = pipeline.generate_questions(JD, 5).await;
        assert_eq!(drafts(&questions), generate_template_questions(JD, 5));
    }

    #[tokio::test]
    async fn test_irrelevant_questions_are_replaced_after_kept_ones() {
        let mut mixed = off_topic(2);
        mixed.extend(on_topic(3));
        let (pipeline, _) = build(ScriptedProvider {
            questions: Some(mixed),
            ..Default::default()
        });

        let questions = pipeline.generate_questions(JD, 5).await;
        let mut expected = on_topic(3);
        expected.extend(generate_template_questions(JD, 2));
        assert_eq!(drafts(&questions), expected);
    }

    #[tokio::test]
    async fn test_small_shortfall_above_ratio_is_still_backfilled() {
        // 9 of 10 kept: above the 70% mark, one template question still added
        let mut mixed = on_topic(9);
        mixed.extend(off_topic(1));
        let (pipeline, _) = build(ScriptedProvider {
            questions: Some(mixed),
            ..Default::default()
        });

        let questions = pipeline.generate_questions(JD, 10).await;
        assert_eq!(questions.len(), 10);
        assert_eq!(drafts(&questions[9..]), generate_template_questions(JD, 1));
    }

    #[tokio::test]
    async fn test_surplus_is_truncated_in_order() {
        let (pipeline, store) = build(ScriptedProvider {
            questions: Some(on_topic(7)),
            ..Default::default()
        });

        let questions = pipeline.generate_questions(JD, 5).await;
        assert_eq!(drafts(&questions), on_topic(5));
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_every_count_in_range_yields_unique_stored_ids() {
        for count in [5, 6, 17, 50] {
            let (pipeline, store) = build(ScriptedProvider {
                questions: Some(on_topic(count / 2)),
                ..Default::default()
            });

            let questions = pipeline.generate_questions(JD, count).await;
            assert_eq!(questions.len(), count);

            let ids: HashSet<_> = questions.iter().map(|q| q.id).collect();
            assert_eq!(ids.len(), count);
            for q in &questions {
                let stored = store.get(&q.id.to_string()).unwrap();
                assert_eq!(stored.text, q.text);
                assert_eq!(stored.reference_answer, q.reference_answer);
            }
        }
    }

    #[test]
    fn test_assemble_without_kept_questions() {
        assert_eq!(assemble(Vec::new(), JD, 6), generate_template_questions(JD, 6));
    }

    #[test]
    fn test_select_relevant_preserves_order() {
        let keywords = extract_keywords(JD);
        let mut mixed = on_topic(1);
        mixed.extend(off_topic(1));
        mixed.extend(on_topic(2));

        let kept = select_relevant(mixed, &keywords);
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|q| q.text.contains("Python")));
    }
}
