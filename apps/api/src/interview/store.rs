use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::models::question::{Question, QuestionDraft};

/// What the store keeps per question. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredQuestion {
    pub text: String,
    pub reference_answer: String,
}

/// Process-lifetime map from question identity to its text and reference answer.
///
/// Created once at startup and handed to the pipeline and the evaluator; clones share
/// the same map. Inserts are visible to every clone as soon as `insert` returns.
/// No expiry, eviction or deletion.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    questions: Arc<DashMap<Uuid, StoredQuestion>>,
}

impl QuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh identity for `draft` and stores it.
    pub fn insert(&self, draft: QuestionDraft) -> Question {
        loop {
            let id = Uuid::new_v4();
            if let Entry::Vacant(slot) = self.questions.entry(id) {
                slot.insert(StoredQuestion {
                    text: draft.text.clone(),
                    reference_answer: draft.reference_answer.clone(),
                });
                return Question {
                    id,
                    text: draft.text,
                    reference_answer: draft.reference_answer,
                };
            }
        }
    }

    /// Looks up a question by its client-facing id. Anything that is not a
    /// well-formed id is simply not found.
    pub fn get(&self, id: &str) -> Option<StoredQuestion> {
        let id = Uuid::parse_str(id.trim()).ok()?;
        self.questions.get(&id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
