//! Interview core: question generation with relevance filtering and template backfill,
//! answer evaluation, JD analysis and model answers.
//!
//! All services here degrade to deterministic output on LLM failure; none of them
//! returns an error to the HTTP layer.

pub mod analysis;
pub mod answers;
pub mod evaluation;
pub mod handlers;
pub mod keywords;
pub mod pipeline;
pub mod relevance;
pub mod store;
pub mod templates;
