//! Model answers for interview questions, whole or streamed.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::warn;

use crate::llm_client::{AnswerStream, LlmProvider};
use crate::streaming::{
    cap_words, paced, word_chunks, FALLBACK_CHUNK_DELAY, FALLBACK_CHUNK_WORDS,
};

pub const DEFAULT_WORD_LIMIT: usize = 100;

/// Provider answers must be longer than this (trimmed) to be used.
const MIN_USABLE_ANSWER_CHARS: usize = 50;
const APOLOGY_PREFIX: &str = "I couldn't generate";

pub const FALLBACK_ANSWER: &str = "I couldn't generate a specific answer at this time. Please write \
    your own answer based on your experience and knowledge relevant to this question.";

pub const FALLBACK_STREAM_ANSWER: &str = "I couldn't generate an answer at this time due to a \
    technical issue. Please try again later or write your own answer based on your experience \
    and knowledge.";

#[derive(Clone)]
pub struct AnswerService {
    llm: Arc<dyn LlmProvider>,
}

enum Phase {
    Upstream { upstream: AnswerStream, emitted: bool },
    Fallback(BoxStream<'static, String>),
}

fn is_usable(answer: &str) -> bool {
    answer.trim().chars().count() > MIN_USABLE_ANSWER_CHARS && !answer.starts_with(APOLOGY_PREFIX)
}

fn fallback_chunks() -> BoxStream<'static, String> {
    paced(
        word_chunks(FALLBACK_STREAM_ANSWER, FALLBACK_CHUNK_WORDS),
        FALLBACK_CHUNK_DELAY,
    )
}

/// Keeps the first `limit` whitespace-separated words and appends `...` when the
/// answer is longer than that; shorter answers come back unchanged.
pub fn truncate_words(answer: &str, limit: usize) -> String {
    let words: Vec<&str> = answer.split_whitespace().collect();
    if words.len() > limit {
        format!("{}...", words[..limit].join(" "))
    } else {
        answer.to_string()
    }
}

impl AnswerService {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Never fails. An unusable or failed provider answer gets one brief second attempt;
    /// if that fails or comes back blank, a canned answer is returned.
    pub async fn generate(&self, question_text: &str) -> String {
        match self.llm.generate_answer(question_text).await {
            Ok(answer) if is_usable(&answer) => return answer,
            Ok(answer) => warn!(
                "Provider answer unusable ({} chars); retrying with a brief prompt",
                answer.trim().len()
            ),
            Err(e) => warn!("Answer generation failed: {e}; retrying with a brief prompt"),
        }

        match self.llm.generate_brief_answer(question_text).await {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => {
                warn!("Brief answer was empty; using fallback");
                FALLBACK_ANSWER.to_string()
            }
            Err(e) => {
                warn!("Brief answer generation failed: {e}; using fallback");
                FALLBACK_ANSWER.to_string()
            }
        }
    }

    /// Streams an answer chunk by chunk, cut off with `...` after `word_limit` words.
    ///
    /// If the provider fails, or finishes without output, before the first chunk, the
    /// canned fallback is streamed instead. A failure after output has started ends the
    /// stream. Nothing runs until the stream is polled; dropping it stops generation.
    pub fn stream(&self, question_text: &str, word_limit: usize) -> BoxStream<'static, String> {
        let upstream = self.llm.generate_answer_stream(question_text);
        let start = Phase::Upstream {
            upstream,
            emitted: false,
        };

        let chunks = stream::unfold(start, |mut phase| async move {
            loop {
                phase = match phase {
                    Phase::Upstream {
                        mut upstream,
                        emitted,
                    } => match upstream.next().await {
                        Some(Ok(chunk)) if chunk.is_empty() => Phase::Upstream { upstream, emitted },
                        Some(Ok(chunk)) => {
                            return Some((
                                chunk,
                                Phase::Upstream {
                                    upstream,
                                    emitted: true,
                                },
                            ))
                        }
                        Some(Err(e)) if emitted => {
                            warn!("Answer stream failed mid-way: {e}");
                            return None;
                        }
                        Some(Err(e)) => {
                            warn!("Answer stream failed before any output: {e}; streaming fallback");
                            Phase::Fallback(fallback_chunks())
                        }
                        None if emitted => return None,
                        None => {
                            warn!("Answer stream ended without output; streaming fallback");
                            Phase::Fallback(fallback_chunks())
                        }
                    },
                    Phase::Fallback(mut chunks) => {
                        let chunk = chunks.next().await?;
                        return Some((chunk, Phase::Fallback(chunks)));
                    }
                };
            }
        })
        .boxed();

        cap_words(chunks, word_limit)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::llm_client::testing::ScriptedProvider;

    fn service(provider: ScriptedProvider) -> AnswerService {
        AnswerService::new(Arc::new(provider))
    }

    fn scripted_stream(items: Vec<Result<&str, &str>>) -> ScriptedProvider {
        ScriptedProvider {
            stream: items
                .into_iter()
                .map(|item| item.map(str::to_string).map_err(str::to_string))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_truncate_words_over_limit() {
        assert_eq!(truncate_words("one two  three\nfour", 2), "one two...");
    }

    #[test]
    fn test_truncate_words_at_or_under_limit_is_unchanged() {
        assert_eq!(truncate_words("one  two", 2), "one  two");
        assert_eq!(truncate_words("", 5), "");
    }

    #[tokio::test]
    async fn test_generate_accepts_substantial_answer() {
        let answer = "I would start by profiling the service under realistic load and then fix the hottest path.";
        let answers = service(ScriptedProvider {
            answer: Some(answer.to_string()),
            ..Default::default()
        });
        assert_eq!(answers.generate("How do you optimise?").await, answer);
    }

    #[tokio::test]
    async fn test_generate_rejects_short_and_apologetic_answers() {
        for bad in [
            "Too short.",
            "I couldn't generate an answer at this time. Please try again later or write your own answer.",
        ] {
            let answers = service(ScriptedProvider {
                answer: Some(bad.to_string()),
                ..Default::default()
            });
            assert_eq!(answers.generate("q").await, FALLBACK_ANSWER);
        }
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_error() {
        let provider = Arc::new(ScriptedProvider::default());
        let answers = AnswerService::new(provider.clone());
        assert_eq!(answers.generate("q").await, FALLBACK_ANSWER);
        // full attempt, then the brief one
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_generate_uses_brief_answer_after_failure() {
        let answers = service(ScriptedProvider {
            brief_answer: Some("  I keep services small and well tested.  ".to_string()),
            ..Default::default()
        });
        assert_eq!(
            answers.generate("q").await,
            "I keep services small and well tested."
        );
    }

    #[tokio::test]
    async fn test_generate_uses_brief_answer_after_unusable_answer() {
        let answers = service(ScriptedProvider {
            answer: Some("Too short.".to_string()),
            brief_answer: Some("Short but honest.".to_string()),
            ..Default::default()
        });
        assert_eq!(answers.generate("q").await, "Short but honest.");
    }

    #[tokio::test]
    async fn test_generate_skips_brief_attempt_for_good_answer() {
        let answer = "I would start by profiling the service under realistic load and then fix the hottest path.";
        let provider = Arc::new(ScriptedProvider {
            answer: Some(answer.to_string()),
            brief_answer: Some("unused".to_string()),
            ..Default::default()
        });
        let answers = AnswerService::new(provider.clone());
        assert_eq!(answers.generate("q").await, answer);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_falls_back_when_brief_answer_is_blank() {
        let answers = service(ScriptedProvider {
            brief_answer: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(answers.generate("q").await, FALLBACK_ANSWER);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_passes_provider_chunks_through() {
        let answers = service(scripted_stream(vec![Ok("Hello "), Ok(""), Ok("world. ")]));
        let chunks: Vec<String> = answers.stream("q", DEFAULT_WORD_LIMIT).collect().await;
        assert_eq!(chunks, vec!["Hello ", "world. "]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_falls_back_when_provider_fails_first() {
        let answers = service(scripted_stream(vec![Err("connection reset")]));
        let started = tokio::time::Instant::now();
        let chunks: Vec<String> = answers.stream("q", DEFAULT_WORD_LIMIT).collect().await;

        assert_eq!(chunks, word_chunks(FALLBACK_STREAM_ANSWER, 3));
        assert_eq!(chunks[0], "I couldn't generate ");
        assert_eq!(
            started.elapsed(),
            FALLBACK_CHUNK_DELAY * (chunks.len() as u32 - 1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_falls_back_when_provider_is_empty() {
        let answers = service(scripted_stream(Vec::new()));
        let text: String = answers
            .stream("q", DEFAULT_WORD_LIMIT)
            .collect::<Vec<_>>()
            .await
            .concat();
        assert_eq!(text.trim(), FALLBACK_STREAM_ANSWER);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_on_error_after_output() {
        let answers = service(scripted_stream(vec![
            Ok("First sentence. "),
            Err("upstream closed"),
            Ok("never seen"),
        ]));
        let chunks: Vec<String> = answers.stream("q", DEFAULT_WORD_LIMIT).collect().await;
        assert_eq!(chunks, vec!["First sentence. "]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_caps_long_answers_at_word_limit() {
        let long = format!("{}done.", "word ".repeat(150));
        let answers = service(scripted_stream(vec![Ok(long.as_str()), Ok("Never reached. ")]));
        let text: String = answers
            .stream("q", DEFAULT_WORD_LIMIT)
            .collect::<Vec<_>>()
            .await
            .concat();

        assert_eq!(text.split_whitespace().count(), DEFAULT_WORD_LIMIT);
        assert!(text.ends_with("word..."));
        assert!(!text.contains("Never reached"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_cap_counts_words_across_chunks() {
        let answers = service(scripted_stream(vec![Ok("One two. "), Ok("Three four. ")]));
        let text: String = answers.stream("q", 3).collect::<Vec<_>>().await.concat();
        assert_eq!(text, "One two. Three...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_stream_stops_fallback_early() {
        let answers = service(scripted_stream(vec![Err("down")]));
        let started = tokio::time::Instant::now();
        let chunks: Vec<String> = answers
            .stream("q", DEFAULT_WORD_LIMIT)
            .take(2)
            .collect()
            .await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }
}
