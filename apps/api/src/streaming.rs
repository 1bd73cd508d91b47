//! Paced text streams: incremental emission of answer text with delays between chunks.
//!
//! Streams are lazy and consumer-driven: nothing is produced until polled, and dropping
//! the stream (e.g. when the client disconnects) stops it between two chunks.

use std::sync::LazyLock;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;

/// Delay between sentences when replaying a finished answer.
pub const SENTENCE_DELAY: Duration = Duration::from_millis(200);
/// Delay between word groups when streaming a canned fallback.
pub const FALLBACK_CHUNK_DELAY: Duration = Duration::from_millis(100);
/// Words per chunk when streaming a canned fallback.
pub const FALLBACK_CHUNK_WORDS: usize = 3;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex is valid"));

/// Emits `chunks` in order, sleeping `delay` before every chunk after the first.
pub fn paced(chunks: Vec<String>, delay: Duration) -> BoxStream<'static, String> {
    stream::unfold(
        (chunks.into_iter(), true),
        move |(mut chunks, first)| async move {
            let chunk = chunks.next()?;
            if !first {
                tokio::time::sleep(delay).await;
            }
            Some((chunk, (chunks, false)))
        },
    )
    .boxed()
}

/// Splits text after `.`, `!` or `?` followed by whitespace. Each sentence keeps its
/// terminal punctuation and carries a single trailing space.
pub fn sentence_chunks(text: &str) -> Vec<String> {
    let text = text.trim();
    let mut chunks = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK.find_iter(text) {
        // punctuation is a single ASCII byte
        push_chunk(&mut chunks, &text[start..m.start() + 1]);
        start = m.end();
    }
    push_chunk(&mut chunks, &text[start..]);

    chunks
}

/// Groups whitespace-separated words `per_chunk` at a time, each group followed by a space.
pub fn word_chunks(text: &str, per_chunk: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(per_chunk.max(1))
        .map(|group| format!("{} ", group.join(" ")))
        .collect()
}

struct WordCap {
    inner: BoxStream<'static, String>,
    words: usize,
    in_word: bool,
}

/// Passes chunks through until `limit` words have been emitted, then ends the stream
/// with `...` in place of the rest. Words are counted across chunk boundaries, so a
/// word split over two chunks counts once.
pub fn cap_words(chunks: BoxStream<'static, String>, limit: usize) -> BoxStream<'static, String> {
    let start = WordCap {
        inner: chunks,
        words: 0,
        in_word: false,
    };

    stream::unfold(Some(start), move |state| async move {
        let mut cap = state?;
        let chunk = cap.inner.next().await?;

        for (idx, ch) in chunk.char_indices() {
            if ch.is_whitespace() {
                cap.in_word = false;
            } else if !cap.in_word {
                cap.in_word = true;
                cap.words += 1;
                if cap.words > limit {
                    return Some((format!("{}...", chunk[..idx].trim_end()), None));
                }
            }
        }
        Some((chunk, Some(cap)))
    })
    .boxed()
}

fn push_chunk(chunks: &mut Vec<String>, sentence: &str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        chunks.push(format!("{sentence} "));
    }
}
