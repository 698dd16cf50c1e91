//! Token-aware sliding-window splitter.

use std::ops::Range;

use crate::chunk::ChunkConfig;
use crate::tokens::TokenCounter;

/// Splits text into whitespace-word windows of at most `max_tokens`, seeding
/// each window after the first with a suffix of its predecessor.
#[derive(Debug, Clone)]
pub struct ChunkWindower {
    counter: TokenCounter,
    max_tokens: usize,
    overlap_tokens: usize,
}

impl ChunkWindower {
    #[must_use]
    pub fn new(counter: TokenCounter, max_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            counter,
            max_tokens,
            overlap_tokens,
        }
    }

    #[must_use]
    pub fn from_config(counter: TokenCounter, config: &ChunkConfig) -> Self {
        Self::new(counter, config.max_tokens, config.overlap_tokens())
    }

    #[must_use]
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    #[must_use]
    pub fn overlap_tokens(&self) -> usize {
        self.overlap_tokens
    }

    /// Split `text` into ordered chunk texts.
    ///
    /// Text that already fits is returned unchanged as the only element.
    /// Otherwise chunks are whitespace words re-joined by single spaces; a
    /// word that alone exceeds `max_tokens` becomes its own chunk.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        if self.counter.count(text) <= self.max_tokens {
            return vec![text.to_owned()];
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        self.windows(&words)
            .into_iter()
            .map(|range| words[range].join(" "))
            .collect()
    }

    /// Word-index ranges of each window. Consecutive ranges overlap by the
    /// seed carried from the previous window.
    fn windows(&self, words: &[&str]) -> Vec<Range<usize>> {
        // cl100k never merges across a leading space, so a span costs its
        // first bare word plus every following word with one leading space.
        let bare: Vec<usize> = words.iter().map(|w| self.counter.count(w)).collect();
        let spaced: Vec<usize> = words
            .iter()
            .map(|w| self.counter.count(&format!(" {w}")))
            .collect();
        let span_cost = |r: Range<usize>| -> usize {
            if r.is_empty() {
                0
            } else {
                bare[r.start] + spaced[r.start + 1..r.end].iter().sum::<usize>()
            }
        };

        let mut windows = Vec::new();
        let mut start = 0;
        let mut seed_end = 0;
        let mut total = 0;
        let mut i = 0;

        while i < words.len() {
            if start == i {
                total = bare[i];
                i += 1;
                continue;
            }
            if total + spaced[i] <= self.max_tokens {
                total += spaced[i];
                i += 1;
                continue;
            }
            if i == seed_end {
                // Only the seed is buffered and it leaves no room for the
                // next word: shed seed words from the front.
                start += 1;
                total = span_cost(start..i);
                continue;
            }
            windows.push(start..i);
            start = self.overlap_start(start..i, &bare, &spaced);
            seed_end = i;
            total = span_cost(start..i);
        }

        if start < words.len() && (words.len() > seed_end || windows.is_empty()) {
            windows.push(start..words.len());
        }
        windows
    }

    /// First index of the longest suffix of `window` (never the whole window)
    /// whose token cost stays within the overlap budget.
    fn overlap_start(&self, window: Range<usize>, bare: &[usize], spaced: &[usize]) -> usize {
        let mut seed = window.end;
        let mut tail = 0;
        for j in (window.start + 1..window.end).rev() {
            if bare[j] + tail > self.overlap_tokens {
                break;
            }
            seed = j;
            tail += spaced[j];
        }
        seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windower(max_tokens: usize, overlap_tokens: usize) -> ChunkWindower {
        ChunkWindower::new(TokenCounter::new().unwrap(), max_tokens, overlap_tokens)
    }

    fn numbered_words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_text_returned_verbatim() {
        let w = windower(50, 5);
        let text = "  keeps\n its   original   spacing ";
        assert_eq!(w.split(text), vec![text.to_owned()]);
    }

    #[test]
    fn empty_text_is_single_empty_chunk() {
        assert_eq!(windower(10, 2).split(""), vec![String::new()]);
    }

    #[test]
    fn long_text_is_windowed_within_budget() {
        let counter = TokenCounter::new().unwrap();
        let w = windower(40, 8);
        let chunks = w.split(&numbered_words(200));
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(counter.count(chunk) <= 40, "chunk over budget: {chunk}");
        }
    }

    #[test]
    fn consecutive_chunks_share_overlap() {
        let w = windower(30, 6);
        let chunks = w.split(&numbered_words(120));
        for pair in chunks.windows(2) {
            let prev_last = pair[0].split_whitespace().last().unwrap();
            assert!(
                pair[1].split_whitespace().any(|word| word == prev_last),
                "next chunk should repeat the tail of the previous one"
            );
        }
    }

    #[test]
    fn zero_overlap_budget_produces_disjoint_windows() {
        let w = windower(20, 0);
        let chunks = w.split(&numbered_words(80));
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        let original = numbered_words(80);
        let expected: Vec<&str> = original.split_whitespace().collect();
        assert_eq!(rejoined, expected);
    }

    #[test]
    fn oversized_word_emitted_alone() {
        let counter = TokenCounter::new().unwrap();
        let huge = "x".repeat(2000);
        assert!(counter.count(&huge) > 20);
        let text = format!("alpha beta {huge} gamma delta");
        let chunks = windower(20, 4).split(&text);
        assert!(chunks.contains(&huge));
        assert_eq!(chunks.last().map(String::as_str), Some("gamma delta"));
    }

    #[test]
    fn split_is_deterministic() {
        let w = windower(25, 5);
        let text = numbered_words(90);
        assert_eq!(w.split(&text), w.split(&text));
    }

    mod proptest_windower {
        use super::*;
        use proptest::prelude::*;

        fn words_strategy() -> impl Strategy<Value = Vec<String>> {
            proptest::collection::vec("[a-z]{1,6}", 1..400)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn fitting_text_is_identity(text in "[a-zA-Z ,.]{0,200}") {
                let w = windower(1000, 100);
                prop_assert_eq!(w.split(&text), vec![text.clone()]);
            }

            #[test]
            fn windows_bound_tokens_and_preserve_words(
                words in words_strategy(),
                max_tokens in 60usize..150,
                pct in 0.2f64..0.5,
            ) {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
                let overlap = (pct * max_tokens as f64).floor() as usize;
                let w = windower(max_tokens, overlap);
                let counter = TokenCounter::new().unwrap();
                let text = words.join(" ");
                prop_assume!(counter.count(&text) > max_tokens);

                let refs: Vec<&str> = words.iter().map(String::as_str).collect();
                let ranges = w.windows(&refs);
                let chunks = w.split(&text);
                prop_assert!(ranges.len() > 1);
                prop_assert_eq!(ranges.len(), chunks.len());
                prop_assert_eq!(ranges[0].start, 0);
                prop_assert_eq!(ranges.last().unwrap().end, words.len());

                for (range, chunk) in ranges.iter().zip(&chunks) {
                    prop_assert_eq!(chunk, &words[range.clone()].join(" "));
                    prop_assert!(counter.count(chunk) <= max_tokens);
                }
                for pair in ranges.windows(2) {
                    let (prev, next) = (&pair[0], &pair[1]);
                    prop_assert!(next.start > prev.start);
                    prop_assert!(next.start < prev.end, "overlap must be non-empty");
                    let shared = words[next.start..prev.end].join(" ");
                    prop_assert!(counter.count(&shared) <= overlap);
                }
            }
        }
    }
}
