//! Exact token counting over the `cl100k_base` byte-pair vocabulary.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::error::{IndexError, Result};

/// Deterministic text to token-count function.
///
/// Cheap to clone; clones share the loaded vocabulary.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("vocabulary", &"cl100k_base")
            .finish()
    }
}

impl TokenCounter {
    /// Load the `cl100k_base` vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Configuration`] if the vocabulary cannot be loaded.
    /// There is no approximate fallback: every window boundary depends on
    /// exact counts.
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| IndexError::Configuration(format!("failed to load cl100k_base: {e}")))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }

    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> TokenCounter {
        TokenCounter::new().unwrap()
    }

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(counter().count(""), 0);
    }

    #[test]
    fn known_counts() {
        let c = counter();
        assert_eq!(c.count("hello"), 1);
        assert_eq!(c.count("hello world"), 2);
    }

    #[test]
    fn clones_share_vocabulary() {
        let a = counter();
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.bpe, &b.bpe));
        assert_eq!(a.count("GET /pets/{petId}"), b.count("GET /pets/{petId}"));
    }

    #[test]
    fn debug_names_vocabulary() {
        assert!(format!("{:?}", counter()).contains("cl100k_base"));
    }

    mod proptest_counter {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn count_is_deterministic(s in "\\PC{0,300}") {
                let c = counter();
                prop_assert_eq!(c.count(&s), c.count(&s));
            }

            #[test]
            fn count_bounded_by_bytes(s in "\\PC{0,300}") {
                let c = counter();
                prop_assert!(c.count(&s) <= s.len());
            }

            #[test]
            fn space_joined_words_count_additively(
                words in proptest::collection::vec("[a-zA-Z0-9_.{}/-]{1,12}", 1..20)
            ) {
                let c = counter();
                let joined = words.join(" ");
                let summed: usize = words
                    .iter()
                    .enumerate()
                    .map(|(i, w)| if i == 0 { c.count(w) } else { c.count(&format!(" {w}")) })
                    .sum();
                prop_assert_eq!(c.count(&joined), summed);
            }
        }
    }
}
