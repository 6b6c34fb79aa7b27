//! # Pre-token Pattern
//!
//! The fixed GPT-2-style word split pattern. The pattern is total: every
//! character of the input belongs to exactly one leftmost match, so the
//! concatenation of all matches reproduces the input.

use crate::errors::{BmResult, BytemillError};

/// The fixed pre-token split pattern.
///
/// The `\s+(?!\S)` alternative (whitespace not followed by a word, which
/// keeps one leading space attached to the next word) requires lookahead,
/// so this compiles under `fancy_regex` rather than `regex`.
pub const PRE_TOKEN_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// The compiled pre-token pattern.
#[derive(Debug, Clone)]
pub struct PreTokenizer {
    regex: fancy_regex::Regex,
}

impl Default for PreTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PreTokenizer {
    /// Compile the fixed pattern.
    pub fn new() -> Self {
        Self {
            regex: fancy_regex::Regex::new(PRE_TOKEN_PATTERN)
                .expect("regex pattern compilation failed"),
        }
    }

    /// Split `text` into its pre-token sequence.
    ///
    /// ## Arguments
    /// * `text` - the text to split.
    ///
    /// ## Returns
    /// The leftmost non-overlapping matches, in order; their concatenation
    /// equals `text`.
    pub fn split<'t>(
        &self,
        text: &'t str,
    ) -> BmResult<Vec<&'t str>> {
        let mut pre_tokens = Vec::new();
        for mat in self.regex.find_iter(text) {
            let mat = mat.map_err(|e| BytemillError::Scan(e.to_string()))?;
            pre_tokens.push(mat.as_str());
        }
        Ok(pre_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<&str> {
        PreTokenizer::new().split(text).unwrap()
    }

    #[test]
    fn test_words_numbers_punctuation() {
        assert_eq!(
            split("Hello, world! abc123"),
            vec!["Hello", ",", " world", "!", " abc", "123"]
        );
    }

    #[test]
    fn test_contractions() {
        assert_eq!(
            split("I can't, I've, we're"),
            vec!["I", " can", "'t", ",", " I", "'ve", ",", " we", "'re"]
        );
    }

    #[test]
    fn test_totality() {
        let cases = [
            "",
            "Hello world",
            "line1\n\nline2",
            "emoji \u{1F643} test",
            "  leading",
            "trailing   ",
            "\t\ttabs\tand\tspaces ",
        ];
        for text in cases {
            assert_eq!(split(text).concat(), text, "totality failed for {text:?}");
        }
    }
}
