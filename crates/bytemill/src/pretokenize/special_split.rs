//! # Special Token Splitting
//!
//! Splits text into special-token occurrences and the ordinary runs between
//! them. Used by both training pre-tokenization (special occurrences become
//! atomic, frozen pre-tokens) and encoding (special occurrences map to their
//! atomic IDs).

use crate::errors::{BmResult, BytemillError};

/// One segment of a special-token split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    /// An exact occurrence of a declared special token.
    Special(&'t str),

    /// A maximal run of text between special tokens.
    Ordinary(&'t str),
}

/// A longest-match-first splitter over a set of special tokens.
#[derive(Debug, Clone)]
pub struct SpecialSplitter {
    regex: Option<regex::Regex>,
}

impl SpecialSplitter {
    /// Build a splitter for the given special tokens.
    ///
    /// The union alternation is ordered by descending byte length, so an
    /// overlapping special (`<|eot|><|eot|>` vs `<|eot|>`) resolves to the
    /// longest declared match.
    pub fn new<S: AsRef<str>>(specials: &[S]) -> BmResult<Self> {
        if specials.is_empty() {
            return Ok(Self { regex: None });
        }

        let mut alts: Vec<&str> = specials.iter().map(AsRef::as_ref).collect();
        alts.sort_by_key(|s| core::cmp::Reverse(s.len()));

        let pattern = alts
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");

        let regex = regex::Regex::new(&pattern)
            .map_err(|e| BytemillError::Pattern(e.to_string()))?;

        Ok(Self { regex: Some(regex) })
    }

    /// Split `text` into special and ordinary segments.
    ///
    /// Concatenating the segments reproduces `text`; empty ordinary runs are
    /// not emitted.
    pub fn segments<'t>(
        &self,
        text: &'t str,
    ) -> Vec<Segment<'t>> {
        let Some(regex) = &self.regex else {
            if text.is_empty() {
                return Vec::new();
            }
            return vec![Segment::Ordinary(text)];
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for mat in regex.find_iter(text) {
            if mat.start() > last {
                segments.push(Segment::Ordinary(&text[last..mat.start()]));
            }
            segments.push(Segment::Special(mat.as_str()));
            last = mat.end();
        }
        if last < text.len() {
            segments.push(Segment::Ordinary(&text[last..]));
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_specials() {
        let splitter = SpecialSplitter::new::<&str>(&[]).unwrap();
        assert_eq!(splitter.segments(""), Vec::<Segment>::new());
        assert_eq!(splitter.segments("abc"), vec![Segment::Ordinary("abc")]);
    }

    #[test]
    fn test_basic_split() {
        let splitter = SpecialSplitter::new(&["<|endoftext|>"]).unwrap();
        assert_eq!(
            splitter.segments("hi<|endoftext|>hi"),
            vec![
                Segment::Ordinary("hi"),
                Segment::Special("<|endoftext|>"),
                Segment::Ordinary("hi"),
            ]
        );

        assert_eq!(
            splitter.segments("<|endoftext|>"),
            vec![Segment::Special("<|endoftext|>")]
        );
    }

    #[test]
    fn test_longest_match_first() {
        let splitter =
            SpecialSplitter::new(&["<|endoftext|>", "<|endoftext|><|endoftext|>"]).unwrap();
        assert_eq!(
            splitter.segments("a<|endoftext|><|endoftext|>b"),
            vec![
                Segment::Ordinary("a"),
                Segment::Special("<|endoftext|><|endoftext|>"),
                Segment::Ordinary("b"),
            ]
        );
    }
}
