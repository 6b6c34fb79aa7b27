//! # Pre-token Counter

use crate::errors::BmResult;
use crate::pretokenize::pattern::PreTokenizer;
use crate::pretokenize::special_split::{Segment, SpecialSplitter};
use crate::types::{CommonHashMap, CountType};

/// A pre-token byte string to frequency map builder.
///
/// Special-token occurrences count as atomic pre-tokens; the runs between
/// them split under the fixed pre-token pattern. Counting is commutative, so
/// per-chunk counters can be merged in any order.
pub struct PreTokenCounter<C: CountType> {
    /// The compiled word split pattern.
    pretokenizer: PreTokenizer,

    /// The special-token splitter.
    splitter: SpecialSplitter,

    /// The pre-token counts.
    counts: CommonHashMap<Vec<u8>, C>,
}

impl<C: CountType> PreTokenCounter<C> {
    /// Create a new counter.
    pub fn new(
        pretokenizer: PreTokenizer,
        splitter: SpecialSplitter,
    ) -> Self {
        Self {
            pretokenizer,
            splitter,
            counts: CommonHashMap::new(),
        }
    }

    /// Update counts inplace from text.
    pub fn update_from_text(
        &mut self,
        text: &str,
    ) -> BmResult<()> {
        for segment in self.splitter.segments(text) {
            match segment {
                Segment::Special(special) => {
                    *self.counts.entry(special.as_bytes().to_vec()).or_default() += C::one();
                }
                Segment::Ordinary(run) => {
                    for pre_token in self.pretokenizer.split(run)? {
                        *self.counts.entry(pre_token.as_bytes().to_vec()).or_default() +=
                            C::one();
                    }
                }
            }
        }
        Ok(())
    }

    /// Update counts inplace from raw bytes, decoding as UTF-8 with
    /// replacement of invalid sequences.
    pub fn update_from_bytes(
        &mut self,
        bytes: &[u8],
    ) -> BmResult<()> {
        self.update_from_text(&String::from_utf8_lossy(bytes))
    }

    /// Fold another counter's counts into this one.
    pub fn merge(
        &mut self,
        other: Self,
    ) {
        for (pre_token, count) in other.counts {
            *self.counts.entry(pre_token).or_default() += count;
        }
    }

    /// Release the counts.
    pub fn release(self) -> CommonHashMap<Vec<u8>, C> {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(specials: &[&str]) -> PreTokenCounter<u64> {
        PreTokenCounter::new(
            PreTokenizer::new(),
            SpecialSplitter::new(specials).unwrap(),
        )
    }

    fn sorted_counts(counts: CommonHashMap<Vec<u8>, u64>) -> Vec<(String, u64)> {
        let mut out: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(k, v)| (String::from_utf8(k).unwrap(), v))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_basic_counts() {
        let mut wc = counter(&[]);
        wc.update_from_text("Hello world").unwrap();
        wc.update_from_text("Foo world bar world").unwrap();

        assert_eq!(
            sorted_counts(wc.release()),
            vec![
                (" bar".to_string(), 1),
                (" world".to_string(), 3),
                ("Foo".to_string(), 1),
                ("Hello".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_special_tokens_are_atomic() {
        let mut wc = counter(&["<|endoftext|>"]);
        wc.update_from_text("hi<|endoftext|>hi").unwrap();

        assert_eq!(
            sorted_counts(wc.release()),
            vec![("<|endoftext|>".to_string(), 1), ("hi".to_string(), 2)]
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut wc = counter(&[]);
        wc.update_from_bytes(b"ok \xFF\xFE ok").unwrap();

        let counts = wc.release();
        assert_eq!(counts.get("ok".as_bytes()), Some(&1));
        assert_eq!(counts.get(" ok".as_bytes()), Some(&1));
        assert!(
            counts
                .keys()
                .any(|k| String::from_utf8_lossy(k).contains('\u{FFFD}'))
        );
    }
}
