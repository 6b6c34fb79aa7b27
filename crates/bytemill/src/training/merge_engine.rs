//! # Merge Engine
//!
//! The incremental BPE merge loop. Each iteration selects the
//! highest-weighted adjacent pair across the multiset, records it as a merge
//! rule, and rewrites only the affected pre-tokens, maintaining the pair
//! index through local deltas.

use core::cmp::Ordering;

use dary_heap::OctonaryHeap;

use crate::errors::{BmResult, BytemillError};
use crate::symbol::{Symbol, SymbolPair};
use crate::training::pair_index::{PairIndex, PreTokenMultiset};
use crate::training::symbol_span::SymbolSpan;
use crate::types::{CommonHashMap, CommonHashSet, CountType, TokenType};
use crate::vocab::Vocabulary;

/// A candidate merge in the selection heap.
///
/// Max-heap by count; count ties resolve to the lexicographically greatest
/// pair under byte-wise tuple comparison. The tie-break lives in the heap
/// key because several equally-best pairs may be valid at once.
#[derive(Debug, Eq, PartialEq)]
pub struct MergeJob<C: CountType> {
    /// The pair's weighted occurrence count when this entry was pushed.
    pub count: C,

    /// The candidate pair.
    pub pair: SymbolPair,
}

impl<C: CountType> Ord for MergeJob<C> {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| self.pair.cmp(&other.pair))
    }
}

impl<C: CountType> PartialOrd for MergeJob<C> {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Results of a training run.
#[derive(Debug, Clone)]
pub struct TrainOutput<T: TokenType> {
    /// The trained vocabulary.
    pub vocab: Vocabulary<T>,

    /// The learned merges, in creation order.
    pub merges: Vec<SymbolPair>,
}

/// The BPE merge engine.
///
/// Owns the multiset and pair index exclusively; runs single-threaded to
/// completion, deterministically.
#[derive(Debug)]
pub struct MergeEngine<T: TokenType, C: CountType> {
    multiset: PreTokenMultiset<C>,
    index: PairIndex<C>,
    heap: OctonaryHeap<MergeJob<C>>,
    vocab: Vocabulary<T>,
    merges: Vec<SymbolPair>,
    vocab_size: usize,
}

impl<T: TokenType, C: CountType> MergeEngine<T, C> {
    /// Set up an engine over an initial multiset.
    ///
    /// ## Arguments
    /// * `multiset` - the weighted pre-token multiset.
    /// * `specials` - declared special token byte strings, in declaration
    ///   order. Pre-tokens whose byte concatenation equals one are frozen.
    /// * `vocab_size` - the target vocabulary size; must be at least
    ///   `256 + specials.len()` and within the capacity of `T`.
    pub fn new(
        multiset: PreTokenMultiset<C>,
        specials: &[Vec<u8>],
        vocab_size: usize,
    ) -> BmResult<Self> {
        let floor = 256 + specials.len();
        if vocab_size < floor {
            return Err(BytemillError::VocabSizeTooSmall {
                size: vocab_size,
                floor,
                specials: specials.len(),
            });
        }
        if T::from_usize(vocab_size - 1).is_none() {
            return Err(BytemillError::VocabSizeOverflow { size: vocab_size });
        }

        let vocab =
            Vocabulary::with_specials(specials.iter().map(|bytes| Symbol::from_bytes(bytes)))?;

        // Frozen spans never enter the index, so no later step can select or
        // rewrite them; their entries simply ride along in the multiset.
        let special_bytes: CommonHashSet<&[u8]> =
            specials.iter().map(Vec::as_slice).collect();
        let frozen: CommonHashSet<SymbolSpan> = multiset
            .keys()
            .filter(|span| special_bytes.contains(span.concat_bytes().as_slice()))
            .cloned()
            .collect();

        let index = PairIndex::from_multiset(&multiset, &frozen);

        let mut heap = OctonaryHeap::with_capacity(index.pair_counts.len());
        for (pair, &count) in index.pair_counts.iter() {
            heap.push(MergeJob {
                count,
                pair: pair.clone(),
            });
        }

        Ok(Self {
            multiset,
            index,
            heap,
            vocab,
            merges: Vec::new(),
            vocab_size,
        })
    }

    /// Run the merge loop to completion.
    pub fn run(mut self) -> BmResult<TrainOutput<T>> {
        let num_merges = self.vocab_size - self.vocab.len();
        log::info!(
            "Starting BPE training: {} merges to compute over {} pre-tokens",
            num_merges,
            self.multiset.len(),
        );

        let mut last_log_percent = 0;
        while self.vocab.len() < self.vocab_size {
            if !self.step()? {
                log::info!("No pairs remain; stopping early");
                break;
            }

            // Log progress every 1%.
            let merges_done = self.merges.len();
            let current_percent = (merges_done * 100) / num_merges;
            if current_percent > last_log_percent {
                log::info!(
                    "Progress: {}% ({}/{} merges) - Last merge: {:?}",
                    current_percent,
                    merges_done,
                    num_merges,
                    self.merges.last().unwrap(),
                );
                last_log_percent = current_percent;
            }
        }

        log::info!("Finished training: {} merges completed", self.merges.len());
        Ok(TrainOutput {
            vocab: self.vocab,
            merges: self.merges,
        })
    }

    /// Perform one merge iteration.
    ///
    /// ## Returns
    /// `false` if no pair with a positive count remains.
    fn step(&mut self) -> BmResult<bool> {
        // Pop until a live entry surfaces. Entries whose recorded count no
        // longer matches the current count are stale; fresh entries were
        // pushed when the count changed.
        let job = loop {
            let Some(job) = self.heap.pop() else {
                return Ok(false);
            };
            match self.index.pair_counts.get(&job.pair) {
                Some(&count) if count == job.count => break job,
                _ => continue,
            }
        };

        let merged = job.pair.0.concat(&job.pair.1);
        self.merges.push(job.pair.clone());
        self.vocab.push(merged.clone())?;

        let members: Vec<SymbolSpan> = match self.index.pair_members.get(&job.pair) {
            Some(members) => members.iter().cloned().collect(),
            None => {
                return Err(BytemillError::InvariantViolation(format!(
                    "pair {:?} has count {} but no members",
                    job.pair, job.count,
                )));
            }
        };

        let mut changed: CommonHashSet<SymbolPair> = CommonHashSet::new();
        let mut rewritten: CommonHashMap<SymbolSpan, C> = CommonHashMap::new();

        // Unwind each affected span's whole contribution, rewrite it, and
        // accumulate the weight under the rewritten sequence. Distinct spans
        // may rewrite to the same sequence; their weights add.
        for span in members {
            let weight = self.multiset.remove(&span).ok_or_else(|| {
                BytemillError::InvariantViolation(format!(
                    "member span {span:?} missing from multiset"
                ))
            })?;

            for pair in self.index.span_pairs.get(&span).into_iter().flatten() {
                changed.insert(pair.0.clone());
            }
            self.index.remove_span(&span, weight)?;

            let new_span = span.merge_pair(&job.pair, &merged);
            *rewritten.entry(new_span).or_default() += weight;
        }

        for (span, weight_delta) in rewritten {
            *self.multiset.entry(span.clone()).or_default() += weight_delta;
            self.index.add_span(&span, weight_delta);
            for pair in self.index.span_pairs.get(&span).into_iter().flatten() {
                changed.insert(pair.0.clone());
            }
        }

        // Refresh the heap for every pair whose count moved.
        for pair in changed {
            if let Some(&count) = self.index.pair_counts.get(&pair) {
                if count > C::zero() {
                    self.heap.push(MergeJob { count, pair });
                }
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(text: &str) -> Symbol {
        Symbol::from_bytes(text.as_bytes())
    }

    fn multiset(entries: &[(&str, u64)]) -> PreTokenMultiset<u64> {
        entries
            .iter()
            .map(|&(text, weight)| (SymbolSpan::from_bytes(text.as_bytes()), weight))
            .collect()
    }

    #[test]
    fn test_merge_job_ordering() {
        let high = MergeJob::<u64> {
            count: 2,
            pair: (sym("a"), sym("b")),
        };
        let low = MergeJob::<u64> {
            count: 1,
            pair: (sym("z"), sym("z")),
        };
        assert!(high > low);

        // Equal counts resolve to the greatest pair.
        let ab = MergeJob::<u64> {
            count: 1,
            pair: (sym("a"), sym("b")),
        };
        let ba = MergeJob::<u64> {
            count: 1,
            pair: (sym("b"), sym("a")),
        };
        assert!(ba > ab);
    }

    #[test]
    fn test_basic_merges() {
        let ms = multiset(&[("aaabdaaabac", 1)]);
        let engine: MergeEngine<u32, u64> = MergeEngine::new(ms, &[], 259).unwrap();
        let output = engine.run().unwrap();

        assert_eq!(
            output.merges,
            vec![
                (sym("a"), sym("a")),
                (sym("aa"), sym("a")),
                (sym("aaa"), sym("b")),
            ]
        );
        assert_eq!(output.vocab.len(), 259);
        assert_eq!(output.vocab.symbol_for(256), Some(&sym("aa")));
        assert_eq!(output.vocab.symbol_for(257), Some(&sym("aaa")));
        assert_eq!(output.vocab.symbol_for(258), Some(&sym("aaab")));
    }

    #[test]
    fn test_tie_break_prefers_greatest_pair() {
        // After (a,b) merges, (b,a) ties with the space-prefixed pairs and
        // must win by lexicographic descent.
        let ms = multiset(&[("ab", 1), (" ab", 1), (" ba", 1)]);
        let engine: MergeEngine<u32, u64> = MergeEngine::new(ms, &[], 258).unwrap();
        let output = engine.run().unwrap();

        assert_eq!(
            output.merges,
            vec![(sym("a"), sym("b")), (sym("b"), sym("a"))]
        );
    }

    #[test]
    fn test_special_pre_tokens_frozen() {
        let ms = multiset(&[("hi", 2), ("<|endoftext|>", 3)]);
        let specials = vec![b"<|endoftext|>".to_vec()];
        let engine: MergeEngine<u32, u64> = MergeEngine::new(ms, &specials, 300).unwrap();
        let output = engine.run().unwrap();

        // Only (h,i) is ever mergeable; the frozen span contributes nothing.
        assert_eq!(output.merges, vec![(sym("h"), sym("i"))]);
        assert_eq!(output.vocab.len(), 258);
        assert_eq!(output.vocab.symbol_for(256), Some(&sym("<|endoftext|>")));
        assert_eq!(output.vocab.symbol_for(257), Some(&sym("hi")));
    }

    #[test]
    fn test_vocab_floor_enforced() {
        let err = MergeEngine::<u32, u64>::new(
            multiset(&[("ab", 1)]),
            &[b"<|endoftext|>".to_vec()],
            256,
        )
        .unwrap_err();
        assert!(matches!(err, BytemillError::VocabSizeTooSmall { .. }));
    }

    #[test]
    fn test_token_type_capacity_enforced() {
        let err =
            MergeEngine::<u8, u64>::new(multiset(&[("ab", 1)]), &[], 300).unwrap_err();
        assert!(matches!(err, BytemillError::VocabSizeOverflow { .. }));
    }

    #[test]
    fn test_weights_coalesce() {
        // "ab c" and "abc" both rewrite toward spans that eventually share
        // structure; exercise the weight-folding path with two spans that
        // rewrite to the same sequence.
        let ms = multiset(&[("xab", 1), ("xab", 1)]);
        assert_eq!(ms.len(), 1); // same key collapses at construction

        let ms = multiset(&[("aab", 3), ("ab", 2)]);
        let engine: MergeEngine<u32, u64> = MergeEngine::new(ms, &[], 257).unwrap();
        let output = engine.run().unwrap();
        // (a,b) count 5 beats (a,a) count 3.
        assert_eq!(output.merges, vec![(sym("a"), sym("b"))]);
    }

    #[test]
    fn test_index_consistent_across_steps() {
        let ms = multiset(&[
            ("the cat sat", 4),
            ("the mat", 3),
            ("that cat", 2),
            ("aaaa", 5),
        ]);
        let mut engine: MergeEngine<u32, u64> = MergeEngine::new(ms, &[], 300).unwrap();

        let frozen = CommonHashSet::new();
        loop {
            engine.index.validate(&engine.multiset, &frozen).unwrap();
            if !engine.step().unwrap() {
                break;
            }
        }
    }

    #[test]
    fn test_merge_replay_reproduces_final_multiset() {
        let originals = [("banana band", 3), ("bandana", 2), ("nab", 7)];
        let ms = multiset(&originals);
        let mut engine: MergeEngine<u32, u64> = MergeEngine::new(ms, &[], 270).unwrap();
        while engine.step().unwrap() {}

        // Replay the recorded merges over the exploded originals.
        let mut replayed: PreTokenMultiset<u64> = CommonHashMap::new();
        for &(text, weight) in &originals {
            let mut span = SymbolSpan::from_bytes(text.as_bytes());
            for pair in &engine.merges {
                span = span.merge_pair(pair, &pair.0.concat(&pair.1));
            }
            *replayed.entry(span).or_default() += weight;
        }

        assert_eq!(replayed, engine.multiset);
    }
}
