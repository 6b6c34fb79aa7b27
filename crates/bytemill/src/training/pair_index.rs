//! # Pair Index
//!
//! The merge engine's auxiliary state: global weighted pair counts, the
//! reverse pair-to-span membership index, and per-span local pair counts.
//! Kept consistent by whole-span contribution deltas, so each merge step
//! costs work proportional only to the affected spans.

use crate::errors::{BmResult, BytemillError};
use crate::symbol::SymbolPair;
use crate::training::symbol_span::SymbolSpan;
use crate::types::{CommonHashMap, CommonHashSet, CountType};

/// A weighted pre-token multiset: span to strictly-positive frequency.
pub type PreTokenMultiset<C> = CommonHashMap<SymbolSpan, C>;

/// Pair occurrence counts local to one span.
pub type LocalPairCounts = CommonHashMap<SymbolPair, u32>;

/// An index of pair information over a [`PreTokenMultiset`].
///
/// Invariant, at every merge-step boundary: for every pair `P`,
/// `pair_counts[P]` equals the sum over member spans `p` of
/// `span_pairs[p][P] * multiset[p]`, and `pair_members[P]` is non-empty
/// exactly when `pair_counts[P] > 0`. Frozen spans are never indexed.
#[derive(Debug, Clone, Default)]
pub struct PairIndex<C: CountType> {
    /// Pair to total weighted occurrence count across the multiset.
    pub pair_counts: CommonHashMap<SymbolPair, C>,

    /// Pair to the set of spans currently containing it.
    pub pair_members: CommonHashMap<SymbolPair, CommonHashSet<SymbolSpan>>,

    /// Span to its local pair occurrence counts.
    pub span_pairs: CommonHashMap<SymbolSpan, LocalPairCounts>,
}

impl<C: CountType> PairIndex<C> {
    /// Build the index for a multiset.
    ///
    /// ## Arguments
    /// * `multiset` - the weighted pre-token multiset.
    /// * `frozen` - spans that contribute no pairs.
    pub fn from_multiset(
        multiset: &PreTokenMultiset<C>,
        frozen: &CommonHashSet<SymbolSpan>,
    ) -> Self {
        let mut index = Self::default();
        for (span, &weight) in multiset.iter() {
            if !frozen.contains(span) {
                index.add_span(span, weight);
            }
        }
        index
    }

    /// Add a span's pair contributions, scaled by a weight delta.
    ///
    /// Called when weight is added to a span: on initial indexing, and when
    /// a rewritten span receives the weight of the spans that coalesced into
    /// it. A span that already holds live contributions keeps its local
    /// counts; only the new weight is applied on top.
    pub fn add_span(
        &mut self,
        span: &SymbolSpan,
        weight_delta: C,
    ) {
        if span.len() < 2 || weight_delta == C::zero() {
            return;
        }

        let local = self
            .span_pairs
            .entry(span.clone())
            .or_insert_with(|| span.pair_occurrences());

        for (pair, &occurrences) in local.iter() {
            let delta = C::from_u32(occurrences).unwrap() * weight_delta;
            *self.pair_counts.entry(pair.clone()).or_default() += delta;
            self.pair_members
                .entry(pair.clone())
                .or_default()
                .insert(span.clone());
        }
    }

    /// Remove a span's entire weighted contribution.
    ///
    /// Pairs whose count reaches zero are deleted outright; a count that
    /// would underflow means the index has drifted from the multiset, which
    /// is a fatal internal error.
    pub fn remove_span(
        &mut self,
        span: &SymbolSpan,
        weight: C,
    ) -> BmResult<()> {
        let Some(local) = self.span_pairs.remove(span) else {
            return Ok(());
        };

        for (pair, occurrences) in local {
            let delta = C::from_u32(occurrences).unwrap() * weight;
            let current = *self.pair_counts.get(&pair).unwrap_or(&C::zero());

            if current < delta {
                return Err(BytemillError::InvariantViolation(format!(
                    "pair count underflow for {pair:?}: {current} - {delta}"
                )));
            }
            if current == delta {
                self.pair_counts.remove(&pair);
            } else {
                self.pair_counts.insert(pair.clone(), current - delta);
            }

            if let Some(members) = self.pair_members.get_mut(&pair) {
                members.remove(span);
                if members.is_empty() {
                    self.pair_members.remove(&pair);
                }
            }
        }

        Ok(())
    }

    /// Check the index against its multiset.
    ///
    /// Rebuilds the pair counts from scratch and compares; also checks the
    /// membership/count coupling and the total-count identity
    /// `sum(pair_counts) == sum((len - 1) * weight)` over non-frozen spans.
    pub fn validate(
        &self,
        multiset: &PreTokenMultiset<C>,
        frozen: &CommonHashSet<SymbolSpan>,
    ) -> BmResult<()> {
        let rebuilt = Self::from_multiset(multiset, frozen);

        if rebuilt.pair_counts != self.pair_counts {
            return Err(BytemillError::InvariantViolation(
                "pair counts drifted from multiset".to_string(),
            ));
        }

        for (pair, members) in &self.pair_members {
            if members.is_empty() {
                return Err(BytemillError::InvariantViolation(format!(
                    "empty member set for {pair:?}"
                )));
            }
            if !self.pair_counts.contains_key(pair) {
                return Err(BytemillError::InvariantViolation(format!(
                    "members without count for {pair:?}"
                )));
            }
        }
        for pair in self.pair_counts.keys() {
            if !self.pair_members.contains_key(pair) {
                return Err(BytemillError::InvariantViolation(format!(
                    "count without members for {pair:?}"
                )));
            }
        }

        let mut total = C::zero();
        for count in self.pair_counts.values() {
            total += *count;
        }
        let mut expected = C::zero();
        for (span, &weight) in multiset.iter() {
            if !frozen.contains(span) && span.len() >= 1 {
                expected += C::from_usize(span.len() - 1).unwrap() * weight;
            }
        }
        if total != expected {
            return Err(BytemillError::InvariantViolation(format!(
                "total pair count {total} != expected {expected}"
            )));
        }

        Ok(())
    }
}
