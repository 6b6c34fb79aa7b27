//! # Tokenizer
//!
//! Applies a trained vocabulary and merge list to text. Encoding splits on
//! special tokens (longest-match-first), pre-tokenizes the runs between
//! them, and replays recorded merges per pre-token; decoding concatenates
//! vocabulary bytes and decodes UTF-8 with replacement.
//!
//! The replay rule is deliberately different from training: training picks
//! by weighted count, encoding picks by merge index. Within one scan the
//! lowest-index merge wins, and that merge applies at its leftmost
//! occurrence before the scan restarts.

use std::path::Path;

use crate::errors::{BmResult, BytemillError};
use crate::pretokenize::{PreTokenizer, Segment, SpecialSplitter};
use crate::symbol::{Symbol, SymbolPair};
use crate::types::{CommonHashMap, TokenType};
use crate::vocab::io::{load_merges, load_vocab_json};
use crate::vocab::Vocabulary;

/// A trained BPE tokenizer.
///
/// Encoding is a pure function of the vocabulary, merges, special tokens,
/// and input text.
pub struct Tokenizer<T: TokenType> {
    vocab: Vocabulary<T>,
    merges: Vec<SymbolPair>,

    /// Pair to merge index; first occurrence wins for repeated pairs.
    merge_ranks: CommonHashMap<SymbolPair, usize>,

    /// Special token bytes to atomic ID.
    special_ids: CommonHashMap<Vec<u8>, T>,

    splitter: SpecialSplitter,
    pretokenizer: PreTokenizer,
}

impl<T: TokenType> Tokenizer<T> {
    /// Build a tokenizer.
    ///
    /// Special tokens missing from the vocabulary are appended at the next
    /// free IDs.
    ///
    /// ## Arguments
    /// * `vocab` - the trained vocabulary.
    /// * `merges` - the recorded merges, in creation order.
    /// * `special_tokens` - special tokens to keep atomic while encoding.
    pub fn new<S: AsRef<str>>(
        mut vocab: Vocabulary<T>,
        merges: Vec<SymbolPair>,
        special_tokens: &[S],
    ) -> BmResult<Self> {
        let mut special_ids = CommonHashMap::with_capacity(special_tokens.len());
        for special in special_tokens {
            let symbol = Symbol::from_bytes(special.as_ref().as_bytes());
            let id = match vocab.token_for(&symbol) {
                Some(id) => id,
                None => vocab.push(symbol.clone())?,
            };
            special_ids.insert(symbol.as_bytes().to_vec(), id);
        }

        let mut merge_ranks = CommonHashMap::with_capacity(merges.len());
        for (rank, pair) in merges.iter().enumerate() {
            merge_ranks.entry(pair.clone()).or_insert(rank);
        }

        Ok(Self {
            vocab,
            merges,
            merge_ranks,
            special_ids,
            splitter: SpecialSplitter::new(special_tokens)?,
            pretokenizer: PreTokenizer::new(),
        })
    }

    /// Build a tokenizer from GPT-2 format `vocab.json` and `merges.txt`
    /// files.
    pub fn from_files<S: AsRef<str>>(
        vocab_path: &Path,
        merges_path: &Path,
        special_tokens: &[S],
    ) -> BmResult<Self> {
        let vocab = load_vocab_json(vocab_path)?;
        let merges = load_merges(merges_path)?;
        Self::new(vocab, merges, special_tokens)
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &Vocabulary<T> {
        &self.vocab
    }

    /// The recorded merges, in creation order.
    pub fn merges(&self) -> &[SymbolPair] {
        &self.merges
    }

    /// Encode text to token IDs.
    pub fn encode(
        &self,
        text: &str,
    ) -> BmResult<Vec<T>> {
        let mut tokens = Vec::new();
        self.encode_append(text, &mut tokens)?;
        Ok(tokens)
    }

    /// Encode a stream of text chunks into one token stream.
    pub fn encode_all<I>(
        &self,
        texts: I,
    ) -> BmResult<Vec<T>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut tokens = Vec::new();
        for text in texts {
            self.encode_append(text.as_ref(), &mut tokens)?;
        }
        Ok(tokens)
    }

    /// Decode token IDs to text, replacing invalid UTF-8 sequences.
    pub fn decode(
        &self,
        tokens: &[T],
    ) -> BmResult<String> {
        let mut bytes = Vec::new();
        for &token in tokens {
            let symbol = self.vocab.symbol_for(token).ok_or_else(|| {
                BytemillError::TokenOutOfRange {
                    token: token.to_u64().unwrap_or(u64::MAX),
                }
            })?;
            bytes.extend_from_slice(symbol.as_bytes());
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn encode_append(
        &self,
        text: &str,
        tokens: &mut Vec<T>,
    ) -> BmResult<()> {
        for segment in self.splitter.segments(text) {
            match segment {
                Segment::Special(special) => {
                    // Splitter matches are exactly the declared specials.
                    let id = self.special_ids[special.as_bytes()];
                    tokens.push(id);
                }
                Segment::Ordinary(run) => {
                    for pre_token in self.pretokenizer.split(run)? {
                        self.encode_pre_token(pre_token.as_bytes(), tokens)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Replay recorded merges over one pre-token and emit its IDs.
    fn encode_pre_token(
        &self,
        pre_token: &[u8],
        tokens: &mut Vec<T>,
    ) -> BmResult<()> {
        let mut symbols: Vec<Symbol> =
            pre_token.iter().map(|&b| Symbol::from_byte(b)).collect();

        // Repeatedly apply the lowest-index merge present, at its leftmost
        // occurrence, until no recorded merge matches an adjacency.
        loop {
            let mut best: Option<(usize, usize)> = None;
            for i in 0..symbols.len().saturating_sub(1) {
                let pair = (symbols[i].clone(), symbols[i + 1].clone());
                if let Some(&rank) = self.merge_ranks.get(&pair) {
                    // Strict comparison keeps the leftmost site per rank.
                    if best.is_none_or(|(best_rank, _)| rank < best_rank) {
                        best = Some((rank, i));
                    }
                }
            }

            let Some((rank, at)) = best else {
                break;
            };

            let (left, right) = &self.merges[rank];
            symbols[at] = left.concat(right);
            symbols.remove(at + 1);
        }

        for symbol in symbols {
            let id = self.vocab.token_for(&symbol).ok_or_else(|| {
                BytemillError::SymbolNotInVocab(
                    String::from_utf8_lossy(symbol.as_bytes()).into_owned(),
                )
            })?;
            tokens.push(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(text: &str) -> Symbol {
        Symbol::from_bytes(text.as_bytes())
    }

    /// The merges a trainer learns from "aaabdaaabac" at vocab size 259.
    fn aaab_tokenizer() -> Tokenizer<u32> {
        let mut vocab: Vocabulary<u32> = Vocabulary::single_bytes();
        vocab.push(sym("aa")).unwrap();
        vocab.push(sym("aaa")).unwrap();
        vocab.push(sym("aaab")).unwrap();

        let merges = vec![
            (sym("a"), sym("a")),
            (sym("aa"), sym("a")),
            (sym("aaa"), sym("b")),
        ];

        Tokenizer::new(vocab, merges, &[] as &[&str]).unwrap()
    }

    #[test]
    fn test_encode_reuses_trained_merges() {
        let tokenizer = aaab_tokenizer();

        let tokens = tokenizer.encode("aaabac").unwrap();
        assert_eq!(tokens, vec![258, 97, 99]);

        assert_eq!(tokenizer.decode(&tokens).unwrap(), "aaabac");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let tokenizer = aaab_tokenizer();
        let a = tokenizer.encode("aaab aa baaab").unwrap();
        let b = tokenizer.encode("aaab aa baaab").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lowest_rank_merge_wins() {
        // Rank order decides: (b,c) is recorded before (a,b), so "abc"
        // resolves b to the (b,c) merge first.
        let mut vocab: Vocabulary<u32> = Vocabulary::single_bytes();
        vocab.push(sym("bc")).unwrap();
        vocab.push(sym("ab")).unwrap();

        let merges = vec![(sym("b"), sym("c")), (sym("a"), sym("b"))];
        let tokenizer: Tokenizer<u32> =
            Tokenizer::new(vocab, merges, &[] as &[&str]).unwrap();

        let tokens = tokenizer.encode("abc").unwrap();
        assert_eq!(tokens, vec![97, 256]); // a, bc
    }

    #[test]
    fn test_special_tokens_atomic() {
        let mut vocab: Vocabulary<u32> = Vocabulary::single_bytes();
        vocab.push(sym("<|endoftext|>")).unwrap();
        vocab.push(sym("hi")).unwrap();

        let merges = vec![(sym("h"), sym("i"))];
        let tokenizer: Tokenizer<u32> =
            Tokenizer::new(vocab, merges, &["<|endoftext|>"]).unwrap();

        let tokens = tokenizer.encode("hi<|endoftext|>hi").unwrap();
        assert_eq!(tokens, vec![257, 256, 257]);

        assert_eq!(
            tokenizer.decode(&tokens).unwrap(),
            "hi<|endoftext|>hi"
        );
    }

    #[test]
    fn test_missing_special_appended() {
        let vocab: Vocabulary<u32> = Vocabulary::single_bytes();
        let tokenizer: Tokenizer<u32> =
            Tokenizer::new(vocab, vec![], &["<|pad|>"]).unwrap();

        assert_eq!(tokenizer.encode("<|pad|>").unwrap(), vec![256]);
    }

    #[test]
    fn test_roundtrip_without_merges() {
        let vocab: Vocabulary<u32> = Vocabulary::single_bytes();
        let tokenizer: Tokenizer<u32> =
            Tokenizer::new(vocab, vec![], &[] as &[&str]).unwrap();

        for text in ["", "Hello, world!", "caf\u{00E9} \u{1F643}", "  spaced  out  "] {
            let tokens = tokenizer.encode(text).unwrap();
            assert_eq!(tokens.len(), text.len()); // byte-level
            assert_eq!(tokenizer.decode(&tokens).unwrap(), text);
        }
    }

    #[test]
    fn test_encode_all_concatenates() {
        let tokenizer = aaab_tokenizer();
        let split = tokenizer.encode_all(["aaab", "ac"]).unwrap();
        assert_eq!(split, vec![258, 97, 99]);
    }

    #[test]
    fn test_decode_unknown_token() {
        let tokenizer = aaab_tokenizer();
        let err = tokenizer.decode(&[10_000]).unwrap_err();
        assert!(matches!(err, BytemillError::TokenOutOfRange { token: 10_000 }));
    }
}
