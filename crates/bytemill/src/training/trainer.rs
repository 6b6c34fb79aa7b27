//! # BPE Trainer
//!
//! The file-to-vocabulary training entry: chunk the input, count pre-tokens
//! on a bounded worker pool, then run the merge engine on the driver.

use std::path::Path;

use crate::errors::{BmResult, BytemillError};
use crate::pretokenize::{count_file_pretokens, default_worker_count};
use crate::training::merge_engine::{MergeEngine, TrainOutput};
use crate::training::pair_index::PreTokenMultiset;
use crate::training::symbol_span::SymbolSpan;
use crate::types::{CommonHashSet, CountType, TokenType};

/// The default chunk split delimiter.
pub const DEFAULT_SPLIT_DELIMITER: &[u8] = b"<|endoftext|>";

/// Options for [`BpeTrainer`].
#[derive(Debug, Clone)]
pub struct BpeTrainerOptions {
    /// The target vocabulary size, including byte and special tokens.
    pub vocab_size: usize,

    /// Special tokens kept atomic, in declaration order.
    pub special_tokens: Vec<String>,

    /// Pre-tokenization worker pool size.
    pub num_workers: usize,
}

impl BpeTrainerOptions {
    /// Create new options.
    ///
    /// ## Arguments
    /// * `vocab_size` - the target vocabulary size.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            special_tokens: Vec::new(),
            num_workers: default_worker_count(),
        }
    }

    /// Sets the special tokens.
    pub fn with_special_tokens<I>(
        self,
        special_tokens: I,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            special_tokens: special_tokens.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Sets the worker pool size.
    pub fn with_num_workers(
        self,
        num_workers: usize,
    ) -> Self {
        Self {
            num_workers,
            ..self
        }
    }

    /// Check the options before any work happens.
    ///
    /// The vocab-size floor is re-checked by the merge engine; worker count
    /// and special-token validity only exist here.
    pub fn validate(&self) -> BmResult<()> {
        if self.num_workers == 0 {
            return Err(BytemillError::InvalidWorkerCount {
                count: self.num_workers,
            });
        }

        let mut seen = CommonHashSet::new();
        for special in &self.special_tokens {
            if special.is_empty() {
                return Err(BytemillError::EmptySpecialToken);
            }
            if !seen.insert(special.as_str()) {
                return Err(BytemillError::DuplicateSpecialToken {
                    token: special.clone(),
                });
            }
        }

        let floor = 256 + self.special_tokens.len();
        if self.vocab_size < floor {
            return Err(BytemillError::VocabSizeTooSmall {
                size: self.vocab_size,
                floor,
                specials: self.special_tokens.len(),
            });
        }

        Ok(())
    }

    /// Initializes a [`BpeTrainer`] from these options.
    pub fn init<C: CountType>(self) -> BpeTrainer<C> {
        BpeTrainer::new(self)
    }
}

/// Trainer for learning byte-level BPE vocabularies from corpus files.
///
/// ## Parameters
/// * `C` - the type used for pre-token weights.
pub struct BpeTrainer<C: CountType = u64> {
    /// Trainer options.
    pub options: BpeTrainerOptions,

    _count: core::marker::PhantomData<C>,
}

impl<C: CountType> BpeTrainer<C> {
    /// Initializes a [`BpeTrainer`].
    pub fn new(options: BpeTrainerOptions) -> Self {
        Self {
            options,
            _count: core::marker::PhantomData,
        }
    }

    /// Train from a corpus file.
    ///
    /// ## Arguments
    /// * `path` - the corpus file path.
    ///
    /// ## Returns
    /// The trained vocabulary and ordered merge list.
    pub fn train_file<T: TokenType>(
        &self,
        path: &Path,
    ) -> BmResult<TrainOutput<T>> {
        self.options.validate()?;

        let specials: Vec<Vec<u8>> = self
            .options
            .special_tokens
            .iter()
            .map(|s| s.as_bytes().to_vec())
            .collect();

        // The first declared special doubles as the chunk split delimiter;
        // boundary placement affects parallel granularity only.
        let delimiter: &[u8] = specials
            .first()
            .map(Vec::as_slice)
            .unwrap_or(DEFAULT_SPLIT_DELIMITER);

        log::info!(
            "Pre-tokenizing {:?} with {} workers",
            path,
            self.options.num_workers
        );
        let counts = count_file_pretokens::<C, String>(
            path,
            &self.options.special_tokens,
            delimiter,
            self.options.num_workers,
        )?;
        log::info!("Counted {} distinct pre-tokens", counts.len());

        let multiset: PreTokenMultiset<C> = counts
            .into_iter()
            .map(|(bytes, count)| (SymbolSpan::from_bytes(bytes), count))
            .collect();

        MergeEngine::new(multiset, &specials, self.options.vocab_size)?.run()
    }
}
