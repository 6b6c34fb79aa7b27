//! # Vocabulary Training
//!
//! Support for training byte-level BPE vocabularies.
//!
//! Training splits the corpus file into delimiter-aligned chunks, counts
//! pre-tokens on a bounded worker pool, and then runs the single-threaded
//! [`MergeEngine`] to completion. The engine is deterministic: selection is
//! by weighted pair count, with count ties resolved to the lexicographically
//! greatest pair.
//!
//! ```rust,no_run
//! use bytemill::training::BpeTrainerOptions;
//!
//! fn example() -> bytemill::BmResult<()> {
//!     let output = BpeTrainerOptions::new(1000)
//!         .with_special_tokens(["<|endoftext|>"])
//!         .init::<u64>()
//!         .train_file::<u32>(std::path::Path::new("corpus.txt"))?;
//!
//!     println!("learned {} merges", output.merges.len());
//!     Ok(())
//! }
//! ```

mod merge_engine;
mod pair_index;
mod symbol_span;
mod trainer;

#[doc(inline)]
pub use merge_engine::{MergeEngine, MergeJob, TrainOutput};
#[doc(inline)]
pub use pair_index::{LocalPairCounts, PairIndex, PreTokenMultiset};
#[doc(inline)]
pub use symbol_span::SymbolSpan;
#[doc(inline)]
pub use trainer::{BpeTrainer, BpeTrainerOptions, DEFAULT_SPLIT_DELIMITER};
