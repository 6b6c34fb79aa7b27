#![warn(missing_docs, unused)]
//! # `bytemill` Byte-Level BPE Tokenizer
//!
//! Trains byte-level Byte-Pair-Encoding vocabularies from text corpora and
//! applies them to encode and decode text.
//!
//! ## Client Summary
//!
//! ### Core Client Types
//! * [`TokenType`] - the parameterized integer type used for token IDs;
//!   choose from `{ u16, u32, u64 }`.
//! * [`Vocabulary<T>`] - the dense token-ID to byte-sequence table.
//! * [`Tokenizer<T>`] - the encoder/decoder over a trained vocabulary.
//!
//! ### Training
//! * [`training::BpeTrainerOptions`] - training configuration.
//! * [`training::BpeTrainer`] - the file-to-vocabulary training entry.
//! * [`training::MergeEngine`] - the incremental merge loop itself.
//!
//! Training pre-tokenizes the corpus in parallel over delimiter-aligned
//! chunks, then runs the merge loop single-threaded and deterministically.
//! Selection is by weighted pair count; count ties resolve to the
//! lexicographically greatest pair.
//!
//! ### Persistence
//!
//! [`vocab::io`] reads and writes the GPT-2 text convention: `vocab.json`
//! (printable alias to ID) and `merges.txt` (two aliases per line, in merge
//! creation order).
//!
//! ```rust,no_run
//! use bytemill::{Tokenizer, BmResult};
//!
//! fn example() -> BmResult<Vec<u32>> {
//!     let tokenizer: Tokenizer<u32> = Tokenizer::from_files(
//!         std::path::Path::new("vocab.json"),
//!         std::path::Path::new("merges.txt"),
//!         &["<|endoftext|>"],
//!     )?;
//!     tokenizer.encode("hello world")
//! }
//! ```

pub mod pretokenize;
pub mod tokenizer;
pub mod training;
pub mod vocab;

mod errors;
mod symbol;
mod types;

#[doc(inline)]
pub use errors::*;
#[doc(inline)]
pub use symbol::{Symbol, SymbolPair};
#[doc(inline)]
pub use tokenizer::Tokenizer;
#[doc(inline)]
pub use types::*;
#[doc(inline)]
pub use vocab::Vocabulary;
