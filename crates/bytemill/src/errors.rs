//! # Error Types

use std::path::PathBuf;

/// Errors from bytemill operations.
#[derive(Debug, thiserror::Error)]
pub enum BytemillError {
    /// Vocab size is below the floor of 256 byte tokens plus the special tokens.
    #[error("vocab size ({size}) must be >= {floor} (256 byte tokens + {specials} special tokens)")]
    VocabSizeTooSmall {
        /// The requested vocab size.
        size: usize,
        /// The minimum legal vocab size.
        floor: usize,
        /// The number of declared special tokens.
        specials: usize,
    },

    /// A declared special token is the empty string.
    #[error("special tokens must be non-empty")]
    EmptySpecialToken,

    /// The same special token was declared twice.
    #[error("duplicate special token: {token:?}")]
    DuplicateSpecialToken {
        /// The repeated token.
        token: String,
    },

    /// Vocab size exceeds the capacity of the token ID type.
    #[error("vocab size ({size}) exceeds token type capacity")]
    VocabSizeOverflow {
        /// The vocab size that exceeded the capacity.
        size: usize,
    },

    /// Worker count must be strictly positive.
    #[error("worker count must be positive, got {count}")]
    InvalidWorkerCount {
        /// The requested worker count.
        count: usize,
    },

    /// I/O failure, tagged with the offending path.
    #[error("i/o error on {path:?}: {source}")]
    Io {
        /// The path of the file that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Vocabulary data on disk has an unrecognised shape.
    #[error("malformed vocab: {0}")]
    VocabFormat(String),

    /// A token ID with no vocabulary entry.
    #[error("token {token} out of vocabulary range")]
    TokenOutOfRange {
        /// The offending token ID, widened for display.
        token: u64,
    },

    /// A symbol with no vocabulary ID; the merges and vocab disagree.
    #[error("symbol {0:?} has no vocabulary entry")]
    SymbolNotInVocab(String),

    /// Pair index drift. This is a bug in the merge engine, not an input problem.
    #[error("internal invariant violation: {0}")]
    InvariantViolation(String),

    /// Error from the regex engine while scanning a chunk.
    #[error("pre-token scan failed: {0}")]
    Scan(String),

    /// A regex pattern failed to build.
    #[error("pattern compilation failed: {0}")]
    Pattern(String),

    /// The worker pool failed to start.
    #[error("worker pool: {0}")]
    WorkerPool(String),
}

impl BytemillError {
    /// Tag an [`std::io::Error`] with the path it occurred on.
    pub fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for bytemill operations.
pub type BmResult<T> = core::result::Result<T, BytemillError>;
