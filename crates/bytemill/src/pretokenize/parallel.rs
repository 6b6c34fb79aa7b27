//! # Parallel Corpus Counting
//!
//! Fans chunk byte ranges out to a bounded worker pool. Workers each open
//! the input file themselves (no shared handles), count their range, and the
//! per-range maps reduce by key-wise addition.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use rayon::prelude::*;

use crate::errors::{BmResult, BytemillError};
use crate::pretokenize::chunk_boundaries::find_chunk_boundaries;
use crate::pretokenize::pattern::PreTokenizer;
use crate::pretokenize::span_counter::PreTokenCounter;
use crate::pretokenize::special_split::SpecialSplitter;
use crate::types::{CommonHashMap, CountType};

/// The default worker count: `min(8, available cores)`.
pub fn default_worker_count() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores.min(8)
}

/// Count pre-tokens across a file with a bounded worker pool.
///
/// ## Arguments
/// * `path` - the input file.
/// * `specials` - declared special tokens; occurrences count atomically.
/// * `delimiter` - the chunk split delimiter byte string.
/// * `num_workers` - worker pool size; must be positive.
///
/// ## Returns
/// The corpus-wide pre-token byte string to frequency map.
pub fn count_file_pretokens<C, S>(
    path: &Path,
    specials: &[S],
    delimiter: &[u8],
    num_workers: usize,
) -> BmResult<CommonHashMap<Vec<u8>, C>>
where
    C: CountType,
    S: AsRef<str> + Sync,
{
    let boundaries = find_chunk_boundaries(path, num_workers, delimiter)?;
    let ranges: Vec<(u64, u64)> = boundaries
        .windows(2)
        .map(|w| (w[0], w[1]))
        .filter(|(start, end)| end > start)
        .collect();

    let pretokenizer = PreTokenizer::new();
    let splitter = SpecialSplitter::new(specials)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .build()
        .map_err(|e| BytemillError::WorkerPool(e.to_string()))?;

    let counter = pool.install(|| {
        ranges
            .into_par_iter()
            .map(|(start, end)| {
                count_range::<C>(&pretokenizer, &splitter, path, start, end)
            })
            .try_reduce(
                || PreTokenCounter::new(pretokenizer.clone(), splitter.clone()),
                |mut acc, other| {
                    acc.merge(other);
                    Ok(acc)
                },
            )
    })?;

    Ok(counter.release())
}

/// Count one byte range of the file.
///
/// Each call opens, seeks, reads, and closes the file independently.
fn count_range<C: CountType>(
    pretokenizer: &PreTokenizer,
    splitter: &SpecialSplitter,
    path: &Path,
    start: u64,
    end: u64,
) -> BmResult<PreTokenCounter<C>> {
    let mut file = File::open(path).map_err(|e| BytemillError::io(path, e))?;
    file.seek(SeekFrom::Start(start))
        .map_err(|e| BytemillError::io(path, e))?;

    let mut chunk = Vec::with_capacity((end - start) as usize);
    file.take(end - start)
        .read_to_end(&mut chunk)
        .map_err(|e| BytemillError::io(path, e))?;

    let mut counter = PreTokenCounter::new(pretokenizer.clone(), splitter.clone());
    counter.update_from_bytes(&chunk)?;
    Ok(counter)
}
