//! # Chunk Boundary Finder
//!
//! Splits an input file into byte ranges aligned on a delimiter byte string,
//! so pre-tokenization can run in parallel without severing a pre-token or
//! the delimiter itself.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::errors::{BmResult, BytemillError};

/// Probe read size when scanning forward for the delimiter.
const PROBE_SIZE: usize = 4096;

/// Find delimiter-aligned chunk boundaries for a file.
///
/// Returns a sorted, deduplicated offset sequence starting at `0` and ending
/// at the file size. Every interior boundary sits at the first byte of a
/// delimiter occurrence at-or-after its even split guess; a probe that
/// reaches the end of the file without seeing the delimiter clamps to the
/// file size. Duplicate boundaries collapse, so fewer than `target_chunks`
/// ranges may result.
///
/// ## Arguments
/// * `path` - the input file.
/// * `target_chunks` - the desired chunk count; must be positive.
/// * `delimiter` - the non-empty delimiter byte string.
pub fn find_chunk_boundaries(
    path: &Path,
    target_chunks: usize,
    delimiter: &[u8],
) -> BmResult<Vec<u64>> {
    debug_assert!(target_chunks > 0);
    debug_assert!(!delimiter.is_empty());

    let mut file = File::open(path).map_err(|e| BytemillError::io(path, e))?;
    let file_size = file
        .metadata()
        .map_err(|e| BytemillError::io(path, e))?
        .len();

    if file_size == 0 {
        return Ok(vec![0, 0]);
    }

    let chunk_size = file_size / target_chunks as u64;
    let mut boundaries: Vec<u64> = (0..=target_chunks as u64).map(|i| i * chunk_size).collect();
    *boundaries.last_mut().unwrap() = file_size;

    // Overlap successive probes by the delimiter length so an occurrence
    // straddling a probe edge is still seen.
    let step = PROBE_SIZE.saturating_sub(delimiter.len() - 1).max(1);
    let mut probe = vec![0u8; PROBE_SIZE];

    for boundary in boundaries[1..target_chunks].iter_mut() {
        let mut position = *boundary;
        loop {
            file.seek(SeekFrom::Start(position))
                .map_err(|e| BytemillError::io(path, e))?;
            let read = read_up_to(&mut file, &mut probe).map_err(|e| BytemillError::io(path, e))?;
            if read == 0 {
                *boundary = file_size;
                break;
            }
            if let Some(found) = find_subslice(&probe[..read], delimiter) {
                *boundary = position + found as u64;
                break;
            }
            position += step as u64;
        }
    }

    boundaries.sort_unstable();
    boundaries.dedup();
    Ok(boundaries)
}

/// Fill as much of `buf` as the file has left, tolerating short reads.
fn read_up_to(
    file: &mut File,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Index of the first occurrence of `needle` in `haystack`.
fn find_subslice(
    haystack: &[u8],
    needle: &[u8],
) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
