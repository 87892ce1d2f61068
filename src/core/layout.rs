//! Chunk directory layout.
//!
//! A chunk directory holds the numbered chunk files (`chunk-0`, `chunk-1`,
//! ...) and a single `header` file. All functions here are stateless path
//! helpers shared by the writer, the reader and the `inspect` tooling.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::{Header, Result};

/// Prefix of every chunk file name.
pub const CHUNK_PREFIX: &str = "chunk-";

/// Fixed name of the header file inside a chunk directory.
pub const HEADER_FILE: &str = "header";

// ============================================================================
// Chunk Naming
// ============================================================================

/// Generate chunk filename from index (e.g., "chunk-42").
pub fn chunk_filename(index: u64) -> String {
    format!("{CHUNK_PREFIX}{index}")
}

/// Get path to a chunk file.
pub fn chunk_path(root: &Path, index: u64) -> PathBuf {
    root.join(chunk_filename(index))
}

/// Get path to the header file.
pub fn header_path(root: &Path) -> PathBuf {
    root.join(HEADER_FILE)
}

/// Parse a chunk filename.
///
/// Returns the chunk index if valid, None otherwise. Leading zeros are
/// rejected so every index has exactly one spelling.
pub fn parse_chunk_filename(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(CHUNK_PREFIX)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse::<u64>().ok()
}

// ============================================================================
// Chunk Discovery
// ============================================================================

/// Sorted indices of the `chunk-N` files in `dir`; empty if `dir` is absent.
pub fn discover_chunks(dir: &Path) -> Result<Vec<u64>> {
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut chunks = listing
        .filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err)),
            };
            let is_file = match entry.file_type() {
                Ok(file_type) => file_type.is_file(),
                Err(err) => return Some(Err(err)),
            };
            let index = entry.file_name().to_str().and_then(parse_chunk_filename);
            index.filter(|_| is_file).map(Ok)
        })
        .collect::<std::io::Result<Vec<u64>>>()?;
    chunks.sort_unstable();
    Ok(chunks)
}

/// Indices a header's chunk set needs that are not on disk.
pub fn missing_chunks(dir: &Path, header: &Header) -> Result<Vec<u64>> {
    let present = discover_chunks(dir)?;
    let expected = expected_chunks(header.total_bytes, header.capacity);
    Ok((0..expected)
        .filter(|index| present.binary_search(index).is_err())
        .collect())
}

/// Number of chunk files an encode session of `total_bytes` produces.
///
/// An empty stream still leaves `chunk-0` behind.
pub fn expected_chunks(total_bytes: u64, capacity: u64) -> u64 {
    if total_bytes == 0 || capacity == 0 {
        return 1;
    }
    total_bytes.div_ceil(capacity)
}
