//! Chunk stream reader.
//!
//! Reads the logical byte stream back out of a chunk directory. The reader
//! knows nothing about file boundaries: callers ask for an exact number of
//! bytes and the reader walks across chunk files in index order to supply
//! them.
//!
//! # Design
//!
//! - Holds exactly one open chunk file, starting at `chunk-0`
//! - Advances to the next chunk only on end-of-file with bytes still owed
//! - Never reads past the requested length

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::core::config::DEFAULT_BUFFER_SIZE;
use crate::core::layout::chunk_path;
use crate::core::{Error, Result};

pub struct ChunkReader {
    /// Directory containing chunk files
    dir: PathBuf,
    /// Scratch buffer for bounded reads
    buffer: Vec<u8>,
    /// Index of the open chunk
    chunk_index: u64,
    /// Open chunk file
    chunk: File,
    /// Number of chunk files opened so far
    chunks_opened: u64,
    /// Logical stream offset
    bytes_read: u64,
}

impl ChunkReader {
    /// Open `chunk-0` in `dir`.
    ///
    /// # Errors
    ///
    /// - `Error::ChunkMissing`: chunk-0 does not exist
    /// - `Error::SourceRead`: chunk-0 exists but could not be opened
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_buffer(dir, DEFAULT_BUFFER_SIZE)
    }

    pub fn open_with_buffer(dir: impl Into<PathBuf>, buffer_size: usize) -> Result<Self> {
        let dir = dir.into();
        let chunk = open_chunk(&dir, 0)?;
        Ok(Self {
            dir,
            buffer: vec![0u8; buffer_size.max(1)],
            chunk_index: 0,
            chunk,
            chunks_opened: 1,
            bytes_read: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Index of the open chunk.
    pub fn chunk_index(&self) -> u64 {
        self.chunk_index
    }

    pub fn chunks_opened(&self) -> u64 {
        self.chunks_opened
    }

    /// Current logical stream offset (bytes extracted so far).
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Copy exactly `length` bytes of the stream into `sink`.
    ///
    /// # Errors
    ///
    /// - `Error::ChunkMissing`: the stream ended before `length` bytes
    /// - `Error::SourceRead`: a chunk could not be read
    /// - `Error::SinkWrite`: `sink` rejected a write
    pub fn extract<W: Write + ?Sized>(&mut self, length: u64, sink: &mut W) -> Result<()> {
        let mut remaining = length;
        while remaining > 0 {
            let want = remaining.min(self.buffer.len() as u64) as usize;
            let read = match self.chunk.read(&mut self.buffer[..want]) {
                Ok(0) => {
                    self.advance()?;
                    continue;
                }
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    let path = chunk_path(&self.dir, self.chunk_index);
                    return Err(Error::source_read(path.display(), err));
                }
            };

            sink.write_all(&self.buffer[..read])
                .map_err(|err| Error::sink_write("output", err))?;
            remaining -= read as u64;
            self.bytes_read += read as u64;
        }
        Ok(())
    }

    /// Close the current chunk and open the next one.
    ///
    /// On failure the drained chunk stays current, so a later call retries
    /// the same index.
    fn advance(&mut self) -> Result<()> {
        let next = open_chunk(&self.dir, self.chunk_index + 1)?;
        info!("drained chunk {}", self.chunk_index);
        self.chunk = next;
        self.chunk_index += 1;
        self.chunks_opened += 1;
        debug!("opened chunk {}", self.chunk_index);
        Ok(())
    }

    /// End the session, returning the number of chunks opened.
    pub fn finish(self) -> u64 {
        info!("drained chunk {}", self.chunk_index);
        self.chunks_opened
    }
}

fn open_chunk(dir: &Path, index: u64) -> Result<File> {
    let path = chunk_path(dir, index);
    match File::open(&path) {
        Ok(file) => Ok(file),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::ChunkMissing { index, path }),
        Err(err) => Err(Error::source_read(path.display(), err)),
    }
}
