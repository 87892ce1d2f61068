//! Chunk stream writer.
//!
//! Appends the bytes of successive input files to a sequence of fixed
//! capacity chunk files, recording where each file starts in the logical
//! stream.
//!
//! # Design
//!
//! - Owns exactly one open chunk file at a time
//! - Reads each source in bounded pieces that never straddle a chunk boundary
//! - Seals a chunk the moment it holds `capacity` bytes
//! - Opens the next chunk lazily, only when more bytes are about to land
//! - Never rolls back chunk files after a failure
//!
//! # Usage Pattern
//!
//! ```text
//! 1. Create writer with open()    -> chunk-0 exists
//! 2. consume() each input in enumeration order
//! 3. finish() to close the last chunk and collect the positions
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::core::header::{FilePosition, Header};
use crate::core::layout::chunk_path;
use crate::core::{ChunkConfig, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    /// A consume failed midway; the chunk set is no longer coherent.
    Failed,
    Finished,
}

/// Result of a finished encode session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterSummary {
    pub capacity: u64,
    pub total_bytes: u64,
    pub positions: Vec<FilePosition>,
    pub chunks: u64,
}

impl WriterSummary {
    pub fn into_header(self) -> Header {
        Header::new(self.capacity, self.total_bytes, self.positions)
    }
}

pub struct ChunkWriter {
    /// Directory receiving chunk files
    dir: PathBuf,
    /// Chunk capacity in bytes
    capacity: u64,
    /// Scratch buffer for bounded reads
    buffer: Vec<u8>,
    /// Index of the most recently created chunk
    chunk_index: u64,
    /// Bytes written into that chunk
    chunk_filled: u64,
    /// Open chunk file (None once the current chunk is sealed)
    chunk: Option<File>,
    /// Number of chunk files created
    chunks_written: u64,
    /// Logical stream offset
    offset: u64,
    positions: Vec<FilePosition>,
    names: HashSet<String>,
    state: SessionState,
}

impl ChunkWriter {
    /// Start a session in `dir`, creating `chunk-0`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCapacity`: capacity is zero
    /// - `Error::SinkWrite`: chunk-0 could not be created
    pub fn open(dir: impl Into<PathBuf>, config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        let dir = dir.into();
        let path = chunk_path(&dir, 0);
        let file = File::create(&path).map_err(|err| Error::sink_write(path.display(), err))?;
        debug!("opened chunk 0 at {}", path.display());

        Ok(Self {
            dir,
            capacity: config.capacity,
            buffer: vec![0u8; config.read_buffer_len()],
            chunk_index: 0,
            chunk_filled: 0,
            chunk: Some(file),
            chunks_written: 1,
            offset: 0,
            positions: Vec::new(),
            names: HashSet::new(),
            state: SessionState::Open,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Index of the most recently created chunk.
    pub fn chunk_index(&self) -> u64 {
        self.chunk_index
    }

    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// Current logical stream offset (bytes consumed so far).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn positions(&self) -> &[FilePosition] {
        &self.positions
    }

    /// Append one input file to the stream.
    ///
    /// Returns the number of bytes consumed from `source`.
    ///
    /// # Errors
    ///
    /// - `Error::SessionClosed`: called after `finish()` or after a failed consume
    /// - `Error::DuplicateName`: `name` was already consumed in this session
    /// - `Error::SourceRead`: `source` failed; the session becomes unusable
    /// - `Error::SinkWrite`: a chunk could not be written; the session becomes unusable
    pub fn consume<R: Read + ?Sized>(&mut self, name: &str, source: &mut R) -> Result<u64> {
        if self.state != SessionState::Open {
            return Err(Error::SessionClosed);
        }
        if !self.names.insert(name.to_string()) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        self.positions.push(FilePosition::new(name, self.offset));

        let start = self.offset;
        if let Err(err) = self.stream_from(name, source) {
            self.state = SessionState::Failed;
            return Err(err);
        }
        Ok(self.offset - start)
    }

    fn stream_from<R: Read + ?Sized>(&mut self, name: &str, source: &mut R) -> Result<()> {
        loop {
            // A sealed chunk means the next write starts a fresh one.
            let room = if self.chunk.is_some() {
                self.capacity - self.chunk_filled
            } else {
                self.capacity
            };
            let want = room.min(self.buffer.len() as u64) as usize;

            let read = match source.read(&mut self.buffer[..want]) {
                Ok(0) => return Ok(()),
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::source_read(name, err)),
            };

            let mut file = match self.chunk.take() {
                Some(file) => file,
                None => self.open_next_chunk()?,
            };
            if let Err(err) = file.write_all(&self.buffer[..read]) {
                let path = chunk_path(&self.dir, self.chunk_index);
                return Err(Error::sink_write(path.display(), err));
            }
            self.chunk_filled += read as u64;
            self.offset += read as u64;

            if self.chunk_filled == self.capacity {
                self.seal(file)?;
            } else {
                self.chunk = Some(file);
            }
        }
    }

    fn open_next_chunk(&mut self) -> Result<File> {
        let index = self.chunk_index + 1;
        let path = chunk_path(&self.dir, index);
        let file = File::create(&path).map_err(|err| Error::sink_write(path.display(), err))?;
        self.chunk_index = index;
        self.chunk_filled = 0;
        self.chunks_written += 1;
        debug!("opened chunk {} at {}", index, path.display());
        Ok(file)
    }

    fn seal(&mut self, file: File) -> Result<()> {
        file.sync_data().map_err(|err| {
            let path = chunk_path(&self.dir, self.chunk_index);
            Error::sink_write(path.display(), err)
        })?;
        info!(
            "filled chunk {} ({} bytes)",
            self.chunk_index, self.chunk_filled
        );
        Ok(())
    }

    /// Close the last open chunk and end the session.
    ///
    /// Also valid after a failed consume, in which case the returned summary
    /// describes a partial chunk set that must not be committed.
    ///
    /// # Errors
    ///
    /// - `Error::SessionClosed`: already finished
    /// - `Error::SinkWrite`: the last chunk could not be flushed
    pub fn finish(&mut self) -> Result<WriterSummary> {
        if self.state == SessionState::Finished {
            return Err(Error::SessionClosed);
        }
        self.state = SessionState::Finished;
        if let Some(file) = self.chunk.take() {
            self.seal(file)?;
        }
        Ok(WriterSummary {
            capacity: self.capacity,
            total_bytes: self.offset,
            positions: std::mem::take(&mut self.positions),
            chunks: self.chunks_written,
        })
    }
}
