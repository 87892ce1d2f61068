//! Chunk stream primitives.
//!
//! Everything here is session-scoped and does no directory traversal; the
//! `encode` and `decode` modules build the full workflows on top.

pub mod chunk_reader;
pub mod chunk_writer;
pub mod config;
pub mod error;
pub mod header;
pub mod layout;

pub use chunk_reader::ChunkReader;
pub use chunk_writer::{ChunkWriter, WriterSummary};
pub use config::ChunkConfig;
pub use error::{Aborted, Error, Result};
pub use header::{decode_header, encode_header, read_header, write_header, FilePosition, Header};
