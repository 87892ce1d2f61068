use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("duplicate file name in session: {0}")]
    DuplicateName(String),
    #[error("session already closed")]
    SessionClosed,
    #[error("invalid chunk capacity: {0}")]
    InvalidCapacity(u64),
    #[error("file name is not valid utf-8: {}", .0.display())]
    UnsupportedName(PathBuf),
    #[error("read failed ({context}): {source}")]
    SourceRead {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("write failed ({context}): {source}")]
    SinkWrite {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("header file missing: {}", .0.display())]
    HeaderMissing(PathBuf),
    #[error("header serialization failed: {0}")]
    HeaderEncode(#[source] serde_json::Error),
    #[error("corrupt header: {0}")]
    HeaderCorrupt(String),
    #[error("chunk {index} missing: {}", .path.display())]
    ChunkMissing { index: u64, path: PathBuf },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn source_read(context: impl fmt::Display, source: io::Error) -> Self {
        Error::SourceRead {
            context: context.to_string(),
            source,
        }
    }

    pub(crate) fn sink_write(context: impl fmt::Display, source: io::Error) -> Self {
        Error::SinkWrite {
            context: context.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A session error together with the work completed before it happened.
#[derive(Debug)]
pub struct Aborted<R> {
    pub error: Error,
    pub progress: R,
}

impl<R> Aborted<R> {
    pub fn new(error: Error, progress: R) -> Self {
        Self { error, progress }
    }
}

impl<R: fmt::Debug> fmt::Display for Aborted<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl<R: fmt::Debug> std::error::Error for Aborted<R> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
