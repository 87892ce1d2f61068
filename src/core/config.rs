//! Chunking configuration.

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

const MEGABYTE: u64 = 1024 * 1024;

/// Default chunk size in megabytes, sized for common upload limits.
pub const DEFAULT_CHUNK_MB: u64 = 25;

/// Default read buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for an encode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum size of every chunk except the last, in bytes.
    /// Default: 25 MB
    pub capacity: u64,

    /// Upper bound on bytes moved per read call.
    /// Default: 64 KB
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::from_megabytes(DEFAULT_CHUNK_MB)
    }
}

impl ChunkConfig {
    /// Capacity of `mb` × 1024 × 1024 bytes.
    pub fn from_megabytes(mb: u64) -> Self {
        Self::with_capacity(mb.saturating_mul(MEGABYTE))
    }

    /// Byte-granular capacity.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity(self.capacity));
        }
        Ok(())
    }

    pub(crate) fn read_buffer_len(&self) -> usize {
        self.buffer_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_config_default() {
        let config = ChunkConfig::default();
        assert_eq!(config.capacity, 25 * 1024 * 1024);
        assert_eq!(config.buffer_size, 64 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ChunkConfig::with_capacity(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidCapacity(0)));
        let err = ChunkConfig::from_megabytes(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidCapacity(0)));
    }

    #[test]
    fn test_zero_buffer_clamped() {
        let config = ChunkConfig::with_capacity(10).buffer_size(0);
        assert_eq!(config.read_buffer_len(), 1);
    }

    #[test]
    fn test_config_deserialize_without_buffer() {
        let config: ChunkConfig = serde_json::from_str(r#"{"capacity": 4096}"#).unwrap();
        assert_eq!(config.capacity, 4096);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }
}
