use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for text chunking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters (hard limit).
    ///
    /// Paragraphs within the limit are emitted whole; oversized paragraphs
    /// are split into consecutive windows of exactly this many characters
    /// (the last window may be shorter).
    pub max_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
        }
    }
}

impl ChunkerConfig {
    /// Create a config with a custom window size
    pub fn with_max_chunk_size(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(ChunkerError::invalid_config("max_chunk_size must be > 0"));
        }
        Ok(())
    }
}
