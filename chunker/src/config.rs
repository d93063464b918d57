use serde::{Deserialize, Serialize};

/// Configuration for turn chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Hard upper bound on chunk size in characters.
    ///
    /// Tuned for a worst case of ~3 tokens per character on rare multi-byte
    /// content, leaving headroom in an 8192-token embedding context.
    pub max_chunk_chars: usize,

    /// Fraction of `max_chunk_chars` shared between adjacent chunks.
    pub overlap_ratio: f64,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 2500,
            overlap_ratio: 0.10,
        }
    }
}

impl ChunkerConfig {
    /// Characters shared between adjacent chunks.
    pub fn overlap_chars(&self) -> usize {
        (self.max_chunk_chars as f64 * self.overlap_ratio) as usize
    }

    /// Window advance between adjacent chunks.
    pub fn stride(&self) -> usize {
        self.max_chunk_chars - self.overlap_chars()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_chars == 0 {
            return Err("max_chunk_chars must be greater than 0".into());
        }
        // Above 0.5 the overlap can swallow the guaranteed forward progress
        // of a boundary split.
        if !(0.0..0.5).contains(&self.overlap_ratio) {
            return Err("overlap_ratio must be in [0, 0.5)".into());
        }
        Ok(())
    }
}
