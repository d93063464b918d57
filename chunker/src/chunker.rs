use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use steward_protocol::ChunkId;
use steward_protocol::SessionId;
use steward_transcript::Turn;

/// The unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub session_id: SessionId,
    pub project_path: String,
    pub timestamp: String,
    pub content: String,
    /// Context prefix reserved for a later enrichment stage.
    pub context: Option<String>,
}

/// Splits a turn's combined text into one or more overlapping chunks.
///
/// Splitting is deterministic: the same turn text always produces the same
/// slices and the same identifiers in the same order.
pub struct TurnChunker {
    config: ChunkerConfig,
}

impl TurnChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }

    /// Chunk one turn.
    ///
    /// A turn that fits in `max_chunk_chars` keeps the turn id as its chunk
    /// id; longer turns get `{turn_id}:{index}` ids in emission order.
    pub fn chunk_turn(&self, turn: &Turn) -> Vec<Chunk> {
        let text = turn.combined_text();
        let ranges = self.split_ranges(&text);
        debug!("turn {} -> {} chunks", turn.id, ranges.len());

        let single = ranges.len() == 1;
        ranges
            .iter()
            .enumerate()
            .map(|(index, &(start, end))| Chunk {
                id: if single {
                    ChunkId::for_turn(&turn.id)
                } else {
                    ChunkId::for_slice(&turn.id, index)
                },
                session_id: turn.session_id.clone(),
                project_path: turn.project_path.clone(),
                timestamp: turn.timestamp.clone(),
                content: text[start..end].to_string(),
                context: None,
            })
            .collect()
    }

    /// Compute the byte ranges of the chunks of `text`.
    ///
    /// Each window ends at the last paragraph break in its second half,
    /// failing that the last word break in its second half, failing that a
    /// hard cut at `max_chunk_chars`. The next window starts `overlap_chars`
    /// before the previous split, so a hard cut advances by exactly one
    /// stride and every character lands in at least one chunk either way.
    pub fn split_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        let max = self.config.max_chunk_chars;
        let overlap = self.config.overlap_chars();
        let len = text.len();

        if len <= max {
            return vec![(0, len)];
        }

        let mut ranges = Vec::new();
        let mut start = 0;
        loop {
            if len - start <= max {
                ranges.push((start, len));
                break;
            }
            let target = floor_char_boundary(text, start + max);
            let split = find_split_point(text, start, target);
            ranges.push((start, split.min(len)));
            start = floor_char_boundary(text, split - overlap.min(split));
        }
        ranges
    }
}

/// Pick the split position for the window `text[start..target]`.
///
/// The second-half guard stops a lone early newline from collapsing the
/// chunk to a fraction of the window.
fn find_split_point(text: &str, start: usize, target: usize) -> usize {
    let window = &text[start..target];
    let half = window.len() / 2;

    if let Some(q) = window.rfind("\n\n")
        && q > half
    {
        return start + q + 2;
    }
    if let Some(q) = window.rfind(' ')
        && q > half
    {
        return start + q + 1;
    }
    target
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
