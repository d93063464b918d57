//! Deterministic chunking of conversation turns for embedding.
//!
//! A turn's combined text either fits in one chunk or is split into
//! overlapping slices at paragraph/word boundaries. Chunk identifiers are a
//! pure function of the turn id and the emission index, which is what makes
//! re-indexing idempotent: the same turn always produces the same ids.

mod chunker;
mod config;
mod error;

pub use chunker::{Chunk, TurnChunker};
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
