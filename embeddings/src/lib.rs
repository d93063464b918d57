//! Text embedding via an HTTP backend.
//!
//! The backend exposes one endpoint: POST `{base}/api/embed` with
//! `{"model", "input"}`, answering `{"embeddings": [[f32, ...]]}`. The
//! client makes one synchronous call per text; the pool multiplexes many
//! calls over a bounded number of in-flight requests.

mod client;
mod error;
mod pool;

pub use client::{EmbedConfig, EmbeddingClient, EmbeddingModel};
pub use error::{EmbeddingError, Result};
pub use pool::{EmbedFailure, EmbeddedChunk, EmbeddingPool};

/// Dimension of the default embedding model.
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Dimension of the larger configurable model.
pub const LARGE_EMBEDDING_DIM: usize = 1024;
