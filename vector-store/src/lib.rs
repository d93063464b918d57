//! HTTP client for the vector store.
//!
//! Three operations against a Qdrant-style REST API: batched point upsert,
//! paginated scroll of the chunk ids already indexed, and nearest-neighbour
//! search over the named dense vector. Point ids are a deterministic hash
//! of the chunk id so re-upserting the same chunk overwrites its point.

mod error;
mod point;
mod sparse;
mod store;

pub use error::{Result, VectorStoreError};
pub use point::{PointPayload, fnv1a_32, point_id, to_point_id};
pub use sparse::{SparseVector, sparse_vector, tokenize};
pub use store::{SearchResult, VectorStore, VectorStoreConfig};
