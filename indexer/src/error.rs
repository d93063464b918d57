use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("chunker error: {0}")]
    Chunker(#[from] steward_chunker::ChunkerError),

    #[error("embedding error: {0}")]
    Embedding(#[from] steward_embeddings::EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] steward_vector_store::VectorStoreError),

    #[error("transcript error: {0}")]
    Transcript(#[from] steward_transcript::TranscriptError),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
