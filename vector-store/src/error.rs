use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("vector store returned {status}: {preview}")]
    Backend { status: u16, preview: String },

    #[error("unexpected vector store response: {0}")]
    Protocol(String),

    #[error("upsert rejected: {0}")]
    UpsertRejected(String),
}

impl From<reqwest::Error> for VectorStoreError {
    fn from(err: reqwest::Error) -> Self {
        VectorStoreError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VectorStoreError>;
