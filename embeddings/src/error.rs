use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("embedding backend returned {status}: {preview}")]
    Backend { status: u16, preview: String },

    #[error("unexpected embedding response: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;
