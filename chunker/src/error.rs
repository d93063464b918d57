use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ChunkerError>;
