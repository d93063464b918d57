use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use steward_chunker::ChunkerConfig;
use steward_embeddings::EmbedConfig;
use steward_vector_store::VectorStoreConfig;

/// Configuration for one indexing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Root directory holding transcript files.
    pub transcripts_root: PathBuf,

    /// Restrict indexing to transcripts of one project.
    #[serde(default)]
    pub project: Option<String>,

    /// Plan only; no embedding, no writes.
    #[serde(default)]
    pub dry_run: bool,

    /// Chunks per embed+upsert batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// In-flight embedding requests.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Where to write failed chunks as JSONL, if anywhere.
    #[serde(default)]
    pub errors_file: Option<PathBuf>,

    #[serde(default)]
    pub embed: EmbedConfig,

    #[serde(default)]
    pub store: VectorStoreConfig,

    #[serde(default)]
    pub chunker: ChunkerConfig,
}

fn default_batch_size() -> usize {
    50
}

fn default_workers() -> usize {
    4
}

/// Default transcript location: `~/.claude/projects`.
pub fn default_transcripts_root() -> PathBuf {
    let home = directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".claude").join("projects")
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            transcripts_root: default_transcripts_root(),
            project: None,
            dry_run: false,
            batch_size: default_batch_size(),
            workers: default_workers(),
            errors_file: None,
            embed: EmbedConfig::default(),
            store: VectorStoreConfig::default(),
            chunker: ChunkerConfig::default(),
        }
    }
}

impl IndexerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch size must be greater than 0".into());
        }
        if self.workers == 0 {
            return Err("worker count must be greater than 0".into());
        }
        self.chunker.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_is_valid() {
        let config = IndexerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.workers, 4);
        assert_eq!(config.dry_run, false);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = IndexerConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
