use crate::error::{EmbeddingError, Result};
use crate::{DEFAULT_EMBEDDING_DIM, LARGE_EMBEDDING_DIM};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// How much of an unexpected response body survives into an error message.
const BODY_PREVIEW_CHARS: usize = 200;

/// Supported embedding models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingModel {
    /// 768-dimension default.
    #[default]
    NomicEmbedText,
    /// 1024-dimension variant for higher recall.
    MxbaiEmbedLarge,
}

impl EmbeddingModel {
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::NomicEmbedText => "nomic-embed-text",
            Self::MxbaiEmbedLarge => "mxbai-embed-large",
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Self::NomicEmbedText => DEFAULT_EMBEDDING_DIM,
            Self::MxbaiEmbedLarge => LARGE_EMBEDDING_DIM,
        }
    }
}

/// Configuration for the embedding backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Base URL of the backend.
    pub base_url: String,

    /// Model to embed with. Indexing and search must agree on this.
    #[serde(default)]
    pub model: EmbeddingModel,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: EmbeddingModel::default(),
        }
    }
}

impl EmbedConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

/// Single-request embedding client.
#[derive(Debug)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    config: EmbedConfig,
}

impl EmbeddingClient {
    pub fn new(config: EmbedConfig) -> Result<Self> {
        config.validate().map_err(EmbeddingError::InvalidConfig)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> EmbeddingModel {
        self.config.model
    }

    /// Embed one text, returning the dense vector.
    ///
    /// Every failure mode (transport, non-2xx, malformed body, empty
    /// embedding list) carries a diagnostic with a truncated body preview.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embed", self.config.base_url);
        let request = EmbedRequest {
            model: self.config.model.model_name(),
            input,
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EmbeddingError::Backend {
                status: status.as_u16(),
                preview: preview(&body),
            });
        }

        let decoded: EmbedResponse = serde_json::from_str(&body).map_err(|err| {
            EmbeddingError::Protocol(format!("{err} in body {:?}", preview(&body)))
        })?;

        let vector = decoded
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbeddingError::Protocol(format!(
                    "empty embeddings array in body {:?}",
                    preview(&body)
                ))
            })?;

        debug!("embedded {} chars -> {} dims", input.len(), vector.len());
        Ok(vector)
    }
}

/// First `BODY_PREVIEW_CHARS` characters of a response body.
fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn model_names_and_dimensions() {
        assert_eq!(EmbeddingModel::NomicEmbedText.model_name(), "nomic-embed-text");
        assert_eq!(EmbeddingModel::NomicEmbedText.dimension(), 768);
        assert_eq!(EmbeddingModel::MxbaiEmbedLarge.model_name(), "mxbai-embed-large");
        assert_eq!(EmbeddingModel::MxbaiEmbedLarge.dimension(), 1024);
    }

    #[test]
    fn default_config_points_at_local_backend() {
        let config = EmbedConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, EmbeddingModel::NomicEmbedText);
    }

    #[test]
    fn empty_base_url_is_rejected_at_construction() {
        assert!(EmbedConfig::default().validate().is_ok());

        let config = EmbedConfig {
            base_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let err = EmbeddingClient::new(config).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidConfig(_)), "{err:?}");
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let body = "x".repeat(500);
        assert_eq!(preview(&body).len(), 200);
        assert_eq!(preview("short"), "short");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = EmbeddingClient::new(EmbedConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();
        let err = client.embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    #[ignore = "requires a running embedding backend"]
    async fn embed_round_trip() {
        if std::env::var_os("SKIP_INTEGRATION").is_some() {
            return;
        }
        let client = EmbeddingClient::new(EmbedConfig::default()).unwrap();
        let vector = client.embed("the cat sat on the mat").await.unwrap();
        assert_eq!(vector.len(), DEFAULT_EMBEDDING_DIM);
    }
}
