use crate::client::{EmbedConfig, EmbeddingClient};
use crate::error::Result;
use log::{debug, warn};
use std::sync::Arc;
use steward_chunker::Chunk;
use tokio::sync::Semaphore;

/// A chunk paired with its dense vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A chunk that failed to embed, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedFailure {
    pub chunk: Chunk,
    pub error: String,
}

enum JobOutcome {
    Embedded(Box<EmbeddedChunk>),
    Failed(Box<EmbedFailure>),
}

/// Bounded-parallel embedding over a finite job list.
///
/// A semaphore caps in-flight requests at the worker count; each job runs
/// independently and a failing job never cancels its peers. The output
/// order is not a contract; callers must not depend on it.
pub struct EmbeddingPool {
    client: Arc<EmbeddingClient>,
    workers: usize,
}

impl EmbeddingPool {
    pub fn new(config: EmbedConfig, workers: usize) -> Result<Self> {
        Ok(Self {
            client: Arc::new(EmbeddingClient::new(config)?),
            workers: workers.max(1),
        })
    }

    /// Embed every chunk, partitioning the results into successes and
    /// failures.
    pub async fn embed_chunks(
        &self,
        chunks: Vec<Chunk>,
    ) -> (Vec<EmbeddedChunk>, Vec<EmbedFailure>) {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let semaphore = semaphore.clone();
            let client = self.client.clone();
            tasks.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquisition only fails
                // if the runtime is tearing down.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return JobOutcome::Failed(Box::new(EmbedFailure {
                            chunk,
                            error: "embedding pool shut down".to_string(),
                        }));
                    }
                };
                match client.embed(&chunk.content).await {
                    Ok(vector) => {
                        JobOutcome::Embedded(Box::new(EmbeddedChunk { chunk, vector }))
                    }
                    Err(err) => JobOutcome::Failed(Box::new(EmbedFailure {
                        chunk,
                        error: err.to_string(),
                    })),
                }
            }));
        }

        let mut embedded = Vec::new();
        let mut failures = Vec::new();
        for task in tasks {
            match task.await {
                Ok(JobOutcome::Embedded(success)) => embedded.push(*success),
                Ok(JobOutcome::Failed(failure)) => failures.push(*failure),
                Err(err) => warn!("embedding task join error: {err}"),
            }
        }

        debug!(
            "embedded {} chunks, {} failures",
            embedded.len(),
            failures.len()
        );
        (embedded, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use steward_protocol::{ChunkId, SessionId};

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: ChunkId::new(id),
            session_id: SessionId::new("s1"),
            project_path: "/work/proj".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            content: content.to_string(),
            context: None,
        }
    }

    #[tokio::test]
    async fn empty_job_list_is_empty_result() {
        let pool = EmbeddingPool::new(EmbedConfig::default(), 4).unwrap();
        let (embedded, failures) = pool.embed_chunks(vec![]).await;
        assert_eq!(embedded, vec![]);
        assert_eq!(failures, vec![]);
    }

    #[tokio::test]
    async fn failures_are_isolated_per_job() {
        // An unreachable backend fails every job independently; none of
        // them aborts the batch.
        let pool = EmbeddingPool::new(
            EmbedConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                ..Default::default()
            },
            2,
        )
        .unwrap();

        let (embedded, failures) = pool
            .embed_chunks(vec![chunk("c1", "one"), chunk("c2", "two"), chunk("c3", "three")])
            .await;

        assert_eq!(embedded, vec![]);
        assert_eq!(failures.len(), 3);
        for failure in &failures {
            assert!(failure.error.contains("transport error"), "{}", failure.error);
        }
    }

    #[tokio::test]
    #[ignore = "requires a running embedding backend"]
    async fn embeds_all_chunks() {
        if std::env::var_os("SKIP_INTEGRATION").is_some() {
            return;
        }
        let pool = EmbeddingPool::new(EmbedConfig::default(), 4).unwrap();
        let jobs: Vec<Chunk> = (0..8)
            .map(|i| chunk(&format!("c{i}"), &format!("sample text {i}")))
            .collect();
        let (embedded, failures) = pool.embed_chunks(jobs).await;
        assert_eq!(failures, vec![]);
        assert_eq!(embedded.len(), 8);
    }
}
