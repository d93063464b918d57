use crate::error::{Result, VectorStoreError};
use crate::point::{PointPayload, point_id};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use steward_embeddings::EmbeddedChunk;
use steward_protocol::{ChunkId, SessionId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const SCROLL_PAGE_SIZE: usize = 1000;
const BODY_PREVIEW_CHARS: usize = 200;

/// Configuration for the vector store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub base_url: String,
    pub collection: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6333".to_string(),
            collection: "steward_chunks".to_string(),
        }
    }
}

impl VectorStoreConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if self.collection.trim().is_empty() {
            return Err("collection must not be empty".to_string());
        }
        Ok(())
    }
}

/// One nearest-neighbour hit, in store order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub chunk_id: ChunkId,
    pub session_id: SessionId,
    pub project_path: String,
    pub timestamp: String,
    pub content: String,
    pub context: Option<String>,
    pub score: f32,
}

/// HTTP client for point upsert, id scroll, and vector search.
pub struct VectorStore {
    http: reqwest::Client,
    config: VectorStoreConfig,
}

impl VectorStore {
    pub fn new(config: VectorStoreConfig) -> Result<Self> {
        config
            .validate()
            .map_err(VectorStoreError::InvalidConfig)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// Create the collection when it does not exist yet.
    ///
    /// Dense vector named `dense` with cosine distance; sparse vector named
    /// `sparse` with the IDF modifier for hybrid search.
    pub async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let url = self.collection_url("");
        let response = self.http.get(&url).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        if response.status().as_u16() != 404 {
            return Err(self.backend_error(response).await);
        }

        debug!("creating collection {}", self.config.collection);
        let body = json!({
            "vectors": {
                "dense": { "size": dimension, "distance": "Cosine" }
            },
            "sparse_vectors": {
                "sparse": { "modifier": "idf" }
            }
        });
        let response = self.http.put(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(self.backend_error(response).await);
        }
        Ok(())
    }

    /// Upsert embedded chunks as points. Empty input is a no-op success.
    pub async fn upsert(&self, chunks: &[EmbeddedChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<Value> = chunks.iter().map(chunk_to_point).collect();
        let url = format!("{}?wait=true", self.collection_url("/points"));
        let response = self
            .http
            .put(&url)
            .json(&json!({ "points": points }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.backend_error(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| VectorStoreError::Protocol(err.to_string()))?;
        if upsert_succeeded(&body) {
            debug!("upserted {} points", chunks.len());
            Ok(())
        } else {
            Err(VectorStoreError::UpsertRejected(preview(&body.to_string())))
        }
    }

    /// Scroll the whole collection and return every stored chunk id.
    ///
    /// Pages of 1000, payload limited to the `chunk_id` field, vectors
    /// excluded. Stops when the store reports no next page.
    pub async fn scroll_chunk_ids(&self) -> Result<Vec<ChunkId>> {
        let url = self.collection_url("/points/scroll");
        let mut ids = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "limit": SCROLL_PAGE_SIZE,
                "with_payload": { "include": ["chunk_id"] },
                "with_vector": false,
            });
            if let Some(offset_value) = &offset {
                body["offset"] = offset_value.clone();
            }

            let response = self.http.post(&url).json(&body).send().await?;
            if !response.status().is_success() {
                return Err(self.backend_error(response).await);
            }
            let page: Value = response
                .json()
                .await
                .map_err(|err| VectorStoreError::Protocol(err.to_string()))?;

            let points = page
                .pointer("/result/points")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    VectorStoreError::Protocol("scroll response missing result.points".into())
                })?;
            for point in points {
                if let Some(chunk_id) = point
                    .pointer("/payload/chunk_id")
                    .and_then(Value::as_str)
                {
                    ids.push(ChunkId::new(chunk_id));
                }
            }

            match page.pointer("/result/next_page_offset") {
                Some(next) if !next.is_null() => offset = Some(next.clone()),
                _ => break,
            }
        }

        debug!("scrolled {} chunk ids", ids.len());
        Ok(ids)
    }

    /// Nearest-neighbour search over the named dense vector.
    pub async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        project_filter: Option<&str>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        let url = self.collection_url("/points/search");
        let body = search_body(vector, limit, project_filter, score_threshold);

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(self.backend_error(response).await);
        }
        let decoded: Value = response
            .json()
            .await
            .map_err(|err| VectorStoreError::Protocol(err.to_string()))?;

        let hits = decoded
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                VectorStoreError::Protocol("search response missing result array".into())
            })?;

        hits.iter().map(hit_to_result).collect()
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.config.base_url, self.config.collection, suffix
        )
    }

    async fn backend_error(&self, response: reqwest::Response) -> VectorStoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        VectorStoreError::Backend {
            status,
            preview: preview(&body),
        }
    }
}

fn chunk_to_point(embedded: &EmbeddedChunk) -> Value {
    let chunk = &embedded.chunk;
    let payload = PointPayload {
        chunk_id: chunk.id.clone(),
        session_id: chunk.session_id.clone(),
        project_path: chunk.project_path.clone(),
        timestamp: chunk.timestamp.clone(),
        content: chunk.content.clone(),
        context: chunk.context.clone(),
    };
    json!({
        "id": point_id(&chunk.id),
        "vector": { "dense": embedded.vector },
        "payload": payload,
    })
}

/// Upsert success is signalled by a top-level `status == "ok"` or a nested
/// `result.status == "completed"`.
fn upsert_succeeded(body: &Value) -> bool {
    if body.get("status").and_then(Value::as_str) == Some("ok") {
        return true;
    }
    body.pointer("/result/status").and_then(Value::as_str) == Some("completed")
}

fn search_body(
    vector: &[f32],
    limit: usize,
    project_filter: Option<&str>,
    score_threshold: Option<f32>,
) -> Value {
    let mut body = json!({
        "vector": { "name": "dense", "vector": vector },
        "limit": limit,
        "with_payload": true,
    });
    if let Some(project) = project_filter {
        body["filter"] = json!({
            "must": [
                { "key": "project_path", "match": { "value": project } }
            ]
        });
    }
    // None means no threshold; any Some value, zero included, is a real
    // filter.
    if let Some(threshold) = score_threshold {
        body["score_threshold"] = json!(threshold);
    }
    body
}

fn hit_to_result(hit: &Value) -> Result<SearchResult> {
    let score = hit
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| VectorStoreError::Protocol("search hit missing score".into()))?;
    let payload = hit
        .get("payload")
        .ok_or_else(|| VectorStoreError::Protocol("search hit missing payload".into()))?;
    let payload: PointPayload = serde_json::from_value(payload.clone())
        .map_err(|err| VectorStoreError::Protocol(format!("malformed hit payload: {err}")))?;

    Ok(SearchResult {
        chunk_id: payload.chunk_id,
        session_id: payload.session_id,
        project_path: payload.project_path,
        timestamp: payload.timestamp,
        content: payload.content,
        context: payload.context,
        score: score as f32,
    })
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn degenerate_configs_are_rejected_at_construction() {
        assert!(VectorStoreConfig::default().validate().is_ok());

        let no_url = VectorStoreConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            VectorStore::new(no_url),
            Err(VectorStoreError::InvalidConfig(_))
        ));

        let no_collection = VectorStoreConfig {
            collection: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            VectorStore::new(no_collection),
            Err(VectorStoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn upsert_success_shapes() {
        assert!(upsert_succeeded(&json!({ "status": "ok" })));
        assert!(upsert_succeeded(
            &json!({ "result": { "status": "completed" } })
        ));
        assert!(!upsert_succeeded(&json!({ "status": "accepted" })));
        assert!(!upsert_succeeded(&json!({ "result": {} })));
        assert!(!upsert_succeeded(&json!({})));
    }

    #[test]
    fn search_body_without_options_is_minimal() {
        let body = search_body(&[0.1, 0.2], 10, None, None);
        assert_eq!(body["vector"]["name"], "dense");
        assert_eq!(body["limit"], 10);
        assert_eq!(body["with_payload"], true);
        assert!(body.get("filter").is_none());
        assert!(body.get("score_threshold").is_none());
    }

    #[test]
    fn project_filter_becomes_a_must_clause() {
        let body = search_body(&[0.1], 5, Some("/work/proj"), None);
        assert_eq!(
            body["filter"]["must"][0]["key"],
            "project_path"
        );
        assert_eq!(
            body["filter"]["must"][0]["match"]["value"],
            "/work/proj"
        );
    }

    #[test]
    fn zero_threshold_is_a_real_filter() {
        let body = search_body(&[0.1], 5, None, Some(0.0));
        assert_eq!(body["score_threshold"], 0.0);
    }

    #[test]
    fn hit_parsing_round_trips_payload() {
        let hit = json!({
            "id": 123,
            "score": 0.87,
            "payload": {
                "chunk_id": "t:1",
                "session_id": "s1",
                "project_path": "/work/proj",
                "timestamp": "2026-01-01T00:00:00Z",
                "content": "User: q\n\nAssistant: a",
            }
        });
        let result = hit_to_result(&hit).unwrap();
        assert_eq!(result.chunk_id, ChunkId::new("t:1"));
        assert_eq!(result.session_id, SessionId::new("s1"));
        assert_eq!(result.context, None);
        assert!((result.score - 0.87).abs() < 1e-6);
    }

    #[test]
    fn malformed_hit_is_a_protocol_error() {
        let missing_score = json!({ "payload": {} });
        assert!(matches!(
            hit_to_result(&missing_score),
            Err(VectorStoreError::Protocol(_))
        ));

        let missing_payload = json!({ "score": 0.5 });
        assert!(matches!(
            hit_to_result(&missing_payload),
            Err(VectorStoreError::Protocol(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running vector store"]
    async fn upsert_scroll_search_round_trip() {
        if std::env::var_os("SKIP_INTEGRATION").is_some() {
            return;
        }
        use steward_chunker::Chunk;
        use steward_embeddings::EmbeddedChunk;

        let store = VectorStore::new(VectorStoreConfig {
            collection: "steward_test".to_string(),
            ..Default::default()
        })
        .unwrap();
        store.ensure_collection(2).await.unwrap();

        let embedded = EmbeddedChunk {
            chunk: Chunk {
                id: ChunkId::new("round-trip"),
                session_id: SessionId::new("s1"),
                project_path: "/work/proj".to_string(),
                timestamp: "2026-01-01T00:00:00Z".to_string(),
                content: "User: q\n\nAssistant: a".to_string(),
                context: None,
            },
            vector: vec![1.0, 0.0],
        };
        store.upsert(std::slice::from_ref(&embedded)).await.unwrap();

        let ids = store.scroll_chunk_ids().await.unwrap();
        assert!(ids.contains(&ChunkId::new("round-trip")));

        let hits = store.search(&[1.0, 0.0], 10, None, None).await.unwrap();
        assert!(hits.iter().any(|h| h.chunk_id == ChunkId::new("round-trip")));
    }

    #[test]
    fn point_conversion_carries_payload_and_hashed_id() {
        use steward_chunker::Chunk;
        use steward_embeddings::EmbeddedChunk;

        let embedded = EmbeddedChunk {
            chunk: Chunk {
                id: ChunkId::new("abc-123"),
                session_id: SessionId::new("s1"),
                project_path: "/work/proj".to_string(),
                timestamp: "2026-01-01T00:00:00Z".to_string(),
                content: "text".to_string(),
                context: None,
            },
            vector: vec![0.5, 0.5],
        };
        let point = chunk_to_point(&embedded);
        assert_eq!(point["id"], point_id(&ChunkId::new("abc-123")));
        assert_eq!(point["payload"]["chunk_id"], "abc-123");
        assert_eq!(point["vector"]["dense"][0], 0.5);
        // context is omitted, not null
        assert!(point["payload"].get("context").is_none());
    }
}
