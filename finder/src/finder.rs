use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;
use steward_embeddings::{EmbedConfig, EmbeddingClient};
use steward_session::{SessionState, SessionStore};
use steward_vector_store::{SearchResult, VectorStore, VectorStoreConfig};

const TITLE_CHARS: usize = 80;

/// Whether a hit's session is live in a tmux pane right now.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveStatus {
    Running {
        tmux_location: String,
        state: SessionState,
    },
    NotRunning,
}

/// One search hit joined with live pane state.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub result: SearchResult,
    pub live: LiveStatus,
}

/// Embeds queries and joins store hits with the session database.
pub struct Finder {
    client: EmbeddingClient,
    store: VectorStore,
    db_path: PathBuf,
}

impl Finder {
    pub fn new(
        embed: EmbedConfig,
        store: VectorStoreConfig,
        db_path: PathBuf,
    ) -> Result<Self> {
        Ok(Self {
            client: EmbeddingClient::new(embed).context("building embedding client")?,
            store: VectorStore::new(store).context("building vector store client")?,
            db_path,
        })
    }

    /// Search the indexed corpus.
    ///
    /// The query must embed with the same model that indexed the corpus;
    /// the caller's configuration is trusted on that point.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        project: Option<&str>,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>> {
        let vector = self
            .client
            .embed(query)
            .await
            .context("embedding the query")?;
        let results = self
            .store
            .search(&vector, limit, project, threshold)
            .await
            .context("searching the vector store")?;
        debug!("{} hits for {query:?}", results.len());

        let sessions =
            SessionStore::open(&self.db_path).context("opening the session database")?;
        results
            .into_iter()
            .map(|result| {
                let live = match sessions
                    .find_by_session(&result.session_id)
                    .context("looking up live session state")?
                {
                    Some(record) => LiveStatus::Running {
                        tmux_location: record.tmux_location,
                        state: record.state,
                    },
                    None => LiveStatus::NotRunning,
                };
                Ok(SearchHit { result, live })
            })
            .collect()
    }
}

/// Render one hit as a human-readable line.
///
/// Live hits carry their tmux location and a state glyph; dead ones get the
/// "not running" form. The title is the first line of the hit with the
/// conversation framing stripped.
pub fn render_line(hit: &SearchHit) -> String {
    let title = title_of(&hit.result.content);
    let place = match &hit.live {
        LiveStatus::Running {
            tmux_location,
            state,
        } => format!("{} {tmux_location}", state_glyph(*state)),
        LiveStatus::NotRunning => "○ not running".to_string(),
    };
    format!(
        "{place}  {score:.3}  {title}  ({project})",
        score = hit.result.score,
        project = hit.result.project_path,
    )
}

fn state_glyph(state: SessionState) -> &'static str {
    match state {
        SessionState::Working => "●",
        SessionState::NeedsAttention(_) => "◆",
    }
}

fn title_of(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default();
    let stripped = first_line.strip_prefix("User: ").unwrap_or(first_line);
    let mut title: String = stripped.chars().take(TITLE_CHARS).collect();
    if stripped.chars().count() > TITLE_CHARS {
        title.push('…');
    }
    title
}
