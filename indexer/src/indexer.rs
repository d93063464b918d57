use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use steward_chunker::{Chunk, TurnChunker};
use steward_embeddings::{EmbedFailure, EmbeddingPool};
use steward_transcript::{TranscriptReader, pair_turns};
use steward_vector_store::VectorStore;
use walkdir::WalkDir;

/// Progress callback for indexing operations.
pub type ProgressCallback = Arc<dyn Fn(IndexProgress) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct IndexProgress {
    pub phase: IndexPhase,
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    Discovering,
    Parsing,
    Diffing,
    Indexing,
    Complete,
}

/// One transcript file found under the root.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub mtime: Option<SystemTime>,
    pub size: u64,
}

/// What an index run would do, computed before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPlan {
    pub files_seen: usize,
    pub files_skipped: usize,
    pub chunks_parsed: usize,
    pub existing: usize,
    pub new_chunks: usize,
}

/// Outcome of an index run.
#[derive(Debug)]
pub struct IndexReport {
    pub plan: IndexPlan,
    pub embedded: usize,
    pub written: usize,
    pub failures: Vec<EmbedFailure>,
}

/// The full pipeline: discover, parse, diff, embed, upsert.
pub struct Indexer {
    config: IndexerConfig,
    chunker: TurnChunker,
    pool: EmbeddingPool,
    store: VectorStore,
}

impl Indexer {
    pub fn new(config: IndexerConfig) -> Result<Self> {
        config.validate().map_err(IndexerError::InvalidConfig)?;
        let chunker = TurnChunker::new(config.chunker.clone())?;
        let pool = EmbeddingPool::new(config.embed.clone(), config.workers)?;
        let store = VectorStore::new(config.store.clone())?;
        Ok(Self {
            config,
            chunker,
            pool,
            store,
        })
    }

    /// Run the pipeline. A dry run stops after the plan.
    pub async fn run(&self, progress: Option<ProgressCallback>) -> Result<IndexReport> {
        report_progress(&progress, IndexPhase::Discovering, 0, 0);
        let files = discover_files(
            &self.config.transcripts_root,
            self.config.project.as_deref(),
        )?;
        info!("discovered {} transcript files", files.len());

        report_progress(&progress, IndexPhase::Parsing, 0, files.len());
        let (chunks, files_skipped) = collect_chunks(&files, &self.chunker);
        info!(
            "parsed {} chunks from {} files ({} unreadable)",
            chunks.len(),
            files.len(),
            files_skipped
        );

        report_progress(&progress, IndexPhase::Diffing, 0, chunks.len());
        let existing: HashSet<String> = if chunks.is_empty() {
            // Nothing parsed means nothing to diff; skip the store
            // round-trip entirely.
            HashSet::new()
        } else {
            self.store
                .ensure_collection(self.config.embed.model.dimension())
                .await?;
            self.store
                .scroll_chunk_ids()
                .await?
                .into_iter()
                .map(|id| id.into_string())
                .collect()
        };
        let (plan, work) = diff_chunks(chunks, &existing, files.len(), files_skipped);
        info!(
            "plan: {} parsed, {} already indexed, {} new",
            plan.chunks_parsed, plan.existing, plan.new_chunks
        );

        if self.config.dry_run {
            return Ok(IndexReport {
                plan,
                embedded: 0,
                written: 0,
                failures: Vec::new(),
            });
        }

        let total = work.len();
        let mut embedded_count = 0;
        let mut written = 0;
        let mut failures = Vec::new();
        let mut processed = 0;

        // Batches are sequential; a crash leaves a committed prefix and the
        // diff step picks up the rest on the next run.
        for batch in work.chunks(self.config.batch_size) {
            let (embedded, batch_failures) = self.pool.embed_chunks(batch.to_vec()).await;
            embedded_count += embedded.len();
            failures.extend(batch_failures);

            match self.store.upsert(&embedded).await {
                Ok(()) => written += embedded.len(),
                Err(err) => {
                    // The whole batch's successes die together; later
                    // batches still run.
                    warn!("batch upsert failed: {err}");
                    let reason = err.to_string();
                    failures.extend(embedded.into_iter().map(|e| EmbedFailure {
                        chunk: e.chunk,
                        error: reason.clone(),
                    }));
                }
            }

            processed += batch.len();
            report_progress(&progress, IndexPhase::Indexing, processed, total);
        }

        report_progress(&progress, IndexPhase::Complete, total, total);

        if let Some(path) = &self.config.errors_file
            && !failures.is_empty()
        {
            write_errors_file(path, &failures)?;
            info!("wrote {} failures to {}", failures.len(), path.display());
        }

        Ok(IndexReport {
            plan,
            embedded: embedded_count,
            written,
            failures,
        })
    }
}

/// Walk the transcripts root and collect every `.jsonl` file, optionally
/// restricted to one project.
///
/// The project filter accepts a file when its path contains the project
/// path literally, or contains the project path with `/` flattened to `-`
/// (transcript producers encode project directories into file-safe names).
pub fn discover_files(root: &Path, project: Option<&str>) -> Result<Vec<DiscoveredFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        if let Some(project) = project
            && !matches_project(path, project)
        {
            continue;
        }
        let metadata = entry.metadata().ok();
        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            mtime: metadata.as_ref().and_then(|m| m.modified().ok()),
            size: metadata.map(|m| m.len()).unwrap_or(0),
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn matches_project(path: &Path, project: &str) -> bool {
    let path = path.to_string_lossy();
    path.contains(project) || path.contains(&project.replace('/', "-"))
}

/// Parse every file into chunks. Unreadable files are counted and skipped.
pub fn collect_chunks(files: &[DiscoveredFile], chunker: &TurnChunker) -> (Vec<Chunk>, usize) {
    let mut chunks = Vec::new();
    let mut skipped = 0;
    for file in files {
        let reader = match TranscriptReader::open(&file.path) {
            Ok(reader) => reader,
            Err(err) => {
                debug!("skipping unreadable {}: {err}", file.path.display());
                skipped += 1;
                continue;
            }
        };
        for turn in pair_turns(reader) {
            chunks.extend(chunker.chunk_turn(&turn));
        }
    }
    (chunks, skipped)
}

/// Drop every parsed chunk whose id the store already holds.
pub fn diff_chunks(
    parsed: Vec<Chunk>,
    existing: &HashSet<String>,
    files_seen: usize,
    files_skipped: usize,
) -> (IndexPlan, Vec<Chunk>) {
    let chunks_parsed = parsed.len();
    let work: Vec<Chunk> = parsed
        .into_iter()
        .filter(|chunk| !existing.contains(chunk.id.as_str()))
        .collect();
    let plan = IndexPlan {
        files_seen,
        files_skipped,
        chunks_parsed,
        existing: chunks_parsed - work.len(),
        new_chunks: work.len(),
    };
    (plan, work)
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    chunk_id: &'a str,
    session_id: &'a str,
    project_path: &'a str,
    error: &'a str,
    content_length: usize,
    content_preview: String,
}

/// Write failed chunks as JSONL for triage.
pub fn write_errors_file(path: &Path, failures: &[EmbedFailure]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    for failure in failures {
        let record = ErrorRecord {
            chunk_id: failure.chunk.id.as_str(),
            session_id: failure.chunk.session_id.as_str(),
            project_path: &failure.chunk.project_path,
            error: &failure.error,
            content_length: failure.chunk.content.len(),
            content_preview: failure.chunk.content.chars().take(200).collect(),
        };
        // A failure that can't be serialized would only ever be a bug in
        // ErrorRecord itself.
        let line = serde_json::to_string(&record)
            .unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}"));
        writeln!(file, "{line}")?;
    }
    Ok(())
}

fn report_progress(
    callback: &Option<ProgressCallback>,
    phase: IndexPhase,
    current: usize,
    total: usize,
) {
    if let Some(callback) = callback {
        callback(IndexProgress {
            phase,
            current,
            total,
        });
    }
}
