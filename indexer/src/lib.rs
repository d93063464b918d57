/*!
Incremental transcript indexing.

The pipeline: discover `.jsonl` transcripts, reconstruct turns, chunk them,
diff the chunk ids against what the vector store already holds, then embed
and upsert only the new chunks in sequential batches. Failures are isolated
to the offending chunk and collected for the error report; re-running the
indexer against an unchanged corpus indexes nothing.
*/

mod config;
mod error;
mod indexer;

pub use config::IndexerConfig;
pub use error::{IndexerError, Result};
pub use indexer::{
    DiscoveredFile, IndexPhase, IndexPlan, IndexProgress, IndexReport, Indexer,
    ProgressCallback, collect_chunks, diff_chunks, discover_files, write_errors_file,
};
