use crate::IndexArgs;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::sync::Arc;
use steward_embeddings::EmbedConfig;
use steward_indexer::{IndexPhase, Indexer, IndexerConfig};

pub async fn run(args: IndexArgs) -> Result<()> {
    let mut config = IndexerConfig {
        project: args.project,
        dry_run: args.dry_run,
        batch_size: args.batch,
        workers: args.parallel,
        errors_file: args.errors_file,
        embed: EmbedConfig {
            model: args.model.into(),
            ..Default::default()
        },
        ..Default::default()
    };
    if let Some(root) = args.root {
        config.transcripts_root = root;
    }

    let dry_run = config.dry_run;
    let indexer = Indexer::new(config).context("initializing the indexer")?;

    // Progress goes to stderr; stdout carries only the report.
    let progress: steward_indexer::ProgressCallback =
        Arc::new(|progress: steward_indexer::IndexProgress| match progress.phase {
            IndexPhase::Discovering => eprintln!("discovering transcripts..."),
            IndexPhase::Parsing => eprintln!("parsing {} files...", progress.total),
            IndexPhase::Diffing => {
                eprintln!("diffing {} chunks against the store...", progress.total)
            }
            IndexPhase::Indexing => {
                eprintln!("indexed {}/{} chunks", progress.current, progress.total)
            }
            IndexPhase::Complete => {}
        });

    let report = indexer.run(Some(progress)).await.context("indexing failed")?;

    println!("{} Indexing {}", "▶".blue(), if dry_run { "plan" } else { "complete" });
    println!("  Files seen: {}", report.plan.files_seen.cyan());
    if report.plan.files_skipped > 0 {
        println!("  Files unreadable: {}", report.plan.files_skipped.yellow());
    }
    println!("  Chunks parsed: {}", report.plan.chunks_parsed.cyan());
    println!("  Already indexed: {}", report.plan.existing.cyan());
    println!("  New chunks: {}", report.plan.new_chunks.cyan());
    if !dry_run {
        println!("  Embedded: {}", report.embedded.cyan());
        println!("  Written: {}", report.written.green());
        if report.failures.is_empty() {
            println!("  Errors: {}", "0".green());
        } else {
            println!("  Errors: {}", report.failures.len().red());
        }
    }

    // Completed-with-errors is still a completed run.
    Ok(())
}
