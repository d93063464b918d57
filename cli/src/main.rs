mod hook_cmd;
mod index_cmd;
mod search_cmd;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use steward_embeddings::EmbeddingModel;

#[derive(Debug, Parser)]
#[command(
    name = "steward",
    version,
    about = "Index assistant transcripts and search them alongside live tmux state"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index transcripts into the vector store
    Index(IndexArgs),

    /// Search indexed transcripts
    Search(SearchArgs),

    /// List panes whose assistant is waiting on you
    Sessions(SessionsArgs),

    /// Consume one lifecycle event from stdin (hook entry point)
    Hook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelArg {
    /// 768-dimension default model
    Nomic,
    /// 1024-dimension model
    Mxbai,
}

impl From<ModelArg> for EmbeddingModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Nomic => EmbeddingModel::NomicEmbedText,
            ModelArg::Mxbai => EmbeddingModel::MxbaiEmbedLarge,
        }
    }
}

#[derive(Debug, Parser)]
struct IndexArgs {
    /// In-flight embedding requests
    #[arg(long, default_value_t = 4, value_name = "N")]
    parallel: usize,

    /// Only index transcripts of this project
    #[arg(long, value_name = "PATH")]
    project: Option<String>,

    /// Plan only; embed and write nothing
    #[arg(long)]
    dry_run: bool,

    /// Chunks per embed+upsert batch
    #[arg(long, default_value_t = 50, value_name = "N")]
    batch: usize,

    /// Write failed chunks to this JSONL file
    #[arg(long, value_name = "PATH")]
    errors_file: Option<PathBuf>,

    /// Transcript root (defaults to ~/.claude/projects)
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,

    /// Embedding model; indexing and search must agree
    #[arg(long, value_enum, default_value_t = ModelArg::Nomic)]
    model: ModelArg,
}

#[derive(Debug, Parser)]
struct SearchArgs {
    /// The query text
    #[arg(value_name = "QUERY")]
    query: String,

    /// Number of results
    #[arg(short = 'n', long, default_value_t = 10, value_name = "N")]
    limit: usize,

    /// Only hits from this project
    #[arg(long, value_name = "PATH")]
    project: Option<String>,

    /// Emit one JSON object per hit
    #[arg(long)]
    json: bool,

    /// Minimum similarity score
    #[arg(long, value_name = "F")]
    threshold: Option<f32>,

    /// Embedding model; must match the one that indexed the corpus
    #[arg(long, value_enum, default_value_t = ModelArg::Nomic)]
    model: ModelArg,
}

#[derive(Debug, Parser)]
struct SessionsArgs {
    /// Include panes that are still working
    #[arg(long)]
    all: bool,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    // The hook path stays synchronous: the producer blocks on it and it
    // never needs a runtime.
    if matches!(cli.command, Command::Hook) {
        hook_cmd::run();
        process::exit(0);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("steward: failed to start runtime: {err}");
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Command::Index(args) => index_cmd::run(args).await,
            Command::Search(args) => search_cmd::run(args).await,
            Command::Sessions(args) => search_cmd::run_sessions(args),
            Command::Hook => unreachable!("handled above"),
        }
    });

    if let Err(err) = result {
        eprintln!("steward: {err:#}");
        process::exit(1);
    }
}
