use crate::{SearchArgs, SessionsArgs};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde_json::json;
use steward_embeddings::EmbedConfig;
use steward_finder::{Finder, LiveStatus, SearchHit, render_line};
use steward_session::{SessionState, SessionStore, default_db_path};
use steward_vector_store::VectorStoreConfig;

pub async fn run(args: SearchArgs) -> Result<()> {
    let finder = Finder::new(
        EmbedConfig {
            model: args.model.into(),
            ..Default::default()
        },
        VectorStoreConfig::default(),
        default_db_path(),
    )?;

    let hits = finder
        .search(
            &args.query,
            args.limit,
            args.project.as_deref(),
            args.threshold,
        )
        .await?;

    if args.json {
        for hit in &hits {
            println!("{}", hit_json(hit));
        }
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for hit in &hits {
        let line = render_line(hit);
        match &hit.live {
            LiveStatus::Running {
                state: SessionState::Working,
                ..
            } => println!("{}", line.green()),
            LiveStatus::Running { .. } => println!("{}", line.yellow()),
            LiveStatus::NotRunning => println!("{}", line.dimmed()),
        }
    }
    Ok(())
}

fn hit_json(hit: &SearchHit) -> String {
    let live = match &hit.live {
        LiveStatus::Running {
            tmux_location,
            state,
        } => json!({
            "status": "running",
            "tmux_location": tmux_location,
            "state": state.encode(),
        }),
        LiveStatus::NotRunning => json!({ "status": "not_running" }),
    };
    json!({
        "chunk_id": hit.result.chunk_id,
        "session_id": hit.result.session_id,
        "project_path": hit.result.project_path,
        "timestamp": hit.result.timestamp,
        "score": hit.result.score,
        "content": hit.result.content,
        "context": hit.result.context,
        "live": live,
    })
    .to_string()
}

pub fn run_sessions(args: SessionsArgs) -> Result<()> {
    let store = SessionStore::open(&default_db_path()).context("opening the session database")?;
    let records = if args.all {
        store.all()
    } else {
        store.sessions_needing_attention()
    }
    .context("querying sessions")?;

    if records.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    for record in records {
        let glyph = match record.state {
            SessionState::Working => "●".green().to_string(),
            SessionState::NeedsAttention(_) => "◆".yellow().to_string(),
        };
        println!(
            "{glyph} {}  {}  {}  {}",
            record.tmux_location,
            record.state.encode(),
            record.cwd,
            record.last_updated.dimmed(),
        );
    }
    Ok(())
}
