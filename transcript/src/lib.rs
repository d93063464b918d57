//! Reading assistant transcripts.
//!
//! Transcript files are append-only newline-delimited JSON. The reader
//! streams the conversation records out of one file; the pairer assembles
//! them into (user, assistant) turns via parent links.

mod error;
mod reader;
mod turn;

pub use error::{Result, TranscriptError};
pub use reader::{Role, TranscriptMessage, TranscriptReader};
pub use turn::{Turn, pair_turns};
