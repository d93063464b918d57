//! Shared identifier types for the steward workspace.
//!
//! Panes, sessions, messages, and chunks all carry string identities that
//! originate in different systems (tmux, the assistant, transcript files,
//! the chunker). Each gets its own opaque wrapper so one can never be passed
//! where another is expected.

mod ids;

pub use ids::{ChunkId, MessageId, PaneId, SessionId};
