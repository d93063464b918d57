use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a known-good identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string for I/O.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Unwrap into the underlying string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id! {
    /// Identifier of a tmux pane (e.g. `"%3"`).
    ///
    /// Stable for the lifetime of the pane, which makes it the primary key
    /// for live session records. The assistant's session id is not: it
    /// rotates on every resume.
    PaneId
}

opaque_id! {
    /// Identifier of one assistant session (a UUID).
    ///
    /// Treated as a mutable attribute of a pane, never as an identity.
    SessionId
}

opaque_id! {
    /// Identifier of a single transcript message (`uuid` field).
    MessageId
}

opaque_id! {
    /// Identifier of an indexed chunk.
    ///
    /// Either a turn id verbatim (single-chunk turn) or `{turn_id}:{index}`
    /// for a multi-chunk turn.
    ChunkId
}

impl ChunkId {
    /// Chunk id for slice `index` of a multi-chunk turn.
    pub fn for_slice(turn_id: &MessageId, index: usize) -> Self {
        Self(format!("{}:{}", turn_id.as_str(), index))
    }

    /// Chunk id for a turn that fit in a single chunk.
    pub fn for_turn(turn_id: &MessageId) -> Self {
        Self(turn_id.as_str().to_string())
    }
}
