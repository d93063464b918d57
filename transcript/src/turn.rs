use crate::reader::{Role, TranscriptMessage};
use log::debug;
use std::collections::{HashMap, HashSet};
use steward_protocol::{MessageId, SessionId};

/// One (user, assistant) exchange, paired by the assistant's parent link.
///
/// The turn's identity is the user message's id: it is the stable anchor
/// that chunk identifiers derive from.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub id: MessageId,
    pub session_id: SessionId,
    pub project_path: String,
    pub timestamp: String,
    pub user_text: String,
    pub assistant_text: String,
}

impl Turn {
    /// The text that gets chunked and embedded.
    pub fn combined_text(&self) -> String {
        format!(
            "User: {}\n\nAssistant: {}",
            self.user_text, self.assistant_text
        )
    }
}

/// Assemble turns from a message sequence, in source order.
///
/// An assistant message pairs with its parent when that parent is a user
/// message seen in the same file. Orphans (users nobody answered,
/// assistants with no parent or a non-user parent) are dropped. If several
/// assistant messages claim the same user parent (regenerated responses),
/// the first one in file order wins so turn ids stay unique.
pub fn pair_turns(messages: impl IntoIterator<Item = TranscriptMessage>) -> Vec<Turn> {
    let messages: Vec<TranscriptMessage> = messages.into_iter().collect();
    let users: HashMap<&str, &TranscriptMessage> = messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| (m.id.as_str(), m))
        .collect();

    let mut paired: HashSet<&str> = HashSet::new();
    let mut turns = Vec::new();
    for message in &messages {
        if message.role != Role::Assistant {
            continue;
        }
        let Some(parent_id) = &message.parent_id else {
            continue;
        };
        let Some(user) = users.get(parent_id.as_str()) else {
            debug!("assistant {} has non-user parent, skipping", message.id);
            continue;
        };
        if !paired.insert(user.id.as_str()) {
            continue;
        }
        turns.push(Turn {
            id: user.id.clone(),
            session_id: user.session_id.clone(),
            project_path: if user.cwd.is_empty() {
                "unknown".to_string()
            } else {
                user.cwd.clone()
            },
            timestamp: user.timestamp.clone(),
            user_text: user.text.clone(),
            assistant_text: message.text.clone(),
        });
    }
    turns
}
