use crate::error::Result;
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use steward_protocol::{MessageId, SessionId};

/// Who produced a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One conversation message extracted from a transcript file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptMessage {
    pub role: Role,
    pub id: MessageId,
    pub parent_id: Option<MessageId>,
    pub session_id: SessionId,
    pub timestamp: String,
    pub cwd: String,
    pub text: String,
}

/// Raw shape of the lines we care about. Everything else in a transcript
/// (progress records, file-history snapshots, queue operations) is skipped
/// at the `type` check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(rename = "type")]
    record_type: String,
    uuid: String,
    #[serde(default)]
    parent_uuid: Option<String>,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    cwd: String,
    message: RawMessage,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    content: RawContent,
}

/// `message.content` is a plain string for user prompts and an array of
/// typed blocks for assistant responses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<RawBlock>),
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(rename = "type", default)]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl RawContent {
    /// Join retained `text` blocks with a single newline; other block kinds
    /// (tool_use, thinking, ...) carry no conversational text and are
    /// dropped.
    fn into_text(self) -> String {
        match self {
            RawContent::Text(text) => text,
            RawContent::Blocks(blocks) => blocks
                .into_iter()
                .filter(|b| b.block_type == "text")
                .map(|b| b.text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Lazy reader over one transcript file.
///
/// Iteration yields conversation messages in file order, skipping records
/// that fail to decode and record types that are not `user`/`assistant`.
/// Re-reading is done by constructing a new reader.
pub struct TranscriptReader {
    lines: Lines<BufReader<File>>,
}

impl TranscriptReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }
}

impl Iterator for TranscriptReader {
    type Item = TranscriptMessage;

    fn next(&mut self) -> Option<TranscriptMessage> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    debug!("unreadable transcript line: {err}");
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let record: RawRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(err) => {
                    debug!("skipping undecodable transcript record: {err}");
                    continue;
                }
            };
            let role = match record.record_type.as_str() {
                "user" => Role::User,
                "assistant" => Role::Assistant,
                _ => continue,
            };
            return Some(TranscriptMessage {
                role,
                id: MessageId::new(record.uuid),
                parent_id: record.parent_uuid.map(MessageId::new),
                session_id: SessionId::new(record.session_id),
                timestamp: record.timestamp,
                cwd: record.cwd,
                text: record.message.content.into_text(),
            });
        }
    }
}
