use crate::error::{Result, SessionError};
use crate::event::{HookEvent, NotificationKind};

/// Why a pane needs the user's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionReason {
    /// The assistant finished its turn.
    Done,
    /// The assistant is waiting on a permission decision.
    Permission,
    /// The assistant asked the user a question.
    Question,
}

/// Per-pane attention state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Working,
    NeedsAttention(AttentionReason),
}

impl SessionState {
    /// The single stored encoding. `decode` is its exact inverse; any other
    /// string is rejected rather than mapped to a default.
    pub fn encode(&self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::NeedsAttention(AttentionReason::Done) => "needs_attention:done",
            Self::NeedsAttention(AttentionReason::Permission) => {
                "needs_attention:permission"
            }
            Self::NeedsAttention(AttentionReason::Question) => "needs_attention:question",
        }
    }

    pub fn decode(raw: &str) -> Result<Self> {
        match raw {
            "working" => Ok(Self::Working),
            "needs_attention:done" => Ok(Self::NeedsAttention(AttentionReason::Done)),
            "needs_attention:permission" => {
                Ok(Self::NeedsAttention(AttentionReason::Permission))
            }
            "needs_attention:question" => {
                Ok(Self::NeedsAttention(AttentionReason::Question))
            }
            other => Err(SessionError::InvalidState(other.to_string())),
        }
    }
}

/// What a lifecycle event means for the pane's stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Upsert the record with this state.
    Update(SessionState),
    /// Remove the record.
    Delete,
    /// Leave the record untouched.
    None,
}

/// Map one lifecycle event to a state change. Pure and total over the
/// event sum; for notifications the outcome depends only on the kind.
pub fn transition(event: &HookEvent) -> Transition {
    match event {
        HookEvent::SessionStart { .. } | HookEvent::UserPromptSubmit { .. } => {
            Transition::Update(SessionState::Working)
        }
        HookEvent::Stop { .. } => {
            Transition::Update(SessionState::NeedsAttention(AttentionReason::Done))
        }
        HookEvent::PermissionRequest { .. } => {
            Transition::Update(SessionState::NeedsAttention(AttentionReason::Permission))
        }
        HookEvent::Notification { kind, .. } => match kind {
            NotificationKind::ElicitationDialog => {
                Transition::Update(SessionState::NeedsAttention(AttentionReason::Question))
            }
            _ => Transition::None,
        },
        HookEvent::SessionEnd { .. } => Transition::Delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SessionStartSource;
    use pretty_assertions::assert_eq;

    #[test]
    fn transition_table() {
        assert_eq!(
            transition(&HookEvent::SessionStart {
                source: SessionStartSource::Resume
            }),
            Transition::Update(SessionState::Working)
        );
        assert_eq!(
            transition(&HookEvent::UserPromptSubmit {
                prompt: "fix the bug".to_string()
            }),
            Transition::Update(SessionState::Working)
        );
        assert_eq!(
            transition(&HookEvent::Stop { active: false }),
            Transition::Update(SessionState::NeedsAttention(AttentionReason::Done))
        );
        assert_eq!(
            transition(&HookEvent::PermissionRequest {
                tool_name: "Bash".to_string(),
                tool_input: serde_json::Value::Null,
            }),
            Transition::Update(SessionState::NeedsAttention(AttentionReason::Permission))
        );
        assert_eq!(
            transition(&HookEvent::SessionEnd {
                reason: "logout".to_string()
            }),
            Transition::Delete
        );
    }

    #[test]
    fn elicitation_dialog_needs_attention() {
        assert_eq!(
            transition(&HookEvent::Notification {
                kind: NotificationKind::ElicitationDialog,
                message: "pick".to_string(),
            }),
            Transition::Update(SessionState::NeedsAttention(AttentionReason::Question))
        );
    }

    #[test]
    fn other_notifications_are_no_change() {
        for kind in [
            NotificationKind::IdlePrompt,
            NotificationKind::PermissionPrompt,
            NotificationKind::AuthSuccess,
            NotificationKind::Unknown("future_kind".to_string()),
        ] {
            assert_eq!(
                transition(&HookEvent::Notification {
                    kind,
                    message: "x".to_string(),
                }),
                Transition::None
            );
        }
    }

    #[test]
    fn state_encoding_round_trips() {
        let states = [
            SessionState::Working,
            SessionState::NeedsAttention(AttentionReason::Done),
            SessionState::NeedsAttention(AttentionReason::Permission),
            SessionState::NeedsAttention(AttentionReason::Question),
        ];
        for state in states {
            assert_eq!(SessionState::decode(state.encode()).unwrap(), state);
        }
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(SessionState::decode("idle").is_err());
        assert!(SessionState::decode("").is_err());
        assert!(SessionState::decode("needs_attention").is_err());
    }
}
