use serde::Deserialize;
use serde_json::Value;

/// How a session was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStartSource {
    #[default]
    Startup,
    Resume,
    Clear,
    Compact,
}

/// Notification kinds the assistant emits.
///
/// Upstream adds kinds without notice; anything unrecognized is preserved
/// verbatim in `Unknown` so new kinds flow through the transition table
/// (where they mean "no change") instead of breaking the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    ElicitationDialog,
    PermissionPrompt,
    IdlePrompt,
    AuthSuccess,
    Unknown(String),
}

impl From<&str> for NotificationKind {
    fn from(raw: &str) -> Self {
        match raw {
            "elicitation_dialog" => Self::ElicitationDialog,
            "permission_prompt" => Self::PermissionPrompt,
            "idle_prompt" => Self::IdlePrompt,
            "auth_success" => Self::AuthSuccess,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// One decoded assistant lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    SessionStart {
        source: SessionStartSource,
    },
    Stop {
        active: bool,
    },
    PermissionRequest {
        tool_name: String,
        tool_input: Value,
    },
    UserPromptSubmit {
        prompt: String,
    },
    SessionEnd {
        reason: String,
    },
    Notification {
        kind: NotificationKind,
        message: String,
    },
}

/// Fields shared by every hook event on stdin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventContext {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub transcript_path: String,
}

impl HookEvent {
    /// Decode one hook-event JSON object.
    ///
    /// Returns `None` for unknown event names and for payloads that do not
    /// look like an object at all; missing optional fields take their
    /// documented defaults. This function never fails outward; the hook
    /// entry point must stay silent on garbage input.
    pub fn decode(value: &Value) -> Option<(HookEvent, EventContext)> {
        let obj = value.as_object()?;
        let name = obj.get("hook_event_name")?.as_str()?;

        let context: EventContext =
            serde_json::from_value(value.clone()).unwrap_or_default();

        let event = match name {
            "SessionStart" => {
                let source = obj
                    .get("source")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                HookEvent::SessionStart { source }
            }
            "Stop" => HookEvent::Stop {
                active: obj
                    .get("stop_hook_active")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "PermissionRequest" => HookEvent::PermissionRequest {
                tool_name: obj
                    .get("tool_name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                tool_input: obj.get("tool_input").cloned().unwrap_or(Value::Null),
            },
            "UserPromptSubmit" => HookEvent::UserPromptSubmit {
                prompt: obj
                    .get("prompt")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            "SessionEnd" => HookEvent::SessionEnd {
                reason: obj
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("other")
                    .to_string(),
            },
            "Notification" => HookEvent::Notification {
                kind: obj
                    .get("notification_type")
                    .and_then(Value::as_str)
                    .map(NotificationKind::from)
                    .unwrap_or(NotificationKind::Unknown(String::new())),
                message: obj
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => return None,
        };

        Some((event, context))
    }
}
