//! Pane-context lookup via the tmux client.
//!
//! Queried once per hook invocation. Being outside tmux is the common case
//! for non-terminal launches and is reported as `None`, not an error; it
//! just means there is no pane to attribute the event to.

use log::debug;
use std::process::Command;
use steward_protocol::PaneId;

/// Where the current process lives inside tmux.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneContext {
    pub pane_id: PaneId,
    pub session_name: String,
    pub window_index: i64,
    pub pane_index: i64,
}

impl PaneContext {
    /// Rendered `{session}:{window}.{pane}` location.
    pub fn location(&self) -> String {
        format!(
            "{}:{}.{}",
            self.session_name, self.window_index, self.pane_index
        )
    }
}

/// Read the four pane display variables from tmux.
///
/// Returns `None` when the `TMUX` environment variable is absent or any of
/// the four queries fails.
pub fn current_pane() -> Option<PaneContext> {
    if std::env::var_os("TMUX").is_none() {
        debug!("not inside tmux, skipping pane lookup");
        return None;
    }

    let pane_id = display_var("#{pane_id}")?;
    let session_name = display_var("#{session_name}")?;
    let window_index = display_var("#{window_index}")?.parse().ok()?;
    let pane_index = display_var("#{pane_index}")?.parse().ok()?;

    Some(PaneContext {
        pane_id: PaneId::new(pane_id),
        session_name,
        window_index,
        pane_index,
    })
}

fn display_var(format: &str) -> Option<String> {
    let output = Command::new("tmux")
        .args(["display-message", "-p", format])
        .output()
        .ok()?;
    if !output.status.success() {
        debug!("tmux display-message {format} failed: {}", output.status);
        return None;
    }
    let line = String::from_utf8(output.stdout).ok()?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn location_renders_session_window_pane() {
        let context = PaneContext {
            pane_id: PaneId::new("%3"),
            session_name: "dev".to_string(),
            window_index: 2,
            pane_index: 1,
        };
        assert_eq!(context.location(), "dev:2.1");
    }
}
