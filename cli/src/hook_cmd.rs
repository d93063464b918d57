//! The hook entry point.
//!
//! The event producer blocks on this process and treats a non-zero exit as
//! a failure of the user's session, so every path here returns normally and
//! the caller exits zero. A missed state update is acceptable; a blocked
//! producer is not.

use log::debug;
use serde_json::Value;
use std::io::Read;
use steward_protocol::SessionId;
use steward_session::{HookEvent, SessionStore, Transition, default_db_path, tmux, transition};

pub fn run() {
    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        return;
    }
    let value: Value = match serde_json::from_str(&input) {
        Ok(value) => value,
        Err(err) => {
            debug!("hook input is not JSON: {err}");
            return;
        }
    };
    let Some((event, context)) = HookEvent::decode(&value) else {
        return;
    };
    let Some(pane) = tmux::current_pane() else {
        return;
    };
    let change = transition(&event);
    if change == Transition::None {
        return;
    }

    let store = match SessionStore::open(&default_db_path()) {
        Ok(store) => store,
        Err(err) => {
            debug!("session store unavailable: {err}");
            return;
        }
    };

    match change {
        Transition::Delete => {
            if let Err(err) = store.delete(&pane.pane_id) {
                debug!("delete failed for {}: {err}", pane.pane_id);
            }
        }
        Transition::Update(state) => {
            if let Err(err) = store.upsert(
                &pane,
                &SessionId::new(context.session_id),
                &context.cwd,
                &context.transcript_path,
                state,
            ) {
                debug!("upsert failed for {}: {err}", pane.pane_id);
            }
        }
        Transition::None => {}
    }
}
