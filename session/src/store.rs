use crate::error::Result;
use crate::state::SessionState;
use crate::tmux::PaneContext;
use chrono::Utc;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use steward_protocol::{PaneId, SessionId};

/// Writes from the hook must never stall behind another writer; past a
/// quarter second the update is dropped instead.
const BUSY_TIMEOUT_MS: u64 = 250;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    pane_id         TEXT PRIMARY KEY,
    tmux_session    TEXT NOT NULL,
    tmux_window     INTEGER NOT NULL,
    tmux_pane       INTEGER NOT NULL,
    tmux_location   TEXT NOT NULL,
    session_id      TEXT NOT NULL,
    cwd             TEXT NOT NULL,
    transcript_path TEXT NOT NULL,
    state           TEXT NOT NULL,
    first_seen      TEXT NOT NULL,
    last_updated    TEXT NOT NULL,
    last_session_id TEXT
);
CREATE INDEX IF NOT EXISTS idx_sessions_session_id ON sessions(session_id);
CREATE INDEX IF NOT EXISTS idx_sessions_state ON sessions(state);
";

/// One pane-keyed session row.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub pane_id: PaneId,
    pub tmux_session: String,
    pub tmux_window: i64,
    pub tmux_pane: i64,
    pub tmux_location: String,
    pub session_id: SessionId,
    pub cwd: String,
    pub transcript_path: String,
    pub state: SessionState,
    pub first_seen: String,
    pub last_updated: String,
    pub last_session_id: Option<SessionId>,
}

/// Default database location: `STEWARD_DB`, else `~/.steward/sessions.db`.
pub fn default_db_path() -> PathBuf {
    if let Some(path) = std::env::var_os("STEWARD_DB") {
        return PathBuf::from(path);
    }
    let home = directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".steward").join("sessions.db")
}

/// SQLite-backed store of live pane records.
///
/// Opened fresh per hook invocation and closed on drop; concurrent hooks
/// from separate processes coordinate through SQLite's file locking.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Apply a state observation for a pane.
    ///
    /// Inserts a fresh row on first sight. On conflict the row is updated in
    /// place: `first_seen` is preserved, `last_updated` is refreshed, and
    /// the previous session id is shadowed into `last_session_id` only when
    /// the incoming session id actually differs (a resume rotated it).
    pub fn upsert(
        &self,
        pane: &PaneContext,
        session_id: &SessionId,
        cwd: &str,
        transcript_path: &str,
        state: SessionState,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sessions (
                pane_id, tmux_session, tmux_window, tmux_pane, tmux_location,
                session_id, cwd, transcript_path, state,
                first_seen, last_updated, last_session_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, NULL)
            ON CONFLICT(pane_id) DO UPDATE SET
                tmux_session = excluded.tmux_session,
                tmux_window = excluded.tmux_window,
                tmux_pane = excluded.tmux_pane,
                tmux_location = excluded.tmux_location,
                last_session_id = CASE
                    WHEN sessions.session_id <> excluded.session_id
                        THEN sessions.session_id
                    ELSE sessions.last_session_id
                END,
                session_id = excluded.session_id,
                cwd = excluded.cwd,
                transcript_path = excluded.transcript_path,
                state = excluded.state,
                last_updated = excluded.last_updated",
            params![
                pane.pane_id.as_str(),
                pane.session_name,
                pane.window_index,
                pane.pane_index,
                pane.location(),
                session_id.as_str(),
                cwd,
                transcript_path,
                state.encode(),
                now,
            ],
        )?;
        debug!("upserted pane {} -> {}", pane.pane_id, state.encode());
        Ok(())
    }

    /// Remove a pane's record. Removing an absent pane is not an error.
    pub fn delete(&self, pane_id: &PaneId) -> Result<()> {
        self.conn.execute(
            "DELETE FROM sessions WHERE pane_id = ?1",
            params![pane_id.as_str()],
        )?;
        Ok(())
    }

    pub fn get(&self, pane_id: &PaneId) -> Result<Option<SessionRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM sessions WHERE pane_id = ?1"),
                params![pane_id.as_str()],
                row_to_record,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find the pane a session is (or was) running in.
    ///
    /// Checks `last_session_id` too: the assistant rotates its session id on
    /// resume, so a search hit indexed under the previous id still joins to
    /// the live pane.
    pub fn find_by_session(&self, session_id: &SessionId) -> Result<Option<SessionRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM sessions
                     WHERE session_id = ?1 OR last_session_id = ?1
                     ORDER BY last_updated DESC LIMIT 1"
                ),
                params![session_id.as_str()],
                row_to_record,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All panes currently waiting on the user, most recently updated first.
    pub fn sessions_needing_attention(&self) -> Result<Vec<SessionRecord>> {
        self.select_where("state != 'working'")
    }

    pub fn all(&self) -> Result<Vec<SessionRecord>> {
        self.select_where("1 = 1")
    }

    fn select_where(&self, predicate: &str) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM sessions WHERE {predicate} ORDER BY last_updated DESC"
        ))?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

const COLUMNS: &str = "pane_id, tmux_session, tmux_window, tmux_pane, tmux_location, \
     session_id, cwd, transcript_path, state, first_seen, last_updated, last_session_id";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    let encoded: String = row.get(8)?;
    let state = SessionState::decode(&encoded).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            8,
            rusqlite::types::Type::Text,
            format!("invalid state encoding {encoded:?}").into(),
        )
    })?;
    Ok(SessionRecord {
        pane_id: PaneId::new(row.get::<_, String>(0)?),
        tmux_session: row.get(1)?,
        tmux_window: row.get(2)?,
        tmux_pane: row.get(3)?,
        tmux_location: row.get(4)?,
        session_id: SessionId::new(row.get::<_, String>(5)?),
        cwd: row.get(6)?,
        transcript_path: row.get(7)?,
        state,
        first_seen: row.get(9)?,
        last_updated: row.get(10)?,
        last_session_id: row.get::<_, Option<String>>(11)?.map(SessionId::new),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AttentionReason;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_store() -> (SessionStore, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let store = SessionStore::open(&dir.path().join("sessions.db")).expect("open store");
        (store, dir)
    }

    fn pane(id: &str) -> PaneContext {
        PaneContext {
            pane_id: PaneId::new(id),
            session_name: "dev".to_string(),
            window_index: 2,
            pane_index: 1,
        }
    }

    #[test]
    fn upsert_then_get() {
        let (store, _dir) = test_store();
        store
            .upsert(
                &pane("%1"),
                &SessionId::new("s1"),
                "/work/proj",
                "/t/s1.jsonl",
                SessionState::Working,
            )
            .unwrap();

        let record = store.get(&PaneId::new("%1")).unwrap().unwrap();
        assert_eq!(record.session_id, SessionId::new("s1"));
        assert_eq!(record.tmux_location, "dev:2.1");
        assert_eq!(record.state, SessionState::Working);
        assert_eq!(record.last_session_id, None);
    }

    #[test]
    fn upsert_preserves_first_seen() {
        let (store, _dir) = test_store();
        let sid = SessionId::new("s1");
        store
            .upsert(&pane("%1"), &sid, "/w", "/t", SessionState::Working)
            .unwrap();
        let first = store.get(&PaneId::new("%1")).unwrap().unwrap();

        store
            .upsert(
                &pane("%1"),
                &sid,
                "/w",
                "/t",
                SessionState::NeedsAttention(AttentionReason::Done),
            )
            .unwrap();
        let second = store.get(&PaneId::new("%1")).unwrap().unwrap();

        assert_eq!(second.first_seen, first.first_seen);
        assert_eq!(
            second.state,
            SessionState::NeedsAttention(AttentionReason::Done)
        );
    }

    #[test]
    fn session_rotation_shadows_previous_id() {
        let (store, _dir) = test_store();
        store
            .upsert(
                &pane("%1"),
                &SessionId::new("s1"),
                "/w",
                "/t",
                SessionState::Working,
            )
            .unwrap();
        // Same session id again: no shadow.
        store
            .upsert(
                &pane("%1"),
                &SessionId::new("s1"),
                "/w",
                "/t",
                SessionState::Working,
            )
            .unwrap();
        assert_eq!(
            store.get(&PaneId::new("%1")).unwrap().unwrap().last_session_id,
            None
        );

        // Resume rotated the id: previous id is shadowed.
        store
            .upsert(
                &pane("%1"),
                &SessionId::new("s2"),
                "/w",
                "/t",
                SessionState::Working,
            )
            .unwrap();
        let record = store.get(&PaneId::new("%1")).unwrap().unwrap();
        assert_eq!(record.session_id, SessionId::new("s2"));
        assert_eq!(record.last_session_id, Some(SessionId::new("s1")));
    }

    #[test]
    fn find_by_session_bridges_resume() {
        let (store, _dir) = test_store();
        store
            .upsert(
                &pane("%1"),
                &SessionId::new("s1"),
                "/w",
                "/t",
                SessionState::Working,
            )
            .unwrap();
        store
            .upsert(
                &pane("%1"),
                &SessionId::new("s2"),
                "/w",
                "/t",
                SessionState::Working,
            )
            .unwrap();

        // The stale id still resolves to the pane.
        let by_old = store.find_by_session(&SessionId::new("s1")).unwrap().unwrap();
        assert_eq!(by_old.pane_id, PaneId::new("%1"));
        let by_new = store.find_by_session(&SessionId::new("s2")).unwrap().unwrap();
        assert_eq!(by_new.pane_id, PaneId::new("%1"));
    }

    #[test]
    fn delete_removes_record() {
        let (store, _dir) = test_store();
        store
            .upsert(
                &pane("%1"),
                &SessionId::new("s1"),
                "/w",
                "/t",
                SessionState::Working,
            )
            .unwrap();
        store.delete(&PaneId::new("%1")).unwrap();
        assert_eq!(store.get(&PaneId::new("%1")).unwrap(), None);

        // Deleting again is fine.
        store.delete(&PaneId::new("%1")).unwrap();
    }

    #[test]
    fn needing_attention_excludes_working() {
        let (store, _dir) = test_store();
        store
            .upsert(
                &pane("%1"),
                &SessionId::new("s1"),
                "/w",
                "/t",
                SessionState::Working,
            )
            .unwrap();
        store
            .upsert(
                &pane("%2"),
                &SessionId::new("s2"),
                "/w",
                "/t",
                SessionState::NeedsAttention(AttentionReason::Permission),
            )
            .unwrap();

        let waiting = store.sessions_needing_attention().unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].pane_id, PaneId::new("%2"));
        assert_eq!(store.all().unwrap().len(), 2);
    }
}
