use std::path::Path;

use deskline_domain::{CoreError, UserSession};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

const KEY_USER_TYPE: &str = "userType";
const KEY_NAME: &str = "name";
const KEY_ID: &str = "id";

/// Persisted login session. Three key-value rows in SQLite, nothing
/// more: a login writes them, a logout deletes them, startup reads them
/// to skip the login screen.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| CoreError::Persistence(err.to_string()))?;
            }
        }
        let conn = Connection::open(path).map_err(|err| CoreError::Persistence(err.to_string()))?;
        let store = Self { conn };
        store.bootstrap()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, CoreError> {
        let conn =
            Connection::open_in_memory().map_err(|err| CoreError::Persistence(err.to_string()))?;
        let store = Self { conn };
        store.bootstrap()?;
        Ok(store)
    }

    fn bootstrap(&self) -> Result<(), CoreError> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS session_entries (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                ",
            )
            .map_err(|err| CoreError::Persistence(err.to_string()))
    }

    /// A session only counts when all three entries are present;
    /// anything partial reads as logged out.
    pub fn load(&self) -> Result<Option<UserSession>, CoreError> {
        let user_type = self.read_entry(KEY_USER_TYPE)?;
        let name = self.read_entry(KEY_NAME)?;
        let id = self.read_entry(KEY_ID)?;

        match (user_type, name, id) {
            (Some(user_type), Some(name), Some(id)) => Ok(Some(UserSession {
                user_type,
                name,
                id,
            })),
            _ => Ok(None),
        }
    }

    pub fn store(&mut self, session: &UserSession) -> Result<(), CoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|err| CoreError::Persistence(err.to_string()))?;
        for (key, value) in [
            (KEY_USER_TYPE, session.user_type.as_str()),
            (KEY_NAME, session.name.as_str()),
            (KEY_ID, session.id.as_str()),
        ] {
            tx.execute(
                "INSERT OR REPLACE INTO session_entries (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|err| CoreError::Persistence(err.to_string()))?;
        }
        tx.commit()
            .map_err(|err| CoreError::Persistence(err.to_string()))?;
        debug!(user_type = %session.user_type, "session stored");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), CoreError> {
        self.conn
            .execute("DELETE FROM session_entries", [])
            .map_err(|err| CoreError::Persistence(err.to_string()))?;
        debug!("session cleared");
        Ok(())
    }

    fn read_entry(&self, key: &str) -> Result<Option<String>, CoreError> {
        self.conn
            .query_row(
                "SELECT value FROM session_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| CoreError::Persistence(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionStore, KEY_ID};
    use deskline_domain::UserSession;
    use rusqlite::params;

    fn worker_session() -> UserSession {
        UserSession {
            user_type: "worker".to_owned(),
            name: "Sanne".to_owned(),
            id: "w-7".to_owned(),
        }
    }

    #[test]
    fn fresh_store_reads_as_logged_out() {
        let store = SessionStore::in_memory().expect("open store");
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn store_then_load_round_trips_the_session() {
        let mut store = SessionStore::in_memory().expect("open store");
        store.store(&worker_session()).expect("store session");

        let loaded = store.load().expect("load").expect("session present");
        assert_eq!(loaded, worker_session());
        assert!(!loaded.is_admin());
    }

    #[test]
    fn clear_logs_the_session_out() {
        let mut store = SessionStore::in_memory().expect("open store");
        store.store(&worker_session()).expect("store session");
        store.clear().expect("clear session");
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn partial_rows_read_as_logged_out() {
        let mut store = SessionStore::in_memory().expect("open store");
        store.store(&worker_session()).expect("store session");
        store
            .conn
            .execute(
                "DELETE FROM session_entries WHERE key = ?1",
                params![KEY_ID],
            )
            .expect("drop one entry");

        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn sessions_survive_a_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("session.db");

        {
            let mut store = SessionStore::open(&path).expect("open store");
            store.store(&worker_session()).expect("store session");
        }

        let reopened = SessionStore::open(&path).expect("reopen store");
        let loaded = reopened.load().expect("load").expect("session present");
        assert_eq!(loaded.name, "Sanne");
    }
}
