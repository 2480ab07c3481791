//! SQLite-backed key-value storage.
//!
//! Every record family (words, progress, settings, sessions) is a JSON
//! document under a fixed key in the `kv` table. Domain operations are
//! implemented on [`Database`] in the sibling modules.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::data_dir;
use crate::error::{DatabaseError, Result};

/// SQLite database holding the app's key-value documents.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/wordblock.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("wordblock.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove keys from the kv store.
    ///
    /// Runs inside the caller's transaction when one is open.
    pub fn kv_remove(&self, keys: &[&str]) -> Result<(), DatabaseError> {
        let tx = if self.conn.is_autocommit() {
            Some(self.conn.unchecked_transaction()?)
        } else {
            None
        };
        for key in keys {
            self.conn
                .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        if let Some(tx) = tx {
            tx.commit()?;
        }
        Ok(())
    }

    /// Read a JSON document, falling back to `default` when the key is
    /// absent or the stored document does not parse.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        match self.kv_get(key)? {
            None => Ok(default),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!(key, error = %e, "stored document is unreadable, using default");
                    Ok(default)
                }
            },
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.kv_set(key, &raw)?;
        Ok(())
    }
}

/// A [`Database`] shared between the poller task and foreground callers.
/// Writes are last-write-wins.
pub struct SharedDatabase(Mutex<Database>);

impl SharedDatabase {
    pub fn new(db: Database) -> Self {
        Self(Mutex::new(db))
    }

    /// Run `f` with exclusive access to the database.
    pub fn with<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let guard = self.0.lock().map_err(|_| DatabaseError::Poisoned)?;
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_remove(&["test"]).unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn kv_remove_joins_open_transaction() {
        let db = Database::open_memory().unwrap();
        db.kv_set("a", "1").unwrap();
        db.kv_set("b", "2").unwrap();

        let tx = db.conn().unchecked_transaction().unwrap();
        db.kv_remove(&["a"]).unwrap();
        tx.rollback().unwrap();
        assert_eq!(db.kv_get("a").unwrap().as_deref(), Some("1"));

        let tx = db.conn().unchecked_transaction().unwrap();
        db.kv_remove(&["a", "b"]).unwrap();
        tx.commit().unwrap();
        assert!(db.kv_get("a").unwrap().is_none());
        assert!(db.kv_get("b").unwrap().is_none());
    }

    #[test]
    fn unreadable_json_falls_back_to_default() {
        let db = Database::open_memory().unwrap();
        db.kv_set("words", "{not json").unwrap();
        let words: Vec<String> = db.get_json("words", Vec::new()).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordblock.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.set_json("last_sync", &42u64).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.get_json("last_sync", 0u64).unwrap(), 42);
    }
}
