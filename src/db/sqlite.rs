//! SQLite backing medium.

use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::schema::SCHEMA;
use super::KeyValueBackend;
use crate::error::{StoreError, StoreResult};

pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn initialize(&self) -> StoreResult<()> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::PersistenceUnavailable("connection lock poisoned".to_string()))
    }
}

impl KeyValueBackend for SqliteBackend {
    fn get_all_keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM entries ORDER BY rowid")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn get_many(&self, keys: &[String]) -> StoreResult<Vec<(String, Option<String>)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM entries WHERE key = ?")?;
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let value = stmt
                .query_row([key], |row| row.get::<_, String>(0))
                .optional()?;
            results.push((key.clone(), value));
        }
        Ok(results)
    }

    fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
        // Upsert keeps the original rowid, so an overwritten key stays in place.
        self.lock()?.execute(
            r#"
            INSERT INTO entries (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn clear_all(&self) -> StoreResult<()> {
        self.lock()?.execute("DELETE FROM entries", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_temp() -> (tempfile::TempDir, SqliteBackend) {
        let dir = tempdir().unwrap();
        let backend = SqliteBackend::open(&dir.path().join("nested/photos.db")).unwrap();
        backend.initialize().unwrap();
        (dir, backend)
    }

    #[test]
    fn test_keys_in_insertion_order() {
        let (_dir, backend) = open_temp();
        backend.set_value("photo-3", "c").unwrap();
        backend.set_value("photo-1", "a").unwrap();
        backend.set_value("photo-2", "b").unwrap();

        assert_eq!(backend.get_all_keys().unwrap(), vec!["photo-3", "photo-1", "photo-2"]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let (_dir, backend) = open_temp();
        backend.set_value("a", "1").unwrap();
        backend.set_value("b", "2").unwrap();
        backend.set_value("a", "3").unwrap();

        let keys = backend.get_all_keys().unwrap();
        assert_eq!(keys, vec!["a", "b"]);
        let values = backend.get_many(&keys).unwrap();
        assert_eq!(values[0], ("a".to_string(), Some("3".to_string())));
    }

    #[test]
    fn test_get_many_missing_key() {
        let (_dir, backend) = open_temp();
        backend.set_value("a", "1").unwrap();

        let values = backend
            .get_many(&["a".to_string(), "gone".to_string()])
            .unwrap();
        assert_eq!(values[1], ("gone".to_string(), None));
    }

    #[test]
    fn test_clear_all_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photos.db");
        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.initialize().unwrap();
            backend.set_value("a", "1").unwrap();
        }
        let backend = SqliteBackend::open(&path).unwrap();
        backend.initialize().unwrap();
        assert_eq!(backend.get_all_keys().unwrap(), vec!["a"]);

        backend.clear_all().unwrap();
        backend.clear_all().unwrap();
        assert!(backend.get_all_keys().unwrap().is_empty());
    }

    #[test]
    fn test_uninitialized_reports_unavailable() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let err = backend.get_all_keys().unwrap_err();
        assert!(matches!(err, StoreError::PersistenceUnavailable(_)));
    }
}
