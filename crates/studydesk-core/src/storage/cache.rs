//! Persistent key/value cache.
//!
//! The local cache is the only state shared between runs (and between
//! concurrent instances; last writer wins). Values are JSON strings.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::data_dir;
use crate::error::{CacheError, CoreError};

pub trait LocalCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&mut self, key: &str) -> Result<(), CacheError>;
}

/// Read and decode a JSON value. A failing cache or an undecodable blob is
/// logged and treated as absent.
pub fn load_json<T, C>(cache: &C, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    C: LocalCache + ?Sized,
{
    let raw = match cache.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(key, error = %err, "local cache read failed, using defaults");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding invalid persisted JSON");
            None
        }
    }
}

/// Encode `value` as JSON and write it under `key`.
pub fn store_json<T, C>(cache: &mut C, key: &str, value: &T) -> Result<(), CacheError>
where
    T: Serialize + ?Sized,
    C: LocalCache + ?Sized,
{
    let json = serde_json::to_string(value).map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })?;
    cache.set(key, &json)
}

/// SQLite-backed cache in `<data_dir>/studydesk.db`.
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open the cache at `~/.config/studydesk/studydesk.db`.
    pub fn open_default() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studydesk.db");
        Ok(Self::open(&path)?)
    }

    /// Open (creating if needed) the cache database at `path`.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|source| CacheError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let cache = Self { conn };
        cache.migrate()?;
        Ok(cache)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.migrate()?;
        Ok(cache)
    }

    fn migrate(&self) -> Result<(), CacheError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl LocalCache for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Process-lifetime cache. Also the fallback when no persistence exists.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}
