//! Snapshot persistence
//!
//! The engine owns all live state; the external store only ever sees a
//! serialized snapshot under one fixed key. Writes are best-effort
//! write-through: a failed save is logged and swallowed, never rolled
//! back into the in-memory state that triggered it.

use crate::context::ContextMemory;
use crate::knowledge::KnowledgeStore;
use crate::logging;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Logical key the snapshot lives under in the backing store.
pub const STORAGE_KEY: &str = "kawan_learning_system";

// ============ Store boundary ============

/// Minimal durable string store the engine persists into.
pub trait KvStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), BoxError>;
    fn remove(&mut self, key: &str) -> Result<(), BoxError>;
}

/// Default durable backend: a single-table sqlite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BoxError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BoxError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BoxError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-memory backend. Clones share the same entries, which lets tests
/// hand the "same" store to several engine instances. `fail_writes`
/// simulates an unavailable backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        let entries = self.entries.lock().map_err(|_| "store lock poisoned")?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BoxError> {
        if self.fail_writes {
            return Err("backend unavailable".into());
        }
        let mut entries = self.entries.lock().map_err(|_| "store lock poisoned")?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BoxError> {
        let mut entries = self.entries.lock().map_err(|_| "store lock poisoned")?;
        entries.remove(key);
        Ok(())
    }
}

// ============ Snapshot ============

/// Per-engine usage counters, carried with the snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct UserStats {
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub custom_response_hits: u64,
    #[serde(default)]
    pub repeat_question_hits: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub knowledge_base: KnowledgeStore,
    #[serde(default)]
    pub context_memory: ContextMemory,
    #[serde(default)]
    pub user_stats: UserStats,
}

/// Self-contained transferable blob: the snapshot plus when it was taken.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportBlob {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub export_date: String,
}

/// Imported blob where any sub-map may be absent. Import keeps the
/// engine's current state for absent fields instead of emptying them.
#[derive(Debug, Deserialize)]
pub struct ImportedSnapshot {
    pub knowledge_base: Option<KnowledgeStore>,
    pub context_memory: Option<ContextMemory>,
    pub user_stats: Option<UserStats>,
}

// ============ Adapter ============

pub struct PersistenceAdapter {
    store: Box<dyn KvStore>,
}

impl PersistenceAdapter {
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Read the stored snapshot. Any failure (backend unavailable,
    /// malformed blob) is logged and reported as "no prior state".
    pub fn load(&self) -> Option<Snapshot> {
        let blob = match self.store.get(STORAGE_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                logging::log_error(None, &format!("failed to read stored snapshot: {}", e));
                return None;
            }
        };

        match serde_json::from_str(&blob) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                logging::log_error(None, &format!("stored snapshot is malformed: {}", e));
                None
            }
        }
    }

    /// Write the snapshot, best-effort. Errors are logged and swallowed;
    /// the in-memory state stays authoritative either way.
    pub fn save(&mut self, snapshot: &Snapshot) {
        let blob = match serde_json::to_string(snapshot) {
            Ok(blob) => blob,
            Err(e) => {
                logging::log_error(None, &format!("failed to serialize snapshot: {}", e));
                return;
            }
        };

        if let Err(e) = self.store.set(STORAGE_KEY, &blob) {
            logging::log_error(None, &format!("failed to persist snapshot: {}", e));
        } else {
            logging::log_persistence(None, &format!("snapshot persisted ({} bytes)", blob.len()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot
            .knowledge_base
            .record_keyword_occurrence("belajar", Some("R1"), Some("positive"));
        snapshot.user_stats.total_messages = 3;
        snapshot
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let mut store = MemoryStore::new();
        let twin = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(twin.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_sqlite_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kawan.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("k", "v1").unwrap();
            store.set("k", "v2").unwrap();
        }

        // Reopen: values survive the connection.
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_adapter_roundtrip() {
        let store = MemoryStore::new();
        let mut adapter = PersistenceAdapter::new(Box::new(store.clone()));

        assert!(adapter.load().is_none());
        adapter.save(&sample_snapshot());

        let loaded = adapter.load().unwrap();
        assert_eq!(loaded.user_stats.total_messages, 3);
        let entry = loaded.knowledge_base.keyword("belajar").unwrap();
        assert_eq!(entry.responses, vec!["R1"]);
    }

    #[test]
    fn test_adapter_treats_malformed_blob_as_absent() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "not json {{{").unwrap();

        let adapter = PersistenceAdapter::new(Box::new(store));
        assert!(adapter.load().is_none());
    }

    #[test]
    fn test_adapter_swallows_write_failure() {
        let mut store = MemoryStore::new();
        store.fail_writes = true;

        let mut adapter = PersistenceAdapter::new(Box::new(store));
        adapter.save(&sample_snapshot()); // must not panic or propagate
        assert!(adapter.load().is_none());
    }

    #[test]
    fn test_export_blob_parses_back_as_snapshot() {
        let blob = ExportBlob {
            snapshot: sample_snapshot(),
            export_date: chrono::Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string(&blob).unwrap();

        // export_date rides along at the top level and is ignored on import.
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.user_stats.total_messages, 3);
    }
}
