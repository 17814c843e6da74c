use anyhow::Result;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Storage keys, one per collection plus the init guard and the id counter.
pub const USERS: &str = "planner_users";
pub const TASKS: &str = "planner_tasks";
pub const ACTIVITIES: &str = "planner_activities";
pub const INITIALIZED: &str = "planner_initialized";
const NEXT_ID: &str = "planner_next_id";

/// Minimal durable key-value capability. Injected into [`RecordStore`] so
/// the repositories can be exercised against an in-memory fake.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

fn set_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

/// SQLite-backed key-value storage: one row per collection blob.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        set_pragmas(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query_map([key], |row| row.get(0))?;
        match rows.next() {
            Some(value) => Ok(Some(value?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// In-memory fake for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    map: std::cell::RefCell<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

/// Mapping from a collection name to its serialized record list.
///
/// Storage failures degrade rather than surface: reads fall back to an
/// empty list, writes are dropped, and either way a warning lands on
/// stderr. Callers never see a storage error.
pub struct RecordStore {
    storage: Box<dyn Storage>,
}

impl RecordStore {
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self {
            storage: Box::new(SqliteStorage::open(path)?),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            storage: Box::new(MemoryStorage::default()),
        }
    }

    #[cfg(test)]
    pub fn with_storage(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Full record list for a collection. Missing key means the collection
    /// was never written and yields an empty list, not an error.
    pub fn read_records<T: DeserializeOwned>(&self, collection: &str) -> Vec<T> {
        let raw = match self.storage.read(collection) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                eprintln!("warning: failed to read '{collection}': {e}");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                eprintln!("warning: corrupt records in '{collection}': {e}");
                Vec::new()
            }
        }
    }

    /// Replace the full record list for a collection. Every write is a
    /// whole-collection replacement; there are no partial updates.
    pub fn write_records<T: Serialize>(&self, collection: &str, records: &[T]) {
        let raw = match serde_json::to_string(records) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("warning: failed to serialize '{collection}': {e}");
                return;
            }
        };
        if let Err(e) = self.storage.write(collection, &raw) {
            eprintln!("warning: failed to write '{collection}': {e}");
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.storage.read(key), Ok(Some(_)))
    }

    pub fn set_flag(&self, key: &str) {
        if let Err(e) = self.storage.write(key, "true") {
            eprintln!("warning: failed to write '{key}': {e}");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            eprintln!("warning: failed to remove '{key}': {e}");
        }
    }

    /// Next record id from the persisted counter. Strictly increasing for
    /// the lifetime of the store, always > 0.
    pub fn next_id(&self) -> i64 {
        let next = match self.storage.read(NEXT_ID) {
            Ok(Some(raw)) => raw.trim().parse::<i64>().unwrap_or(1),
            _ => 1,
        };
        if let Err(e) = self.storage.write(NEXT_ID, &(next + 1).to_string()) {
            eprintln!("warning: failed to advance id counter: {e}");
        }
        next
    }

    /// Raise the id counter so future ids never collide with fixed-id
    /// records written by the seeding paths.
    pub fn ensure_next_id(&self, at_least: i64) {
        let current = match self.storage.read(NEXT_ID) {
            Ok(Some(raw)) => raw.trim().parse::<i64>().unwrap_or(1),
            _ => 1,
        };
        if current < at_least {
            if let Err(e) = self.storage.write(NEXT_ID, &at_least.to_string()) {
                eprintln!("warning: failed to advance id counter: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Task};

    fn make_task(id: i64, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: None,
            status: "todo".to_string(),
            priority: Priority::Medium,
            start_time: None,
            deadline: None,
            created_at: "2025-06-01T09:00:00Z".to_string(),
            assigned_to: None,
        }
    }

    #[test]
    fn roundtrip_preserves_order() {
        let store = RecordStore::in_memory();
        let tasks = vec![make_task(3, "c"), make_task(1, "a"), make_task(2, "b")];
        store.write_records(TASKS, &tasks);
        let read: Vec<Task> = store.read_records(TASKS);
        assert_eq!(read, tasks);
    }

    #[test]
    fn read_uninitialized_collection_is_empty() {
        let store = RecordStore::in_memory();
        let read: Vec<Task> = store.read_records(TASKS);
        assert!(read.is_empty());
    }

    #[test]
    fn corrupt_blob_degrades_to_empty() {
        let storage = MemoryStorage::default();
        storage.write(TASKS, "{not json").unwrap();
        let store = RecordStore::with_storage(Box::new(storage));
        let read: Vec<Task> = store.read_records(TASKS);
        assert!(read.is_empty());
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let store = RecordStore::in_memory();
        let a = store.next_id();
        let b = store.next_id();
        assert!(a > 0);
        assert!(b > a);
    }

    #[test]
    fn ensure_next_id_never_lowers_the_counter() {
        let store = RecordStore::in_memory();
        store.ensure_next_id(100);
        assert_eq!(store.next_id(), 100);
        store.ensure_next_id(50);
        assert_eq!(store.next_id(), 101);
    }

    #[test]
    fn flags_set_and_remove() {
        let store = RecordStore::in_memory();
        assert!(!store.contains(INITIALIZED));
        store.set_flag(INITIALIZED);
        assert!(store.contains(INITIALIZED));
        store.remove(INITIALIZED);
        assert!(!store.contains(INITIALIZED));
    }

    #[test]
    fn sqlite_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.db");
        let path = path.to_str().unwrap();

        let store = RecordStore::open(path).unwrap();
        store.write_records(TASKS, &[make_task(1, "persisted")]);
        let first_id = store.next_id();
        drop(store);

        let store = RecordStore::open(path).unwrap();
        let read: Vec<Task> = store.read_records(TASKS);
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].title, "persisted");
        assert!(store.next_id() > first_id);
    }
}
