//! Persistent storage using redb.
//!
//! One database file per data directory holds:
//! - The device identity (the chosen display name, under a fixed key)
//! - The message table used by the local backend

use crate::error::ChatError;
use crate::message::Message;
use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

// Table definitions
const IDENTITY_TABLE: TableDefinition<&str, &str> = TableDefinition::new("identity");
const MESSAGES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");

/// Fixed key of the persisted display name
pub const DISPLAY_NAME_KEY: &str = "chat-username";

/// Storage layer using redb for ACID-compliant persistence
#[derive(Clone)]
pub struct Storage {
    db: Arc<RwLock<Database>>,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will:
    /// - Create the database directory if it doesn't exist
    /// - Initialize the database file
    /// - Create all required tables
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(IDENTITY_TABLE)?;
            let _ = write_txn.open_table(MESSAGES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Identity Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Persist the display name, replacing any previous one.
    pub fn save_display_name(&self, name: &str) -> Result<(), ChatError> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(IDENTITY_TABLE)?;
            table.insert(DISPLAY_NAME_KEY, name)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load the persisted display name.
    ///
    /// Returns `None` if no name has been chosen on this device yet.
    pub fn load_display_name(&self) -> Result<Option<String>, ChatError> {
        let db = self.db.read();
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(IDENTITY_TABLE)?;

        Ok(table.get(DISPLAY_NAME_KEY)?.map(|v| v.value().to_string()))
    }

    /// Forget the persisted display name.
    pub fn clear_display_name(&self) -> Result<(), ChatError> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(IDENTITY_TABLE)?;
            table.remove(DISPLAY_NAME_KEY)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Message Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Store a message under its id.
    pub fn insert_message(&self, message: &Message) -> Result<(), ChatError> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(MESSAGES_TABLE)?;
            let data = serde_json::to_vec(message)?;
            table.insert(message.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load all messages, oldest first.
    ///
    /// Keys are ULIDs, so key order is insertion order; the stable sort on
    /// `created_at` only matters for rows written with foreign ids.
    pub fn list_messages(&self) -> Result<Vec<Message>, ChatError> {
        let db = self.db.read();
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(MESSAGES_TABLE)?;

        let mut messages = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let message: Message = serde_json::from_slice(value.value())?;
            messages.push(message);
        }
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    /// Remove a message. Returns whether it existed.
    pub fn remove_message(&self, id: &str) -> Result<bool, ChatError> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(MESSAGES_TABLE)?;
            let removed = table.remove(id)?;
            removed.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NewMessage;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.redb");
        let storage = Storage::new(&db_path).unwrap();
        (storage, temp_dir)
    }

    fn message(id: &str, body: &str, offset_secs: i64) -> Message {
        NewMessage::new("alice", body, None)
            .unwrap()
            .into_message(id.to_string(), Utc::now() + Duration::seconds(offset_secs))
    }

    #[test]
    fn test_storage_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested/path/to/test.redb");
        let storage = Storage::new(&db_path);
        assert!(storage.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_display_name_roundtrip() {
        let (storage, _temp) = create_test_storage();

        assert!(storage.load_display_name().unwrap().is_none());
        storage.save_display_name("Ada").unwrap();
        assert_eq!(storage.load_display_name().unwrap().as_deref(), Some("Ada"));

        storage.save_display_name("Grace").unwrap();
        assert_eq!(
            storage.load_display_name().unwrap().as_deref(),
            Some("Grace")
        );

        storage.clear_display_name().unwrap();
        assert!(storage.load_display_name().unwrap().is_none());
    }

    #[test]
    fn test_display_name_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.redb");

        {
            let storage = Storage::new(&db_path).unwrap();
            storage.save_display_name("Ada").unwrap();
        }

        {
            let storage = Storage::new(&db_path).unwrap();
            assert_eq!(storage.load_display_name().unwrap().as_deref(), Some("Ada"));
        }
    }

    #[test]
    fn test_messages_listed_oldest_first() {
        let (storage, _temp) = create_test_storage();

        storage.insert_message(&message("b", "second", 10)).unwrap();
        storage.insert_message(&message("a", "first", 0)).unwrap();
        storage.insert_message(&message("c", "third", 20)).unwrap();

        let bodies: Vec<_> = storage
            .list_messages()
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_remove_message() {
        let (storage, _temp) = create_test_storage();
        storage.insert_message(&message("a", "bye", 0)).unwrap();

        assert_eq!(storage.list_messages().unwrap().len(), 1);
        assert!(storage.remove_message("a").unwrap());
        assert!(storage.list_messages().unwrap().is_empty());
        assert!(!storage.remove_message("a").unwrap());
    }
}
