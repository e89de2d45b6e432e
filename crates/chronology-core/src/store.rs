//! Subject metadata storage.
//!
//! The queue only needs a key-value slot per subject. [`FileMetaStore`] keeps
//! one YAML document per subject under `.chronology/meta/`; [`MemoryMetaStore`]
//! keeps everything in process.

use crate::error::Result;
use crate::{io, paths};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Key-value metadata attached to subjects.
pub trait MetaStore {
    /// Read the value stored under `key` for a subject, if any.
    fn read(&self, subject_id: u64, key: &str) -> Result<Option<serde_json::Value>>;

    /// Replace the value stored under `key` for a subject.
    fn write(&self, subject_id: u64, key: &str, value: serde_json::Value) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileMetaStore
// ---------------------------------------------------------------------------

type MetaDocument = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone)]
pub struct FileMetaStore {
    root: PathBuf,
}

impl FileMetaStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn load_document(&self, subject_id: u64) -> Result<MetaDocument> {
        let path = paths::subject_meta_path(&self.root, subject_id);
        if !path.exists() {
            return Ok(MetaDocument::new());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(MetaDocument::new());
        }
        Ok(serde_yaml::from_str(&data)?)
    }
}

impl MetaStore for FileMetaStore {
    fn read(&self, subject_id: u64, key: &str) -> Result<Option<serde_json::Value>> {
        let mut doc = self.load_document(subject_id)?;
        Ok(doc.remove(key))
    }

    fn write(&self, subject_id: u64, key: &str, value: serde_json::Value) -> Result<()> {
        let mut doc = self.load_document(subject_id)?;
        doc.insert(key.to_string(), value);
        let path = paths::subject_meta_path(&self.root, subject_id);
        let data = serde_yaml::to_string(&doc)?;
        io::atomic_write(&path, data.as_bytes())?;
        tracing::debug!(subject_id, key, path = %path.display(), "wrote subject metadata");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryMetaStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryMetaStore {
    values: RefCell<HashMap<(u64, String), serde_json::Value>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetaStore for MemoryMetaStore {
    fn read(&self, subject_id: u64, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self
            .values
            .borrow()
            .get(&(subject_id, key.to_string()))
            .cloned())
    }

    fn write(&self, subject_id: u64, key: &str, value: serde_json::Value) -> Result<()> {
        self.values
            .borrow_mut()
            .insert((subject_id, key.to_string()), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn file_store_missing_subject_reads_none() {
        let dir = TempDir::new().unwrap();
        let store = FileMetaStore::new(dir.path());
        assert!(store.read(5, "_chronology_queue").unwrap().is_none());
    }

    #[test]
    fn file_store_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FileMetaStore::new(dir.path());
        let value = json!([{"timestamp": 1700000000, "action": "publish_post"}]);
        store.write(5, "_chronology_queue", value.clone()).unwrap();

        assert!(paths::subject_meta_path(dir.path(), 5).exists());
        assert_eq!(store.read(5, "_chronology_queue").unwrap(), Some(value));
    }

    #[test]
    fn file_store_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileMetaStore::new(dir.path());
        store.write(5, "_edit_lock", json!("1700000000:1")).unwrap();
        store.write(5, "_chronology_queue", json!([])).unwrap();

        assert_eq!(
            store.read(5, "_edit_lock").unwrap(),
            Some(json!("1700000000:1"))
        );
        assert_eq!(store.read(5, "_chronology_queue").unwrap(), Some(json!([])));
    }

    #[test]
    fn file_store_subjects_are_isolated() {
        let dir = TempDir::new().unwrap();
        let store = FileMetaStore::new(dir.path());
        store.write(1, "k", json!("one")).unwrap();
        assert!(store.read(2, "k").unwrap().is_none());
    }

    #[test]
    fn file_store_empty_document_reads_none() {
        let dir = TempDir::new().unwrap();
        let path = paths::subject_meta_path(dir.path(), 3);
        io::atomic_write(&path, b"").unwrap();
        let store = FileMetaStore::new(dir.path());
        assert!(store.read(3, "k").unwrap().is_none());
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryMetaStore::new();
        store.write(1, "k", json!(1)).unwrap();
        store.write(1, "k", json!(2)).unwrap();
        assert_eq!(store.read(1, "k").unwrap(), Some(json!(2)));
        assert!(store.read(1, "other").unwrap().is_none());
    }
}
