//! Document store backed by a directory of JSON files
//!
//! Each collection lives in `<root>/<collection>.json` as a single object
//! mapping document id to document. Readers take a shared lock on a sibling
//! `.<collection>.lock` file; patches take an exclusive lock, rewrite the
//! collection to a temp file and rename it into place.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use super::{merge_fields, DocumentStore};
use crate::types::{DashError, Document, Result};

type Collection = BTreeMap<String, Document>;

pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Open a store rooted at `root`. The directory must already exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DashError::Store(format!(
                "store directory {} does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }

    fn lock_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!(".{}.lock", collection))
    }

    fn open_lock(&self, collection: &str) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path(collection))
            .map_err(|e| DashError::Store(format!("failed to open lock for {}: {}", collection, e)))
    }

    /// Read a collection file; caller holds the lock
    fn read_collection(&self, collection: &str) -> Result<Collection> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Collection::new());
        }

        let mut content = String::new();
        File::open(&path)?.read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Collection::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            DashError::Parse(format!("corrupted collection {}: {}", path.display(), e))
        })
    }

    fn load(&self, collection: &str) -> Result<Collection> {
        let lock = self.open_lock(collection)?;
        lock.lock_shared()
            .map_err(|e| DashError::Store(format!("failed to acquire read lock: {}", e)))?;
        let result = self.read_collection(collection);
        let _ = lock.unlock();
        result
    }

    /// Save using atomic write (temp file + rename); caller holds the exclusive lock
    fn write_collection(&self, collection: &str, docs: &Collection) -> Result<()> {
        let content = serde_json::to_string_pretty(docs)
            .map_err(|e| DashError::Store(format!("serialization failed: {}", e)))?;

        let path = self.collection_path(collection);
        let temp_path = path.with_extension("json.tmp");

        {
            let mut file = File::create(&temp_path)
                .map_err(|e| DashError::Store(format!("failed to create temp file: {}", e)))?;
            file.write_all(content.as_bytes())
                .map_err(|e| DashError::Store(format!("failed to write temp file: {}", e)))?;
            file.sync_all()
                .map_err(|e| DashError::Store(format!("failed to sync temp file: {}", e)))?;
        }

        fs::rename(&temp_path, &path)
            .map_err(|e| DashError::Store(format!("failed to rename temp file: {}", e)))?;
        Ok(())
    }
}

impl DocumentStore for JsonDirStore {
    fn name(&self) -> &str {
        "json-dir"
    }

    fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let mut docs = self.load(collection)?;
        Ok(docs.remove(id))
    }

    fn get_documents(&self, collection: &str, ids: &[&str]) -> Result<Vec<Option<Document>>> {
        let docs = self.load(collection)?;
        debug!(collection, requested = ids.len(), "batch read");
        Ok(ids.iter().map(|id| docs.get(*id).cloned()).collect())
    }

    fn stream_collection(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        let docs = self.load(collection)?;
        debug!(collection, count = docs.len(), "streamed collection");
        Ok(docs.into_iter().collect())
    }

    fn patch_document(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        let lock = self.open_lock(collection)?;
        lock.lock_exclusive()
            .map_err(|e| DashError::Store(format!("failed to acquire write lock: {}", e)))?;

        let result = (|| -> Result<()> {
            let mut docs = self.read_collection(collection)?;
            let doc = docs.get_mut(id).ok_or_else(|| DashError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
            merge_fields(doc, fields);
            self.write_collection(collection, &docs)
        })();

        let _ = lock.unlock();
        result
    }
}
