//! In-process document store, used by tests and benchmarks

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{merge_fields, DocumentStore};
use crate::types::{DashError, Document, Result};

type Collection = BTreeMap<String, Document>;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a whole document
    pub fn insert(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| DashError::Store("memory store lock poisoned".into()))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    /// Builder form of [`MemoryStore::insert`] taking a JSON object literal.
    /// Non-object values are stored as empty documents.
    pub fn with(self, collection: &str, id: &str, value: serde_json::Value) -> Self {
        let doc = match value {
            serde_json::Value::Object(map) => map,
            _ => Document::new(),
        };
        if let Ok(mut collections) = self.collections.write() {
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), doc);
        }
        self
    }
}

impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DashError::Store("memory store lock poisoned".into()))?;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    fn get_documents(&self, collection: &str, ids: &[&str]) -> Result<Vec<Option<Document>>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DashError::Store("memory store lock poisoned".into()))?;
        let docs = collections.get(collection);
        Ok(ids
            .iter()
            .map(|id| docs.and_then(|c| c.get(*id)).cloned())
            .collect())
    }

    fn stream_collection(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DashError::Store("memory store lock poisoned".into()))?;
        Ok(collections
            .get(collection)
            .map(|c| c.iter().map(|(id, doc)| (id.clone(), doc.clone())).collect())
            .unwrap_or_default())
    }

    fn patch_document(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| DashError::Store("memory store lock poisoned".into()))?;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| DashError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        merge_fields(doc, fields);
        Ok(())
    }
}
