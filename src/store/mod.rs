//! Document store trait and backends
//!
//! The dashboard never owns account data; it reads and patches documents in
//! collections that some other system created. Backends only need to offer
//! lookup by id, a full collection scan, and a single-document field merge.

mod json_dir;
mod memory;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use crate::types::{Document, Result};

/// Collection holding one document per user, keyed by user id
pub const USERS: &str = "users";
/// Collection holding each user's worksheet map, keyed by user id
pub const WORKSHEETS: &str = "worksheets";
/// Collection holding each user's search counters, keyed by user id
pub const SEARCH_USAGE: &str = "search-usage";
/// Collection holding assistant feedback records
pub const FEEDBACK: &str = "v4-feedback";

/// Trait for key/document databases the dashboard reads from
pub trait DocumentStore: Send + Sync {
    /// Backend name for logs (e.g., "memory", "json-dir")
    fn name(&self) -> &str;

    /// Fetch one document; `Ok(None)` when it does not exist
    fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Fetch several documents of one collection, in the order of `ids`.
    ///
    /// Backends that load a collection as a unit override this to read it once.
    fn get_documents(&self, collection: &str, ids: &[&str]) -> Result<Vec<Option<Document>>> {
        ids.iter()
            .map(|id| self.get_document(collection, id))
            .collect()
    }

    /// All `(id, document)` pairs of a collection, ordered by id.
    /// A collection that does not exist yields an empty list.
    fn stream_collection(&self, collection: &str) -> Result<Vec<(String, Document)>>;

    /// Merge `fields` into an existing document.
    ///
    /// Fails with `DashError::NotFound` if the document is absent. The merge is
    /// applied atomically: either every field is written or none is.
    fn patch_document(&self, collection: &str, id: &str, fields: Document) -> Result<()>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        (**self).get_document(collection, id)
    }

    fn get_documents(&self, collection: &str, ids: &[&str]) -> Result<Vec<Option<Document>>> {
        (**self).get_documents(collection, ids)
    }

    fn stream_collection(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        (**self).stream_collection(collection)
    }

    fn patch_document(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        (**self).patch_document(collection, id, fields)
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        (**self).get_document(collection, id)
    }

    fn get_documents(&self, collection: &str, ids: &[&str]) -> Result<Vec<Option<Document>>> {
        (**self).get_documents(collection, ids)
    }

    fn stream_collection(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        (**self).stream_collection(collection)
    }

    fn patch_document(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        (**self).patch_document(collection, id, fields)
    }
}

/// Shallow merge used by every backend: top-level fields are replaced
pub(crate) fn merge_fields(target: &mut Document, fields: Document) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}
