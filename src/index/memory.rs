/// In-memory document store
use crate::index::{DocId, DocumentStore, StoredDocument};
use ahash::AHashMap;
use std::sync::RwLock;

/// Simple process-local document store; resolves ids to display fields for
/// the final response
pub struct InMemoryDocumentStore {
    documents: RwLock<AHashMap<DocId, StoredDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(AHashMap::new()),
        }
    }

    pub fn insert(&self, id: DocId, title: impl Into<String>, body: impl Into<String>) {
        let doc = StoredDocument {
            id,
            title: title.into(),
            body: body.into(),
        };
        if let Ok(mut documents) = self.documents.write() {
            documents.insert(id, doc);
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, id: DocId) -> Option<StoredDocument> {
        self.documents.read().ok()?.get(&id).cloned()
    }
}
