//! Index boundary: the engine queries three pre-built indexes and a document
//! store through these traits. Index construction and maintenance belong to
//! the caller; the adapters here only expose what the query path needs plus
//! minimal insert methods for building test corpora.

mod dense;
mod lexical;
mod memory;
mod sparse;

pub use dense::HnswDenseIndex;
pub use lexical::TantivyLexicalIndex;
pub use memory::InMemoryDocumentStore;
pub use sparse::InvertedSparseIndex;

use crate::embedding::SparseVector;
use serde_json::Value;
use thiserror::Error;

/// Opaque document identifier; ordering is only used for deterministic
/// tie-breaks, never for relevance
pub type DocId = u64;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Insert failed: {0}")]
    Insert(String),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Full-text (BM25-style) index over document titles and bodies
pub trait LexicalIndex: Send + Sync {
    /// Ranked ids for a text query; `filters` is an opaque predicate passed
    /// through unchanged and may be ignored by implementations
    fn search(
        &self,
        text: &str,
        limit: usize,
        filters: Option<&Value>,
    ) -> Result<Vec<(DocId, f32)>, IndexError>;
}

/// Approximate nearest-neighbor index over dense document embeddings
pub trait DenseIndex: Send + Sync {
    fn search(
        &self,
        embedding: &[f32],
        limit: usize,
        filters: Option<&Value>,
    ) -> Result<Vec<(DocId, f32)>, IndexError>;
}

/// Index over sparse weighted-term document vectors
pub trait SparseIndex: Send + Sync {
    fn search(
        &self,
        vector: &SparseVector,
        limit: usize,
        filters: Option<&Value>,
    ) -> Result<Vec<(DocId, f32)>, IndexError>;
}

/// Display fields for a resolved document
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: DocId,
    pub title: String,
    pub body: String,
}

/// Read-only id-to-document resolution for the final response; not part of
/// ranking logic. An id that resolves to nothing is dropped, not an error.
pub trait DocumentStore: Send + Sync {
    fn get(&self, id: DocId) -> Option<StoredDocument>;
}
