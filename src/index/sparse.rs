/// In-memory inverted index over sparse weighted-term vectors
use crate::embedding::SparseVector;
use crate::index::{DocId, IndexError, SparseIndex};
use ahash::AHashMap;
use serde_json::Value;
use std::sync::RwLock;

/// Sparse-vector index adapter
///
/// Postings map term id to (doc, weight) pairs; a query is scored by
/// accumulating dot-product contributions over its terms only, so cost is
/// proportional to the touched postings rather than the corpus.
pub struct InvertedSparseIndex {
    postings: RwLock<AHashMap<u32, Vec<(DocId, f32)>>>,
    count: RwLock<u64>,
}

impl InvertedSparseIndex {
    pub fn new() -> Self {
        Self {
            postings: RwLock::new(AHashMap::new()),
            count: RwLock::new(0),
        }
    }

    /// Index a document's sparse vector
    pub fn insert(&self, id: DocId, vector: &SparseVector) -> Result<(), IndexError> {
        let mut postings = self
            .postings
            .write()
            .map_err(|_| IndexError::Insert("Postings lock poisoned".to_string()))?;

        for (term, weight) in vector.entries() {
            postings.entry(*term).or_default().push((id, *weight));
        }

        let mut count = self
            .count
            .write()
            .map_err(|_| IndexError::Insert("Count lock poisoned".to_string()))?;
        *count += 1;

        Ok(())
    }

    /// Number of indexed documents
    pub fn len(&self) -> u64 {
        self.count.read().map(|c| *c).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InvertedSparseIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseIndex for InvertedSparseIndex {
    fn search(
        &self,
        vector: &SparseVector,
        limit: usize,
        _filters: Option<&Value>,
    ) -> Result<Vec<(DocId, f32)>, IndexError> {
        if vector.is_empty() {
            return Ok(Vec::new());
        }

        let postings = self
            .postings
            .read()
            .map_err(|_| IndexError::Query("Postings lock poisoned".to_string()))?;

        let mut scores: AHashMap<DocId, f32> = AHashMap::new();
        for (term, query_weight) in vector.entries() {
            if let Some(docs) = postings.get(term) {
                for (id, doc_weight) in docs {
                    *scores.entry(*id).or_insert(0.0) += query_weight * doc_weight;
                }
            }
        }

        let mut results: Vec<(DocId, f32)> = scores.into_iter().collect();
        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        results.truncate(limit);

        Ok(results)
    }
}
