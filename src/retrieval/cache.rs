//! Shared rerank score cache
//!
//! Keyed by a deterministic hash of (query text, sorted candidate id set);
//! values are complete ordered score lists. The cache is the only state
//! shared across concurrent queries: a single lock guards map and eviction
//! order, entries are immutable once inserted (readers clone an `Arc`), so a
//! torn read is impossible. A benign race that computes the same key twice
//! just overwrites with an identical value.

use crate::index::DocId;
use ahash::AHashMap;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

struct CacheInner {
    entries: AHashMap<String, Arc<Vec<(DocId, f32)>>>,
    insertion_order: VecDeque<String>,
}

/// Process-wide rerank score cache
pub struct RerankCache {
    inner: RwLock<CacheInner>,
    /// 0 means unbounded
    capacity: usize,
}

impl RerankCache {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: AHashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Deterministic key for a (query, candidate set) pair. The candidate ids
    /// are sorted and deduplicated first, so candidate order does not matter.
    pub fn key(query: &str, candidates: &[DocId]) -> String {
        let mut ids: Vec<DocId> = candidates.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&(query.len() as u64).to_le_bytes());
        hasher.update(query.as_bytes());
        for id in &ids {
            hasher.update(&id.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<(DocId, f32)>>> {
        self.inner.read().ok()?.entries.get(key).cloned()
    }

    /// Insert a fully-computed score list. Partial (deadline-truncated)
    /// results must not be inserted; callers enforce that.
    pub fn insert(&self, key: String, scores: Vec<(DocId, f32)>) {
        let Ok(mut inner) = self.inner.write() else {
            return;
        };

        if inner.entries.insert(key.clone(), Arc::new(scores)).is_none() {
            inner.insertion_order.push_back(key);
        }

        if self.capacity > 0 {
            while inner.entries.len() > self.capacity {
                match inner.insertion_order.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RerankCache {
    fn default() -> Self {
        Self::new()
    }
}
