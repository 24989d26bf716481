/// HNSW dense-vector index (approximate nearest neighbor, cosine)
use crate::index::{DenseIndex, DocId, IndexError};
use hnsw_rs::prelude::*;
use serde_json::Value;
use std::sync::RwLock;

/// Dense ANN index adapter
///
/// Scores are cosine similarities (1 - distance on normalized vectors).
pub struct HnswDenseIndex {
    index: RwLock<Hnsw<'static, f32, DistCosine>>,
    dimension: usize,
    ef_search: usize,
    count: RwLock<u64>,
}

impl HnswDenseIndex {
    /// Create a new index
    ///
    /// # Arguments
    /// * `dimension` - Vector dimension (must match the embedding provider)
    /// * `ef_construction` - HNSW build parameter (higher = better recall)
    /// * `m` - HNSW connections per layer
    /// * `ef_search` - HNSW query-time beam width
    pub fn new(dimension: usize, ef_construction: usize, m: usize, ef_search: usize) -> Self {
        let index = Hnsw::<f32, DistCosine>::new(
            m,
            dimension,
            ef_construction,
            200, // max_nb_connection
            DistCosine,
        );

        Self {
            index: RwLock::new(index),
            dimension,
            ef_search,
            count: RwLock::new(0),
        }
    }

    /// Insert a document embedding
    pub fn insert(&self, id: DocId, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let data = vector.to_vec();
        let index = self
            .index
            .write()
            .map_err(|_| IndexError::Insert("Index lock poisoned".to_string()))?;
        index.insert((&data, id as usize));

        let mut count = self
            .count
            .write()
            .map_err(|_| IndexError::Insert("Count lock poisoned".to_string()))?;
        *count += 1;

        Ok(())
    }

    /// Insert multiple embeddings
    pub fn insert_batch(&self, items: &[(DocId, Vec<f32>)]) -> Result<(), IndexError> {
        for (id, vector) in items {
            self.insert(*id, vector)?;
        }
        Ok(())
    }

    /// Number of indexed vectors
    pub fn len(&self) -> u64 {
        self.count.read().map(|c| *c).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl DenseIndex for HnswDenseIndex {
    fn search(
        &self,
        embedding: &[f32],
        limit: usize,
        _filters: Option<&Value>,
    ) -> Result<Vec<(DocId, f32)>, IndexError> {
        if embedding.len() != self.dimension {
            return Err(IndexError::InvalidDimension {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let index = self
            .index
            .read()
            .map_err(|_| IndexError::Query("Index lock poisoned".to_string()))?;

        let neighbors = index.search(embedding, limit, self.ef_search);

        Ok(neighbors
            .into_iter()
            .map(|neighbor| (neighbor.d_id as DocId, 1.0 - neighbor.distance))
            .collect())
    }
}
