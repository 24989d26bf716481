//! Sparse weighted-term query encoding
//!
//! Produces the high-dimensional, mostly-zero term vectors consumed by the
//! sparse retrieval channel. Two encoders are provided: a SPLADE model via
//! FastEmbed, and a deterministic hashed bag-of-words encoder that needs no
//! model download.

use fastembed::{SparseInitOptions, SparseModel, SparseTextEmbedding};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SparseEncodeError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Sparse encoding failed: {0}")]
    EncodingError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Weighted term vector: unique term ids with positive weights, sorted by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// Build a vector from raw (term_id, weight) pairs; duplicate term ids
    /// have their weights summed
    pub fn new(mut entries: Vec<(u32, f32)>) -> Self {
        entries.sort_unstable_by_key(|(term, _)| *term);

        let mut merged: Vec<(u32, f32)> = Vec::with_capacity(entries.len());
        for (term, weight) in entries {
            match merged.last_mut() {
                Some((last, w)) if *last == term => *w += weight,
                _ => merged.push((term, weight)),
            }
        }
        merged.retain(|(_, w)| *w > 0.0);

        Self { entries: merged }
    }

    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product with another sparse vector (merge join over sorted ids)
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;

        while i < self.entries.len() && j < other.entries.len() {
            let (a_term, a_weight) = self.entries[i];
            let (b_term, b_weight) = other.entries[j];
            match a_term.cmp(&b_term) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_weight * b_weight;
                    i += 1;
                    j += 1;
                }
            }
        }

        sum
    }
}

/// Trait for sparse query encoders
pub trait SparseEncoder: Send + Sync {
    /// Encode text into a weighted term vector; an empty vector (no terms)
    /// is a valid encoding of content-free input
    fn encode(&self, text: &str) -> Result<SparseVector, SparseEncodeError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// SPLADE sparse encoder backed by FastEmbed
pub struct FastEmbedSparseEncoder {
    model: Arc<SparseTextEmbedding>,
    model_name: String,
}

impl FastEmbedSparseEncoder {
    pub fn new() -> Result<Self, SparseEncodeError> {
        tracing::info!("Initializing sparse encoder model (SPLADE++ v1)");

        let init_options =
            SparseInitOptions::new(SparseModel::SPLADEPPV1).with_show_download_progress(true);
        let model = SparseTextEmbedding::try_new(init_options)
            .map_err(|e| SparseEncodeError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: "splade-pp-en-v1".to_string(),
        })
    }
}

impl SparseEncoder for FastEmbedSparseEncoder {
    fn encode(&self, text: &str) -> Result<SparseVector, SparseEncodeError> {
        if text.is_empty() {
            return Ok(SparseVector::default());
        }

        let mut embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .map_err(|e| SparseEncodeError::EncodingError(e.to_string()))?;

        let embedding = embeddings
            .pop()
            .ok_or_else(|| SparseEncodeError::EncodingError("No encoding generated".to_string()))?;

        let entries = embedding
            .indices
            .into_iter()
            .zip(embedding.values)
            .map(|(index, value)| (index as u32, value))
            .collect();

        Ok(SparseVector::new(entries))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Deterministic hashed bag-of-words encoder
///
/// Tokenizes on non-alphanumeric boundaries, lowercases, hashes each token
/// into a fixed term-id space and weights by L2-normalized term frequency.
/// Fixed hash seeds keep encodings stable across processes.
pub struct HashedBowEncoder {
    hasher: ahash::RandomState,
    term_space: u32,
}

impl HashedBowEncoder {
    pub fn new() -> Self {
        Self::with_term_space(1 << 18)
    }

    pub fn with_term_space(term_space: u32) -> Self {
        Self {
            hasher: ahash::RandomState::with_seeds(0x5eed, 0x7e57, 0xf00d, 0xbead),
            term_space,
        }
    }
}

impl Default for HashedBowEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseEncoder for HashedBowEncoder {
    fn encode(&self, text: &str) -> Result<SparseVector, SparseEncodeError> {
        let entries: Vec<(u32, f32)> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(|token| {
                let term = (self.hasher.hash_one(token.to_lowercase()) % self.term_space as u64)
                    as u32;
                (term, 1.0)
            })
            .collect();

        let vector = SparseVector::new(entries);
        let norm: f32 = vector
            .entries()
            .iter()
            .map(|(_, w)| w * w)
            .sum::<f32>()
            .sqrt();

        if norm == 0.0 {
            return Ok(SparseVector::default());
        }

        Ok(SparseVector::new(
            vector
                .entries()
                .iter()
                .map(|(term, w)| (*term, w / norm))
                .collect(),
        ))
    }

    fn model_name(&self) -> &str {
        "hashed-bow"
    }
}
