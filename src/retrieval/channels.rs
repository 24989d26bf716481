//! Retrieval channel adapters
//!
//! Each channel wraps one external index and returns a ranked candidate list
//! for the query. Channels are independent, share no mutable state, and may
//! legitimately return an empty list. Errors are surfaced to the engine,
//! which degrades the channel to "unavailable" for that query.

use crate::embedding::{EmbeddingProvider, SparseEncoder};
use crate::index::{DenseIndex, DocId, LexicalIndex, SparseIndex};
use crate::retrieval::{RankedItem, SearchQuery};
use std::sync::Arc;
use thiserror::Error;

/// Channel identity, used for metrics and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Lexical,
    Dense,
    Sparse,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Lexical => "lexical",
            Channel::Dense => "dense",
            Channel::Sparse => "sparse",
        }
    }

    /// Key used in the per-stage timing map
    pub fn stage_key(&self) -> &'static str {
        match self {
            Channel::Lexical => "lexical_ms",
            Channel::Dense => "dense_ms",
            Channel::Sparse => "sparse_ms",
        }
    }
}

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Sparse encoding failed: {0}")]
    Encoding(String),

    #[error("Index query failed: {0}")]
    Index(String),
}

/// What one channel produced for one query
#[derive(Debug, Clone, Default)]
pub struct ChannelOutcome {
    pub items: Vec<RankedItem>,
    /// False when the channel errored or exceeded its budget; an available
    /// channel with zero items is a legitimate miss, not a failure
    pub available: bool,
    pub elapsed_ms: f32,
}

impl ChannelOutcome {
    pub fn unavailable(elapsed_ms: f32) -> Self {
        Self {
            items: Vec::new(),
            available: false,
            elapsed_ms,
        }
    }
}

fn rank_hits(hits: Vec<(DocId, f32)>) -> Vec<RankedItem> {
    hits.into_iter()
        .enumerate()
        .map(|(i, (id, score))| RankedItem {
            id,
            rank: i + 1,
            score,
        })
        .collect()
}

/// Full-text retrieval channel
pub struct LexicalChannel {
    index: Arc<dyn LexicalIndex>,
}

impl LexicalChannel {
    pub fn new(index: Arc<dyn LexicalIndex>) -> Self {
        Self { index }
    }

    pub fn retrieve(&self, query: &SearchQuery, pool: usize) -> Result<Vec<RankedItem>, ChannelError> {
        let hits = self
            .index
            .search(&query.text, pool, query.filters.as_ref())
            .map_err(|e| ChannelError::Index(e.to_string()))?;
        Ok(rank_hits(hits))
    }
}

/// Dense embedding retrieval channel
pub struct DenseChannel {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn DenseIndex>,
}

impl DenseChannel {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn DenseIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn retrieve(&self, query: &SearchQuery, pool: usize) -> Result<Vec<RankedItem>, ChannelError> {
        let embedding = self
            .embedder
            .embed(&query.text)
            .map_err(|e| ChannelError::Embedding(e.to_string()))?;

        let hits = self
            .index
            .search(&embedding, pool, query.filters.as_ref())
            .map_err(|e| ChannelError::Index(e.to_string()))?;
        Ok(rank_hits(hits))
    }
}

/// Sparse weighted-term retrieval channel
pub struct SparseChannel {
    encoder: Arc<dyn SparseEncoder>,
    index: Arc<dyn SparseIndex>,
}

impl SparseChannel {
    pub fn new(encoder: Arc<dyn SparseEncoder>, index: Arc<dyn SparseIndex>) -> Self {
        Self { encoder, index }
    }

    pub fn retrieve(&self, query: &SearchQuery, pool: usize) -> Result<Vec<RankedItem>, ChannelError> {
        let vector = self
            .encoder
            .encode(&query.text)
            .map_err(|e| ChannelError::Encoding(e.to_string()))?;

        if vector.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self
            .index
            .search(&vector, pool, query.filters.as_ref())
            .map_err(|e| ChannelError::Index(e.to_string()))?;
        Ok(rank_hits(hits))
    }
}
