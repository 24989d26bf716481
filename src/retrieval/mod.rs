//! Hybrid Retrieval & Ranking
//!
//! This module implements the query pipeline: analysis, parallel retrieval
//! over the lexical/dense/sparse channels, adaptive weighting, Reciprocal
//! Rank Fusion, optional cross-encoder reranking, and per-stage metrics.

mod analyzer;
mod cache;
mod channels;
mod engine;
mod fusion;
mod metrics;
mod reranker;
mod weights;

pub use analyzer::{analyze, QueryAnalysis};
pub use cache::RerankCache;
pub use channels::{
    Channel, ChannelError, ChannelOutcome, DenseChannel, LexicalChannel, SparseChannel,
};
pub use engine::SearchEngine;
pub use fusion::{reciprocal_rank_fusion, ChannelSet, FusedResult};
pub use metrics::{SearchMetadata, StageTimer};
pub use reranker::{CrossEncoder, FastEmbedCrossEncoder, RerankError, Reranker};
pub use weights::ChannelWeights;

use crate::index::DocId;
use serde::{Deserialize, Serialize};

/// Search query; immutable once constructed, one per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text
    pub text: String,

    /// Maximum number of results per page
    pub limit: usize,

    /// Number of leading results to skip
    pub offset: usize,

    /// Opaque filter predicate passed through to the channels unchanged
    pub filters: Option<serde_json::Value>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            limit,
            offset: 0,
            filters: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_filters(mut self, filters: serde_json::Value) -> Self {
        self.filters = Some(filters);
        self
    }
}

/// One candidate from one channel; discarded after fusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedItem {
    pub id: DocId,
    /// 1-based rank within the owning channel's list
    pub rank: usize,
    /// Channel-native score (BM25, cosine, dot product); informational only,
    /// fusion uses ranks
    pub score: f32,
}

/// A resolved result in the final response
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub title: String,
    pub snippet: String,
}

/// Response returned to the surrounding service
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SearchHit>,
    /// Total matches across all pages for this query's candidate pool
    pub total: usize,
    /// Opaque facet payload; this engine computes none
    pub facets: serde_json::Value,
    pub metadata: SearchMetadata,
}

impl SearchResponse {
    /// Empty response with zero-valued metadata (all timing keys present)
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            facets: serde_json::Value::Null,
            metadata: SearchMetadata::zeroed(),
        }
    }
}
