//! Trident - Hybrid Retrieval & Ranking Engine
//!
//! Answers a text query against an indexed corpus by combining three
//! independent relevance signals (lexical full-text, dense embeddings, sparse
//! weighted-term vectors) with weighted Reciprocal Rank Fusion, optionally
//! refined by a cross-encoder reranking stage. Invoked in-process as a
//! library; index construction and durable storage live with the caller.

pub mod config;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod index;
pub mod retrieval;

pub use error::{Result, TridentError};
pub use retrieval::{SearchEngine, SearchQuery, SearchResponse};
