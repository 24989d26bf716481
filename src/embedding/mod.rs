//! Query encoding for the dense and sparse retrieval channels
//!
//! The engine never trains or owns models; it consumes two encoder traits:
//! - `EmbeddingProvider` turns query text into a dense vector
//! - `SparseEncoder` turns query text into a weighted term vector
//!
//! FastEmbed-backed implementations are provided for both, plus a
//! deterministic hashed bag-of-words encoder for offline use.

mod provider;
mod sparse;

pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use sparse::{
    FastEmbedSparseEncoder, HashedBowEncoder, SparseEncodeError, SparseEncoder, SparseVector,
};
