//! Cross-encoder reranking over the fused top-N
//!
//! The scoring model is lazily initialized on first use; initialization
//! failure degrades to "reranking unavailable" and the engine returns the
//! fused order unchanged. Scoring runs in batches against a wall-clock
//! deadline: on expiry whatever has been scored so far is returned, and only
//! complete computations are written to the shared cache so cache hits always
//! equal the uncached result.

use crate::index::{DocId, DocumentStore};
use crate::retrieval::RerankCache;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RerankError {
    #[error("Reranker initialization failed: {0}")]
    Initialization(String),

    #[error("Reranking model unavailable")]
    Unavailable,

    #[error("Scoring failed: {0}")]
    Scoring(String),
}

/// Pairwise query-document scorer
pub trait CrossEncoder: Send + Sync {
    /// One relevance score per document, higher is more relevant
    fn score(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>, RerankError>;

    fn model_name(&self) -> &str;
}

/// FastEmbed cross-encoder
pub struct FastEmbedCrossEncoder {
    model: Arc<TextRerank>,
    model_name: String,
}

impl FastEmbedCrossEncoder {
    pub fn new(model_name: &str) -> Result<Self, RerankError> {
        let reranker_model = match model_name {
            "bge-reranker-base" => RerankerModel::BGERerankerBase,
            "jina-reranker-v1-turbo-en" => RerankerModel::JINARerankerV1TurboEn,
            _ => {
                return Err(RerankError::Initialization(format!(
                    "Unsupported model: {}. Supported: bge-reranker-base, jina-reranker-v1-turbo-en",
                    model_name
                )));
            }
        };

        tracing::info!(model = model_name, "Initializing reranker model");

        let init_options = RerankInitOptions::new(reranker_model).with_show_download_progress(true);
        let model = TextRerank::try_new(init_options)
            .map_err(|e| RerankError::Initialization(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
        })
    }
}

impl CrossEncoder for FastEmbedCrossEncoder {
    fn score(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>, RerankError> {
        let results = self
            .model
            .rerank(query, documents.to_vec(), false, None)
            .map_err(|e| RerankError::Scoring(e.to_string()))?;

        let mut scores = vec![0.0; documents.len()];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.score;
            }
        }

        Ok(scores)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

type EncoderFactory = Box<dyn Fn() -> Result<Arc<dyn CrossEncoder>, RerankError> + Send + Sync>;

/// Second-stage reranker with lazy model initialization
pub struct Reranker {
    store: Arc<dyn DocumentStore>,
    factory: EncoderFactory,
    encoder: OnceLock<Option<Arc<dyn CrossEncoder>>>,
    batch_size: usize,
}

impl Reranker {
    /// Reranker backed by a FastEmbed model, initialized on first use
    pub fn new(store: Arc<dyn DocumentStore>, model_name: &str) -> Self {
        let model_name = model_name.to_string();
        Self {
            store,
            factory: Box::new(move || {
                FastEmbedCrossEncoder::new(&model_name)
                    .map(|encoder| Arc::new(encoder) as Arc<dyn CrossEncoder>)
            }),
            encoder: OnceLock::new(),
            batch_size: 16,
        }
    }

    /// Reranker with a pre-initialized encoder (tests, custom backends)
    pub fn with_encoder(store: Arc<dyn DocumentStore>, encoder: Arc<dyn CrossEncoder>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Some(encoder));
        Self {
            store,
            factory: Box::new(|| Err(RerankError::Unavailable)),
            encoder: cell,
            batch_size: 16,
        }
    }

    /// Lazily initialize the encoder; a failed initialization is remembered
    /// so the cold-start cost (and the failure) is paid once per process
    fn encoder(&self) -> Option<Arc<dyn CrossEncoder>> {
        self.encoder
            .get_or_init(|| match (self.factory)() {
                Ok(encoder) => Some(encoder),
                Err(e) => {
                    tracing::warn!(error = %e, "Reranker initialization failed; reranking disabled");
                    None
                }
            })
            .clone()
    }

    /// Rerank candidates against the query.
    ///
    /// Returns at most `top_k` (id, score) pairs sorted descending by score.
    /// Empty query text, empty candidates, or candidates that resolve to no
    /// document all yield an empty list, not an error. `Err(Unavailable)` is
    /// returned only when the scoring model cannot be initialized.
    pub fn rerank(
        &self,
        query: &str,
        candidates: &[DocId],
        top_k: usize,
        timeout: Duration,
    ) -> Result<Vec<(DocId, f32)>, RerankError> {
        if query.is_empty() || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let encoder = self.encoder().ok_or(RerankError::Unavailable)?;
        let documents = self.resolve(candidates);
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + timeout;
        let (mut scored, _complete) = self.score_batched(&*encoder, query, &documents, deadline);
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Like [`rerank`](Self::rerank), but consults and populates a shared
    /// cache keyed by (query, candidate set). Only complete computations are
    /// cached; deadline-truncated partial results never are.
    pub fn rerank_with_caching(
        &self,
        query: &str,
        candidates: &[DocId],
        top_k: usize,
        cache: &RerankCache,
        timeout: Duration,
    ) -> Result<Vec<(DocId, f32)>, RerankError> {
        if query.is_empty() || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let key = RerankCache::key(query, candidates);
        if let Some(hit) = cache.get(&key) {
            tracing::debug!("Rerank cache hit");
            let mut scores = hit.as_ref().clone();
            scores.truncate(top_k);
            return Ok(scores);
        }

        let encoder = self.encoder().ok_or(RerankError::Unavailable)?;
        let documents = self.resolve(candidates);
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + timeout;
        let (mut scored, complete) = self.score_batched(&*encoder, query, &documents, deadline);

        if complete {
            cache.insert(key, scored.clone());
        }

        scored.truncate(top_k);
        Ok(scored)
    }

    /// Resolve candidate ids to scoring text, silently dropping ids with no
    /// backing document
    fn resolve(&self, candidates: &[DocId]) -> Vec<(DocId, String)> {
        candidates
            .iter()
            .filter_map(|id| {
                let doc = self.store.get(*id);
                if doc.is_none() {
                    tracing::debug!(id, "Dropping rerank candidate with no backing document");
                }
                doc.map(|d| (*id, format!("{}\n{}", d.title, d.body)))
            })
            .collect()
    }

    /// Score documents in batches, checking the deadline between batches.
    /// Returns the scored pairs sorted descending and whether scoring covered
    /// every document.
    fn score_batched(
        &self,
        encoder: &dyn CrossEncoder,
        query: &str,
        documents: &[(DocId, String)],
        deadline: Instant,
    ) -> (Vec<(DocId, f32)>, bool) {
        let mut scored: Vec<(DocId, f32)> = Vec::with_capacity(documents.len());
        let mut complete = true;

        for batch in documents.chunks(self.batch_size) {
            if Instant::now() >= deadline {
                tracing::warn!(
                    scored = scored.len(),
                    total = documents.len(),
                    "Rerank deadline expired; returning partial results"
                );
                complete = false;
                break;
            }

            let texts: Vec<&str> = batch.iter().map(|(_, text)| text.as_str()).collect();
            match encoder.score(query, &texts) {
                Ok(scores) => {
                    for ((id, _), score) in batch.iter().zip(scores) {
                        scored.push((*id, score));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Rerank scoring failed mid-query");
                    complete = false;
                    break;
                }
            }
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        (scored, complete)
    }
}
