//! Search engine orchestration
//!
//! One query flows through: analysis, weight resolution, fan-out to the three
//! channels (each on a blocking thread under its own wall-clock budget),
//! Reciprocal Rank Fusion, optional cross-encoder reranking of the fused
//! head, hydration against the document store, and pagination. A channel that
//! errors or exceeds its budget degrades to "unavailable" for that query;
//! the response carries which ones did.

use crate::config::SearchConfig;
use crate::embedding::{EmbeddingProvider, SparseEncoder};
use crate::error::{Result, TridentError};
use crate::index::{DenseIndex, DocId, DocumentStore, LexicalIndex, SparseIndex};
use crate::retrieval::metrics::{STAGE_RERANK, STAGE_RRF, STAGE_TOTAL};
use crate::retrieval::{
    analyze, reciprocal_rank_fusion, Channel, ChannelError, ChannelOutcome, ChannelSet,
    ChannelWeights, DenseChannel, FusedResult, LexicalChannel, RankedItem, RerankCache,
    RerankError, Reranker, SearchHit, SearchMetadata, SearchQuery, SearchResponse, SparseChannel,
    StageTimer,
};
use std::sync::Arc;
use std::time::Duration;

const SNIPPET_CHARS: usize = 200;

/// Hybrid retrieval engine
pub struct SearchEngine {
    lexical: Arc<LexicalChannel>,
    dense: Arc<DenseChannel>,
    sparse: Arc<SparseChannel>,
    store: Arc<dyn DocumentStore>,
    reranker: Reranker,
    rerank_cache: RerankCache,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(
        lexical_index: Arc<dyn LexicalIndex>,
        dense_index: Arc<dyn DenseIndex>,
        sparse_index: Arc<dyn SparseIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        sparse_encoder: Arc<dyn SparseEncoder>,
        store: Arc<dyn DocumentStore>,
        config: SearchConfig,
    ) -> Self {
        let reranker = Reranker::new(store.clone(), &config.rerank.model);
        let rerank_cache = RerankCache::with_capacity(config.rerank.cache_capacity);

        Self {
            lexical: Arc::new(LexicalChannel::new(lexical_index)),
            dense: Arc::new(DenseChannel::new(embedder, dense_index)),
            sparse: Arc::new(SparseChannel::new(sparse_encoder, sparse_index)),
            store,
            reranker,
            rerank_cache,
            config,
        }
    }

    /// Replace the reranker (custom scoring backends, tests)
    pub fn with_reranker(mut self, reranker: Reranker) -> Self {
        self.reranker = reranker;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Execute one search
    pub async fn search(
        &self,
        query: &SearchQuery,
        enable_reranking: bool,
        adaptive_weighting: bool,
    ) -> Result<SearchResponse> {
        if query.limit == 0 {
            return Err(TridentError::InvalidQuery(
                "limit must be greater than zero".to_string(),
            ));
        }

        if query.text.trim().is_empty() {
            return Ok(SearchResponse::empty());
        }

        let total_timer = StageTimer::start();
        let analysis = analyze(&query.text);
        let weights = ChannelWeights::resolve(&analysis, adaptive_weighting, &self.config.weights);

        tracing::debug!(
            words = analysis.word_count,
            technical = analysis.is_technical,
            question = analysis.is_question,
            lexical = weights.lexical,
            dense = weights.dense,
            sparse = weights.sparse,
            "Query analyzed"
        );

        // The pool depends on limit alone, not offset, so consecutive pages
        // rank against the same candidate set and agree on the total
        let pool = query
            .limit
            .saturating_mul(self.config.channels.candidate_multiplier);
        let budget = Duration::from_millis(self.config.channels.timeout_ms);

        let (lexical_out, dense_out, sparse_out) = tokio::join!(
            run_channel(Channel::Lexical, budget, {
                let channel = self.lexical.clone();
                let query = query.clone();
                move || channel.retrieve(&query, pool)
            }),
            run_channel(Channel::Dense, budget, {
                let channel = self.dense.clone();
                let query = query.clone();
                move || channel.retrieve(&query, pool)
            }),
            run_channel(Channel::Sparse, budget, {
                let channel = self.sparse.clone();
                let query = query.clone();
                move || channel.retrieve(&query, pool)
            }),
        );

        let mut metadata = SearchMetadata::zeroed();
        metadata.weights_used = weights;
        for (channel, outcome) in [
            (Channel::Lexical, &lexical_out),
            (Channel::Dense, &dense_out),
            (Channel::Sparse, &sparse_out),
        ] {
            metadata
                .timing
                .insert(channel.stage_key().to_string(), outcome.elapsed_ms);
            if !outcome.available {
                metadata.unavailable_channels.push(channel.name().to_string());
            }
        }

        let rrf_timer = StageTimer::start();
        let mut fused = reciprocal_rank_fusion(
            &lexical_out.items,
            &dense_out.items,
            &sparse_out.items,
            &weights,
            self.config.fusion.rrf_k,
        );
        metadata
            .timing
            .insert(STAGE_RRF.to_string(), rrf_timer.elapsed_ms());

        if enable_reranking && !fused.is_empty() {
            let rerank_timer = StageTimer::start();
            fused = self.rerank_fused(&query.text, fused);
            metadata
                .timing
                .insert(STAGE_RERANK.to_string(), rerank_timer.elapsed_ms());
        }

        let (hits, hit_channels) = self.hydrate(&fused);
        let total = hits.len();

        let page_channels: Vec<ChannelSet> = hit_channels
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .copied()
            .collect();
        let items: Vec<SearchHit> = hits
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        metadata.record_contributions(&page_channels);
        metadata.latency_ms = total_timer.elapsed_ms();
        metadata
            .timing
            .insert(STAGE_TOTAL.to_string(), metadata.latency_ms);

        Ok(SearchResponse {
            items,
            total,
            facets: serde_json::Value::Null,
            metadata,
        })
    }

    /// Rerank the fused head and splice it back in.
    ///
    /// Output order: cross-encoder-scored candidates by descending score,
    /// then head candidates the scorer did not cover (deadline expiry) in
    /// fused order, then the tail unchanged. Rerank failure or unavailability
    /// leaves the fused order as-is.
    fn rerank_fused(&self, query_text: &str, fused: Vec<FusedResult>) -> Vec<FusedResult> {
        let head_len = fused.len().min(self.config.rerank.top_k);
        let candidates: Vec<DocId> = fused[..head_len].iter().map(|f| f.id).collect();
        let timeout = Duration::from_millis(self.config.rerank.timeout_ms);

        let scored = match self.reranker.rerank_with_caching(
            query_text,
            &candidates,
            self.config.rerank.top_k,
            &self.rerank_cache,
            timeout,
        ) {
            Ok(scored) => scored,
            Err(RerankError::Unavailable) => {
                tracing::warn!("Reranker unavailable; keeping fused order");
                return fused;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reranking failed; keeping fused order");
                return fused;
            }
        };

        if scored.is_empty() {
            return fused;
        }

        let channels: ahash::AHashMap<DocId, ChannelSet> =
            fused.iter().map(|f| (f.id, f.channels)).collect();
        let scored_ids: ahash::AHashSet<DocId> = scored.iter().map(|(id, _)| *id).collect();

        let mut result = Vec::with_capacity(fused.len());
        for (id, score) in scored {
            result.push(FusedResult {
                id,
                score,
                channels: channels.get(&id).copied().unwrap_or_default(),
            });
        }
        for item in fused[..head_len].iter().filter(|f| !scored_ids.contains(&f.id)) {
            result.push(*item);
        }
        result.extend_from_slice(&fused[head_len..]);
        result
    }

    /// Resolve fused ids against the document store, dropping ids with no
    /// backing document
    fn hydrate(&self, fused: &[FusedResult]) -> (Vec<SearchHit>, Vec<ChannelSet>) {
        let mut hits = Vec::with_capacity(fused.len());
        let mut channels = Vec::with_capacity(fused.len());

        for result in fused {
            match self.store.get(result.id) {
                Some(doc) => {
                    hits.push(SearchHit {
                        id: doc.id,
                        score: result.score,
                        title: doc.title,
                        snippet: snippet(&doc.body),
                    });
                    channels.push(result.channels);
                }
                None => {
                    tracing::debug!(id = result.id, "Dropping hit with no backing document");
                }
            }
        }

        (hits, channels)
    }
}

/// Run one channel on a blocking thread under a wall-clock budget
async fn run_channel<F>(channel: Channel, budget: Duration, task: F) -> ChannelOutcome
where
    F: FnOnce() -> std::result::Result<Vec<RankedItem>, ChannelError> + Send + 'static,
{
    let timer = StageTimer::start();
    let outcome = tokio::time::timeout(budget, tokio::task::spawn_blocking(task)).await;
    let elapsed_ms = timer.elapsed_ms();

    match outcome {
        Ok(Ok(Ok(items))) => ChannelOutcome {
            items,
            available: true,
            elapsed_ms,
        },
        Ok(Ok(Err(e))) => {
            tracing::warn!(channel = channel.name(), error = %e, "Channel failed");
            ChannelOutcome::unavailable(elapsed_ms)
        }
        Ok(Err(e)) => {
            tracing::warn!(channel = channel.name(), error = %e, "Channel task panicked");
            ChannelOutcome::unavailable(elapsed_ms)
        }
        Err(_) => {
            tracing::warn!(
                channel = channel.name(),
                budget_ms = budget.as_millis() as u64,
                "Channel exceeded its budget"
            );
            ChannelOutcome::unavailable(elapsed_ms)
        }
    }
}

fn snippet(body: &str) -> String {
    if body.chars().count() <= SNIPPET_CHARS {
        body.to_string()
    } else {
        let mut text: String = body.chars().take(SNIPPET_CHARS).collect();
        text.push_str("...");
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingError, HashedBowEncoder};
    use crate::index::{
        IndexError, InMemoryDocumentStore, InvertedSparseIndex, TantivyLexicalIndex,
    };

    /// Constant-vector embedder; the tests here exercise orchestration, not
    /// dense ranking quality
    struct FlatEmbedder;

    impl EmbeddingProvider for FlatEmbedder {
        fn embed(&self, _: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0; 8])
        }
        fn embed_batch(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0; 8]).collect())
        }
        fn dimension(&self) -> usize {
            8
        }
        fn model_name(&self) -> &str {
            "flat"
        }
    }

    struct BrokenDense;

    impl DenseIndex for BrokenDense {
        fn search(
            &self,
            _: &[f32],
            _: usize,
            _: Option<&serde_json::Value>,
        ) -> std::result::Result<Vec<(DocId, f32)>, IndexError> {
            Err(IndexError::Unavailable("disk gone".to_string()))
        }
    }

    struct SlowDense;

    impl DenseIndex for SlowDense {
        fn search(
            &self,
            _: &[f32],
            _: usize,
            _: Option<&serde_json::Value>,
        ) -> std::result::Result<Vec<(DocId, f32)>, IndexError> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(vec![(1, 1.0)])
        }
    }

    fn engine_with_dense(dense: Arc<dyn DenseIndex>) -> SearchEngine {
        engine_with_dense_and_config(dense, SearchConfig::default())
    }

    fn engine_with_dense_and_config(
        dense: Arc<dyn DenseIndex>,
        config: SearchConfig,
    ) -> SearchEngine {
        let lexical = TantivyLexicalIndex::create_in_ram().unwrap();
        let sparse = InvertedSparseIndex::new();
        let encoder = HashedBowEncoder::new();
        let store = InMemoryDocumentStore::new();

        for (id, title, body) in [
            (1u64, "Machine learning", "machine learning with gradient descent"),
            (2, "Deep learning", "deep learning and neural networks"),
            (3, "Data science", "data science pipelines and statistics"),
        ] {
            lexical.insert(id, title, body).unwrap();
            sparse.insert(id, &encoder.encode(body).unwrap()).unwrap();
            store.insert(id, title, body);
        }
        lexical.commit().unwrap();

        SearchEngine::new(
            Arc::new(lexical),
            dense,
            Arc::new(sparse),
            Arc::new(FlatEmbedder),
            Arc::new(HashedBowEncoder::new()),
            Arc::new(store),
            config,
        )
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let engine = engine_with_dense(Arc::new(BrokenDense));
        let result = engine.search(&SearchQuery::new("query", 0), false, false).await;
        assert!(matches!(result, Err(TridentError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let engine = engine_with_dense(Arc::new(BrokenDense));
        let response = engine
            .search(&SearchQuery::new("   ", 10), false, false)
            .await
            .unwrap();
        assert!(response.items.is_empty());
        assert_eq!(response.total, 0);
        assert_eq!(response.metadata.timing["rerank_ms"], 0.0);
    }

    #[tokio::test]
    async fn test_failed_channel_degrades_not_errors() {
        let engine = engine_with_dense(Arc::new(BrokenDense));
        let response = engine
            .search(&SearchQuery::new("machine learning", 10), false, false)
            .await
            .unwrap();

        assert!(!response.items.is_empty());
        assert_eq!(response.metadata.unavailable_channels, vec!["dense"]);
    }

    #[tokio::test]
    async fn test_slow_channel_exceeds_budget_and_degrades() {
        let mut config = SearchConfig::default();
        config.channels.timeout_ms = 10;
        let engine = engine_with_dense_and_config(Arc::new(SlowDense), config);

        let response = engine
            .search(&SearchQuery::new("machine learning", 10), false, false)
            .await
            .unwrap();

        // Lexical and sparse still answer; the slow channel contributes nothing
        assert!(!response.items.is_empty());
        assert_eq!(response.metadata.unavailable_channels, vec!["dense"]);
        assert_eq!(response.metadata.method_contributions["dense"], 0);
    }

    #[tokio::test]
    async fn test_huge_limit_does_not_overflow_pool_sizing() {
        struct NoHits;

        impl LexicalIndex for NoHits {
            fn search(
                &self,
                _: &str,
                _: usize,
                _: Option<&serde_json::Value>,
            ) -> std::result::Result<Vec<(DocId, f32)>, IndexError> {
                Ok(Vec::new())
            }
        }
        impl DenseIndex for NoHits {
            fn search(
                &self,
                _: &[f32],
                _: usize,
                _: Option<&serde_json::Value>,
            ) -> std::result::Result<Vec<(DocId, f32)>, IndexError> {
                Ok(Vec::new())
            }
        }
        impl SparseIndex for NoHits {
            fn search(
                &self,
                _: &crate::embedding::SparseVector,
                _: usize,
                _: Option<&serde_json::Value>,
            ) -> std::result::Result<Vec<(DocId, f32)>, IndexError> {
                Ok(Vec::new())
            }
        }

        let engine = SearchEngine::new(
            Arc::new(NoHits),
            Arc::new(NoHits),
            Arc::new(NoHits),
            Arc::new(FlatEmbedder),
            Arc::new(HashedBowEncoder::new()),
            Arc::new(InMemoryDocumentStore::new()),
            SearchConfig::default(),
        );

        // limit * candidate_multiplier would overflow without saturation
        let response = engine
            .search(&SearchQuery::new("query", usize::MAX / 2), false, false)
            .await
            .unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_snippet_truncation() {
        assert_eq!(snippet("short body"), "short body");

        let long = "x".repeat(500);
        let cut = snippet(&long);
        assert!(cut.len() < 500);
        assert!(cut.ends_with("..."));
    }
}
