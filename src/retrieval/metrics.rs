//! Per-query observability
//!
//! Pure side-channel attached to every response: stage durations, the weights
//! actually used, and which channels contributed to the returned page. Never
//! influences ranking.

use crate::retrieval::{Channel, ChannelSet, ChannelWeights};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

pub const STAGE_RRF: &str = "rrf_ms";
pub const STAGE_RERANK: &str = "rerank_ms";
pub const STAGE_TOTAL: &str = "total_ms";

/// Wall-clock timer for one pipeline stage
pub struct StageTimer {
    start: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.start.elapsed().as_secs_f32() * 1000.0
    }
}

/// Metadata attached to every search response
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchMetadata {
    /// End-to-end latency
    pub latency_ms: f32,
    /// Weights the fusion stage actually used
    pub weights_used: ChannelWeights,
    /// Per-channel count of items contributed to the returned page
    pub method_contributions: HashMap<String, usize>,
    /// Per-stage durations; always contains the three channel keys plus
    /// "rrf_ms" and "rerank_ms" (0 when reranking is disabled)
    pub timing: HashMap<String, f32>,
    /// Channels that errored or exceeded their budget for this query
    pub unavailable_channels: Vec<String>,
}

impl SearchMetadata {
    /// Zero-valued metadata with every stage key present; used for queries
    /// that short-circuit before retrieval
    pub fn zeroed() -> Self {
        let mut metadata = Self::default();
        for channel in [Channel::Lexical, Channel::Dense, Channel::Sparse] {
            metadata.timing.insert(channel.stage_key().to_string(), 0.0);
            metadata
                .method_contributions
                .insert(channel.name().to_string(), 0);
        }
        metadata.timing.insert(STAGE_RRF.to_string(), 0.0);
        metadata.timing.insert(STAGE_RERANK.to_string(), 0.0);
        metadata.timing.insert(STAGE_TOTAL.to_string(), 0.0);
        metadata
    }

    /// Count contributions per channel over the returned page
    pub fn record_contributions(&mut self, page_channels: &[ChannelSet]) {
        for channel in [Channel::Lexical, Channel::Dense, Channel::Sparse] {
            let count = page_channels
                .iter()
                .filter(|set| set.contains(channel))
                .count();
            self.method_contributions
                .insert(channel.name().to_string(), count);
        }
    }
}
