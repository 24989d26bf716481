//! Configuration for the retrieval engine
//!
//! All tunables the pipeline consumes live here: candidate pool sizing,
//! per-channel timeout budgets, the RRF smoothing constant, adaptive weight
//! bonuses, and reranker settings. Cache growth and channel failure budgets
//! are deliberately configuration points rather than hard-coded behavior.

use crate::error::{Result, TridentError};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub channels: ChannelConfig,
    pub fusion: FusionConfig,
    pub weights: WeightConfig,
    pub rerank: RerankConfig,
}

/// Retrieval channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Each channel retrieves `limit * candidate_multiplier` candidates.
    /// The pool is independent of the requested offset so consecutive pages
    /// rank against the same candidate set.
    pub candidate_multiplier: usize,
    /// Wall-clock budget per channel; a channel exceeding it is treated as
    /// unavailable for that query and contributes nothing to fusion
    pub timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            candidate_multiplier: 10,
            timeout_ms: 250,
        }
    }
}

/// Rank fusion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// RRF smoothing constant (classic value is 60)
    pub rrf_k: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { rrf_k: 60.0 }
    }
}

/// Additive bonuses applied to the neutral (1/3, 1/3, 1/3) weights before
/// renormalization when adaptive weighting is enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Short queries (<= 3 words) favor exact keyword matching
    pub short_lexical_bonus: f32,
    /// Long queries (> 10 words) favor semantic similarity
    pub long_dense_bonus: f32,
    /// Code-like queries favor the sparse term-vector signal
    pub technical_sparse_bonus: f32,
    /// Question-form queries favor semantic similarity
    pub question_dense_bonus: f32,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            short_lexical_bonus: 0.3,
            long_dense_bonus: 0.3,
            technical_sparse_bonus: 0.25,
            question_dense_bonus: 0.2,
        }
    }
}

/// Reranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Cross-encoder model name
    pub model: String,
    /// Number of fused candidates handed to the cross-encoder
    pub top_k: usize,
    /// Wall-clock budget for scoring; on expiry partial results are returned
    pub timeout_ms: u64,
    /// Maximum cached (query, candidate-set) entries; 0 means unbounded
    pub cache_capacity: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            model: "bge-reranker-base".to_string(),
            top_k: 50,
            timeout_ms: 500,
            cache_capacity: 0,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            channels: ChannelConfig::default(),
            fusion: FusionConfig::default(),
            weights: WeightConfig::default(),
            rerank: RerankConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TridentError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TridentError::Io {
            source: e,
            context: format!("reading config from {}", path.display()),
        })?;

        let config: SearchConfig = toml::from_str(&content)?;
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TridentError::Io {
                source: e,
                context: format!("creating config directory {}", parent.display()),
            })?;
        }

        std::fs::write(path, content).map_err(|e| TridentError::Io {
            source: e,
            context: format!("writing config to {}", path.display()),
        })
    }
}
