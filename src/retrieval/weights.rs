//! Adaptive channel weighting
//!
//! Maps query analysis to a (lexical, dense, sparse) weight triple summing to
//! 1.0. Bonuses are additive on the neutral 1/3 baseline and accumulate when
//! multiple conditions hold; renormalization restores the sum invariant.

use crate::config::WeightConfig;
use crate::retrieval::QueryAnalysis;
use serde::{Deserialize, Serialize};

const NEUTRAL: f32 = 1.0 / 3.0;

/// Per-channel fusion weights; invariant: sum == 1.0 within 1e-3
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelWeights {
    pub lexical: f32,
    pub dense: f32,
    pub sparse: f32,
}

impl ChannelWeights {
    /// Fixed equal weighting, used when adaptive mode is off
    pub fn equal() -> Self {
        Self {
            lexical: NEUTRAL,
            dense: NEUTRAL,
            sparse: NEUTRAL,
        }
    }

    /// Query-adaptive weighting
    pub fn adaptive(analysis: &QueryAnalysis, config: &WeightConfig) -> Self {
        let mut lexical = NEUTRAL;
        let mut dense = NEUTRAL;
        let mut sparse = NEUTRAL;

        if analysis.is_short {
            lexical += config.short_lexical_bonus;
        }
        if analysis.is_long {
            dense += config.long_dense_bonus;
        }
        if analysis.is_technical {
            sparse += config.technical_sparse_bonus;
        }
        if analysis.is_question {
            dense += config.question_dense_bonus;
        }

        Self {
            lexical,
            dense,
            sparse,
        }
        .normalized()
    }

    /// Select weights for a query
    pub fn resolve(analysis: &QueryAnalysis, adaptive: bool, config: &WeightConfig) -> Self {
        if adaptive {
            Self::adaptive(analysis, config)
        } else {
            Self::equal()
        }
    }

    pub fn sum(&self) -> f32 {
        self.lexical + self.dense + self.sparse
    }

    fn normalized(self) -> Self {
        let sum = self.sum();
        Self {
            lexical: self.lexical / sum,
            dense: self.dense / sum,
            sparse: self.sparse / sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::analyze;

    fn config() -> WeightConfig {
        WeightConfig::default()
    }

    #[test]
    fn test_equal_mode_is_exact_thirds() {
        let weights = ChannelWeights::resolve(&analyze("anything at all here"), false, &config());
        assert!((weights.lexical - NEUTRAL).abs() < 1e-3);
        assert!((weights.dense - NEUTRAL).abs() < 1e-3);
        assert!((weights.sparse - NEUTRAL).abs() < 1e-3);
    }

    #[test]
    fn test_short_query_boosts_lexical() {
        let weights = ChannelWeights::adaptive(&analyze("rust tokio"), &config());
        assert!(weights.lexical > weights.dense);
        assert!(weights.lexical > weights.sparse);
        assert!((weights.sum() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_long_query_boosts_dense() {
        let text = "best approach to shard a large relational dataset across many regions safely";
        let analysis = analyze(text);
        assert!(analysis.is_long);

        let weights = ChannelWeights::adaptive(&analysis, &config());
        assert!(weights.dense > weights.lexical);
        assert!(weights.dense > weights.sparse);
        assert!((weights.sum() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_technical_query_boosts_sparse_above_third() {
        let weights = ChannelWeights::adaptive(&analyze("parse_config() usage examples"), &config());
        assert!(weights.sparse > NEUTRAL);
        assert!((weights.sum() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_question_boosts_dense_above_third() {
        let weights =
            ChannelWeights::adaptive(&analyze("how does reciprocal rank fusion work"), &config());
        assert!(weights.dense > NEUTRAL);
        assert!((weights.sum() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_bonuses_accumulate() {
        // Short and technical: both lexical and sparse rise above dense
        let weights = ChannelWeights::adaptive(&analyze("foo() panics"), &config());
        assert!(weights.lexical > weights.dense);
        assert!(weights.sparse > weights.dense);
        assert!((weights.sum() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_neutral_analysis_stays_equal() {
        // 5 words, no markers, no question prefix
        let weights = ChannelWeights::adaptive(&analyze("alpha beta gamma delta epsilon"), &config());
        assert!((weights.lexical - NEUTRAL).abs() < 1e-3);
        assert!((weights.dense - NEUTRAL).abs() < 1e-3);
        assert!((weights.sparse - NEUTRAL).abs() < 1e-3);
    }

    #[test]
    fn test_sum_invariant_across_query_shapes() {
        let queries = [
            "",
            "a",
            "how to fix fn main() when the build fails on every platform we target",
            "what is love",
            "def train(model):",
        ];
        for query in queries {
            for adaptive in [true, false] {
                let weights = ChannelWeights::resolve(&analyze(query), adaptive, &config());
                assert!(
                    (weights.sum() - 1.0).abs() < 1e-3,
                    "sum violated for {:?} adaptive={}",
                    query,
                    adaptive
                );
            }
        }
    }
}
