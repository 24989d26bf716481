use crate::config::SearchConfig;
use crate::error::{Result, TridentError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &SearchConfig) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_channels(config, &mut errors);
        Self::validate_fusion(config, &mut errors);
        Self::validate_weights(config, &mut errors);
        Self::validate_rerank(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TridentError::ConfigValidation { errors })
        }
    }

    fn validate_channels(config: &SearchConfig, errors: &mut Vec<ValidationError>) {
        if config.channels.candidate_multiplier == 0 {
            errors.push(ValidationError::new(
                "channels.candidate_multiplier",
                "Candidate multiplier must be greater than 0",
            ));
        }

        if config.channels.timeout_ms == 0 {
            errors.push(ValidationError::new(
                "channels.timeout_ms",
                "Channel timeout must be greater than 0",
            ));
        }
    }

    fn validate_fusion(config: &SearchConfig, errors: &mut Vec<ValidationError>) {
        if !(config.fusion.rrf_k > 0.0) {
            errors.push(ValidationError::new(
                "fusion.rrf_k",
                format!("RRF k must be positive, got {}", config.fusion.rrf_k),
            ));
        }
    }

    fn validate_weights(config: &SearchConfig, errors: &mut Vec<ValidationError>) {
        let bonuses = [
            ("weights.short_lexical_bonus", config.weights.short_lexical_bonus),
            ("weights.long_dense_bonus", config.weights.long_dense_bonus),
            (
                "weights.technical_sparse_bonus",
                config.weights.technical_sparse_bonus,
            ),
            (
                "weights.question_dense_bonus",
                config.weights.question_dense_bonus,
            ),
        ];

        for (path, bonus) in bonuses {
            if !bonus.is_finite() || bonus < 0.0 {
                errors.push(ValidationError::new(
                    path,
                    format!("Bonus must be a finite non-negative number, got {}", bonus),
                ));
            }
        }
    }

    fn validate_rerank(config: &SearchConfig, errors: &mut Vec<ValidationError>) {
        if config.rerank.model.is_empty() {
            errors.push(ValidationError::new(
                "rerank.model",
                "Reranker model name cannot be empty",
            ));
        }

        if config.rerank.top_k == 0 {
            errors.push(ValidationError::new(
                "rerank.top_k",
                "Rerank top_k must be greater than 0",
            ));
        }

        if config.rerank.timeout_ms == 0 {
            errors.push(ValidationError::new(
                "rerank.timeout_ms",
                "Rerank timeout must be greater than 0",
            ));
        }
    }
}
