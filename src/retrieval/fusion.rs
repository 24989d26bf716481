//! Reciprocal Rank Fusion over the three channel lists
//!
//! The latency-critical hot path: pure, no I/O, one map allocation. Each
//! item's fused score is the sum over channels of weight / (k + rank). A
//! channel with no ranked items simply contributes no terms, which is how an
//! unavailable channel's weight effectively redistributes.

use crate::index::DocId;
use crate::retrieval::{Channel, ChannelWeights, RankedItem};
use ahash::AHashMap;
use serde::Serialize;

/// Which channels contributed an item to the fused list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelSet {
    pub lexical: bool,
    pub dense: bool,
    pub sparse: bool,
}

impl ChannelSet {
    pub fn contains(&self, channel: Channel) -> bool {
        match channel {
            Channel::Lexical => self.lexical,
            Channel::Dense => self.dense,
            Channel::Sparse => self.sparse,
        }
    }

    fn mark(&mut self, channel: Channel) {
        match channel {
            Channel::Lexical => self.lexical = true,
            Channel::Dense => self.dense = true,
            Channel::Sparse => self.sparse = true,
        }
    }

    pub fn count(&self) -> usize {
        usize::from(self.lexical) + usize::from(self.dense) + usize::from(self.sparse)
    }
}

/// One fused candidate; strictly ordered by descending score, ties broken by
/// ascending id for determinism
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusedResult {
    pub id: DocId,
    pub score: f32,
    pub channels: ChannelSet,
}

/// Merge three ranked lists into one fused ranking.
///
/// `fused_score(id) = Σ_channel weight_channel / (k + rank_channel(id))`
/// where ranks are 1-based and items absent from a channel contribute 0.
pub fn reciprocal_rank_fusion(
    lexical: &[RankedItem],
    dense: &[RankedItem],
    sparse: &[RankedItem],
    weights: &ChannelWeights,
    k: f32,
) -> Vec<FusedResult> {
    let capacity = lexical.len() + dense.len() + sparse.len();
    let mut scores: AHashMap<DocId, (f32, ChannelSet)> = AHashMap::with_capacity(capacity);

    let lists = [
        (Channel::Lexical, weights.lexical, lexical),
        (Channel::Dense, weights.dense, dense),
        (Channel::Sparse, weights.sparse, sparse),
    ];

    for (channel, weight, items) in lists {
        for item in items {
            let contribution = weight / (k + item.rank as f32);
            let entry = scores.entry(item.id).or_insert((0.0, ChannelSet::default()));
            entry.0 += contribution;
            entry.1.mark(channel);
        }
    }

    let mut results: Vec<FusedResult> = scores
        .into_iter()
        .map(|(id, (score, channels))| FusedResult {
            id,
            score,
            channels,
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(ids: &[DocId]) -> Vec<RankedItem> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| RankedItem {
                id: *id,
                rank: i + 1,
                score: 1.0 / (i + 1) as f32,
            })
            .collect()
    }

    #[test]
    fn test_items_in_multiple_channels_rank_higher() {
        let lexical = ranked(&[1, 2, 3]);
        let dense = ranked(&[2, 1, 4]);
        let sparse = ranked(&[5]);

        let fused = reciprocal_rank_fusion(
            &lexical,
            &dense,
            &sparse,
            &ChannelWeights::equal(),
            60.0,
        );

        assert_eq!(fused.len(), 5);
        // 1 and 2 appear in two channels each and must lead
        assert!(fused[0].id == 1 || fused[0].id == 2);
        assert!(fused[1].id == 1 || fused[1].id == 2);
        assert_eq!(fused[0].channels.count(), 2);
    }

    #[test]
    fn test_every_fused_item_came_from_a_channel() {
        let lexical = ranked(&[1, 2]);
        let dense = ranked(&[3]);
        let sparse = ranked(&[]);

        let fused =
            reciprocal_rank_fusion(&lexical, &dense, &sparse, &ChannelWeights::equal(), 60.0);

        for result in &fused {
            assert!(result.channels.count() >= 1);
            assert!([1, 2, 3].contains(&result.id));
        }
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let lexical = ranked(&[4, 2, 9, 1]);
        let dense = ranked(&[9, 4, 7]);
        let sparse = ranked(&[2, 7, 1]);
        let weights = ChannelWeights::equal();

        let a = reciprocal_rank_fusion(&lexical, &dense, &sparse, &weights, 60.0);
        let b = reciprocal_rank_fusion(&lexical, &dense, &sparse, &weights, 60.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_broken_by_ascending_id() {
        // Same rank in the same-weight channel: identical scores
        let lexical = ranked(&[9]);
        let dense = ranked(&[3]);
        let weights = ChannelWeights::equal();

        let fused = reciprocal_rank_fusion(&lexical, &dense, &[], &weights, 60.0);
        assert_eq!(fused[0].id, 3);
        assert_eq!(fused[1].id, 9);
    }

    #[test]
    fn test_no_duplicate_ids() {
        let lexical = ranked(&[1, 2, 3]);
        let dense = ranked(&[3, 2, 1]);
        let sparse = ranked(&[2, 3, 1]);

        let fused =
            reciprocal_rank_fusion(&lexical, &dense, &sparse, &ChannelWeights::equal(), 60.0);
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn test_weights_steer_the_order() {
        let lexical = ranked(&[1]);
        let dense = ranked(&[2]);

        let lexical_heavy = ChannelWeights {
            lexical: 0.6,
            dense: 0.2,
            sparse: 0.2,
        };
        let fused = reciprocal_rank_fusion(&lexical, &dense, &[], &lexical_heavy, 60.0);
        assert_eq!(fused[0].id, 1);

        let dense_heavy = ChannelWeights {
            lexical: 0.2,
            dense: 0.6,
            sparse: 0.2,
        };
        let fused = reciprocal_rank_fusion(&lexical, &dense, &[], &dense_heavy, 60.0);
        assert_eq!(fused[0].id, 2);
    }

    #[test]
    fn test_all_empty_inputs() {
        let fused = reciprocal_rank_fusion(&[], &[], &[], &ChannelWeights::equal(), 60.0);
        assert!(fused.is_empty());
    }
}
