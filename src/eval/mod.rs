//! Offline ranking quality metrics
//!
//! Standalone functions over a produced ranking and a set of relevance
//! judgments. Nothing here touches the query path; these exist for evaluating
//! ranking changes against a labeled corpus. Documents without a judgment are
//! treated as relevance 0.

use crate::index::DocId;
use std::collections::HashMap;

/// Normalized Discounted Cumulative Gain at cutoff `k`.
///
/// `DCG = Σ_{i<k} rel_i / log2(i + 2)` over the ranking's first `k` entries,
/// normalized by the DCG of the ideal ordering of the judged relevances.
/// Returns 0.0 when the ranking is empty, `k` is 0, or no judged document
/// has positive relevance.
pub fn ndcg(ranking: &[DocId], judgments: &HashMap<DocId, f64>, k: usize) -> f64 {
    if ranking.is_empty() || k == 0 {
        return 0.0;
    }

    let dcg: f64 = ranking
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, id)| {
            let rel = judgments.get(id).copied().unwrap_or(0.0);
            rel / ((i + 2) as f64).log2()
        })
        .sum();

    let mut ideal: Vec<f64> = judgments.values().copied().collect();
    ideal.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let idcg: f64 = ideal
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, rel)| rel / ((i + 2) as f64).log2())
        .sum();

    if idcg == 0.0 {
        return 0.0;
    }
    dcg / idcg
}

/// Fraction of the relevant set found in the ranking's first `k` entries.
/// Returns 0.0 when the relevant set is empty.
pub fn recall_at_k(ranking: &[DocId], relevant: &[DocId], k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }

    let found = ranking
        .iter()
        .take(k)
        .filter(|id| relevant.contains(id))
        .count();
    found as f64 / relevant.len() as f64
}

/// Fraction of the ranking's first `k` entries that are relevant.
/// Returns 0.0 when `k` is 0.
pub fn precision_at_k(ranking: &[DocId], relevant: &[DocId], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }

    let found = ranking
        .iter()
        .take(k)
        .filter(|id| relevant.contains(id))
        .count();
    found as f64 / k as f64
}

/// Reciprocal rank of the first relevant document, 0.0 if none appears
pub fn mean_reciprocal_rank(ranking: &[DocId], relevant: &[DocId]) -> f64 {
    ranking
        .iter()
        .position(|id| relevant.contains(id))
        .map(|i| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judgments(pairs: &[(DocId, f64)]) -> HashMap<DocId, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_ndcg_perfect_ranking_is_one() {
        let judged = judgments(&[(1, 3.0), (2, 2.0), (3, 1.0), (4, 0.0)]);
        let score = ndcg(&[1, 2, 3, 4], &judged, 4);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ndcg_reversed_ranking_is_poor() {
        let judged = judgments(&[(1, 3.0), (2, 2.0), (3, 1.0), (4, 0.0)]);
        let score = ndcg(&[4, 3, 2, 1], &judged, 3);
        assert!(score > 0.0);
        assert!(score < 0.5);
    }

    #[test]
    fn test_ndcg_zero_judgments() {
        let judged = judgments(&[(1, 0.0), (2, 0.0)]);
        assert_eq!(ndcg(&[1, 2], &judged, 2), 0.0);
    }

    #[test]
    fn test_ndcg_empty_ranking() {
        let judged = judgments(&[(1, 3.0)]);
        assert_eq!(ndcg(&[], &judged, 10), 0.0);
        assert_eq!(ndcg(&[1], &judged, 0), 0.0);
    }

    #[test]
    fn test_ndcg_unjudged_documents_count_as_irrelevant() {
        let judged = judgments(&[(1, 2.0)]);
        let with_noise = ndcg(&[99, 1], &judged, 2);
        let clean = ndcg(&[1], &judged, 2);
        assert!(with_noise < clean);
    }

    #[test]
    fn test_recall() {
        assert_eq!(recall_at_k(&[1, 2, 3], &[1, 4], 3), 0.5);
        assert_eq!(recall_at_k(&[1, 4, 3], &[1, 4], 3), 1.0);
        assert_eq!(recall_at_k(&[1, 2, 4], &[1, 4], 2), 0.5);
        assert_eq!(recall_at_k(&[1, 2, 3], &[], 3), 0.0);
    }

    #[test]
    fn test_precision() {
        assert_eq!(precision_at_k(&[1, 2, 3, 4], &[1, 3], 4), 0.5);
        assert_eq!(precision_at_k(&[1, 3], &[1, 3], 2), 1.0);
        assert_eq!(precision_at_k(&[2, 4], &[1, 3], 2), 0.0);
        assert_eq!(precision_at_k(&[1], &[1], 0), 0.0);
    }

    #[test]
    fn test_mrr() {
        assert_eq!(mean_reciprocal_rank(&[1, 2, 3], &[1]), 1.0);
        assert!((mean_reciprocal_rank(&[5, 6, 2], &[2]) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(mean_reciprocal_rank(&[5, 6, 7], &[2]), 0.0);
        assert_eq!(mean_reciprocal_rank(&[], &[2]), 0.0);
    }
}
