use std::cmp::Ordering;

use index::{EmbeddingStore, OccupationEntry};
use serde::Serialize;

/// Multiplier applied to the fused similarity before clamping. It trades precision for recall
/// on short queries and is not a calibrated probability.
pub const DEFAULT_BOOST_FACTOR: f32 = 1.2;

/// Cosine similarity of two vectors; 0.0 when either has zero norm or the lengths differ.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// One occupation in a result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult<'a> {
    pub occupation: &'a OccupationEntry,
    /// Boosted, clamped similarity in `[0, 1]`.
    pub confidence: f32,
    /// `confidence * 100`, rounded to two decimals.
    pub confidence_percent: f64,
}

impl<'a> RankedResult<'a> {
    fn new(occupation: &'a OccupationEntry, confidence: f32) -> Self {
        Self {
            occupation,
            confidence,
            confidence_percent: (f64::from(confidence) * 10_000.0).round() / 100.0,
        }
    }
}

/// Scores every stored occupation against a set of query vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityRanker {
    boost_factor: f32,
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self {
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl SimilarityRanker {
    pub fn new(boost_factor: f32) -> Self {
        Self { boost_factor }
    }

    pub fn boost_factor(&self) -> f32 {
        self.boost_factor
    }

    /// Per-occupation confidence: the maximum cosine similarity over all query vectors, boosted
    /// and clamped to `[0, 1]`. Indexed by occupation id. All zeros when `query_vectors` is
    /// empty.
    pub fn fused_scores(&self, query_vectors: &[Vec<f32>], store: &EmbeddingStore) -> Vec<f32> {
        let query_norms: Vec<f32> = query_vectors.iter().map(|q| l2_norm(q)).collect();

        store
            .iter()
            .map(|(_, stored, stored_norm)| {
                let best = query_vectors
                    .iter()
                    .zip(&query_norms)
                    .map(|(query, &query_norm)| {
                        if query_norm == 0.0 || stored_norm == 0.0 || query.len() != stored.len() {
                            0.0
                        } else {
                            dot(query, stored) / (query_norm * stored_norm)
                        }
                    })
                    .fold(f32::NEG_INFINITY, f32::max);
                if best == f32::NEG_INFINITY {
                    0.0
                } else {
                    (best * self.boost_factor).clamp(0.0, 1.0)
                }
            })
            .collect()
    }

    /// The `top_k` best occupations, highest confidence first. Equal confidences are ordered by
    /// ascending occupation id. Returns fewer than `top_k` results only when the store is
    /// smaller, and nothing for `top_k == 0` or no query vectors.
    pub fn rank<'s>(
        &self,
        query_vectors: &[Vec<f32>],
        store: &'s EmbeddingStore,
        top_k: usize,
    ) -> Vec<RankedResult<'s>> {
        if top_k == 0 || query_vectors.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .fused_scores(query_vectors, store)
            .into_iter()
            .enumerate()
            .collect();

        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
        };
        if top_k < scored.len() {
            scored.select_nth_unstable_by(top_k - 1, by_rank);
            scored.truncate(top_k);
        }
        scored.sort_unstable_by(by_rank);

        scored
            .into_iter()
            .filter_map(|(id, score)| store.entry(id).map(|entry| RankedResult::new(entry, score)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::EmbeddingSnapshot;

    fn store(embeddings: Vec<Vec<f32>>) -> EmbeddingStore {
        let occupations = (0..embeddings.len())
            .map(|i| format!("Occupation {i}"))
            .collect();
        EmbeddingStore::from_snapshot(EmbeddingSnapshot {
            occupations,
            embeddings,
            model_name: None,
        })
        .unwrap()
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[3.0, 4.0], &[6.0, 8.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn max_fusion_not_average() {
        let store = store(vec![vec![1.0, 0.0]]);
        let queries = vec![vec![0.5, 0.75f32.sqrt()], vec![0.8, 0.6]];
        let results = SimilarityRanker::default().rank(&queries, &store, 1);

        assert_eq!(results.len(), 1);
        assert!((results[0].confidence - 0.96).abs() < 1e-5);
        assert_eq!(results[0].confidence_percent, 96.0);
    }

    #[test]
    fn confidence_is_clamped_to_unit_interval() {
        let store = store(vec![vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.9, 0.1]]);
        let scores = SimilarityRanker::default().fused_scores(&[vec![1.0, 0.0]], &store);
        assert_eq!(scores[0], 1.0);
        assert_eq!(scores[1], 0.0);
        assert!(scores.iter().all(|&c| (0.0..=1.0).contains(&c)));
    }

    #[test]
    fn rank_returns_min_k_n_sorted_descending() {
        let store = store(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.7, 0.7],
            vec![0.2, 0.9],
        ]);
        let ranker = SimilarityRanker::new(1.0);
        let query = vec![vec![1.0, 0.1]];

        for k in [1, 2, 4, 10] {
            let results = ranker.rank(&query, &store, k);
            assert_eq!(results.len(), k.min(4));
            assert!(results
                .windows(2)
                .all(|w| w[0].confidence >= w[1].confidence));
        }
        assert_eq!(ranker.rank(&query, &store, 1)[0].occupation.id, 0);
    }

    #[test]
    fn zero_k_and_empty_queries_yield_nothing() {
        let store = store(vec![vec![1.0, 0.0]]);
        let ranker = SimilarityRanker::default();
        assert!(ranker.rank(&[vec![1.0, 0.0]], &store, 0).is_empty());
        assert!(ranker.rank(&[], &store, 5).is_empty());
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let store = store(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
        ]);
        let results = SimilarityRanker::default().rank(&[vec![1.0, 0.0]], &store, 2);
        let ids: Vec<usize> = results.iter().map(|r| r.occupation.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let all = SimilarityRanker::default().rank(&[vec![1.0, 0.0]], &store, 10);
        let ids: Vec<usize> = all.iter().map(|r| r.occupation.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 0]);
    }

    #[test]
    fn zero_query_vector_scores_zero() {
        let store = store(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let results = SimilarityRanker::default().rank(&[vec![0.0, 0.0]], &store, 2);
        assert!(results.iter().all(|r| r.confidence == 0.0));
        assert_eq!(results[0].occupation.id, 0);
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        let entry = OccupationEntry::new(0, "Chef");
        let result = RankedResult::new(&entry, 0.123456);
        assert_eq!(result.confidence_percent, 12.35);
    }
}
