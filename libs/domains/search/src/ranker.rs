//! Similarity ranking of embedded candidates against a query vector.

use domain_products::Product;

use crate::config::DEFAULT_SIMILARITY_FLOOR;
use crate::error::{SearchError, SearchResult};
use crate::similarity::cosine_similarity;

/// A candidate together with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub product: Product,
    pub score: f32,
}

/// Orders candidates by cosine similarity, keeping only those above a floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityRanker {
    floor: f32,
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_FLOOR)
    }
}

impl SimilarityRanker {
    pub fn new(floor: f32) -> Self {
        Self { floor }
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Score every comparable candidate strictly above the floor.
    ///
    /// Candidates without an embedding, or whose dimension differs from the
    /// query, are skipped. The result is sorted by descending score; equal
    /// scores keep their input order.
    pub fn score(&self, query: &[f32], candidates: Vec<Product>) -> Vec<ScoredCandidate> {
        let mut skipped = 0usize;

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter_map(|product| {
                let comparable = product
                    .embedding
                    .as_deref()
                    .is_some_and(|e| !e.is_empty() && e.len() == query.len());
                if !comparable {
                    skipped += 1;
                    return None;
                }

                let score = product
                    .embedding
                    .as_deref()
                    .map_or(0.0, |e| cosine_similarity(query, e));
                (score > self.floor).then_some(ScoredCandidate { product, score })
            })
            .collect();

        if skipped > 0 {
            tracing::debug!(skipped, "Skipped candidates with incompatible embeddings");
        }

        // sort_by is stable, so ties keep discovery order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Top `limit` scored candidates
    pub fn rank_scored(
        &self,
        query: &[f32],
        candidates: Vec<Product>,
        limit: i64,
    ) -> SearchResult<Vec<ScoredCandidate>> {
        let limit = validate_limit(limit)?;
        let mut scored = self.score(query, candidates);
        scored.truncate(limit);
        Ok(scored)
    }

    /// Top `limit` products, best match first
    pub fn rank(
        &self,
        query: &[f32],
        candidates: Vec<Product>,
        limit: i64,
    ) -> SearchResult<Vec<Product>> {
        Ok(self
            .rank_scored(query, candidates, limit)?
            .into_iter()
            .map(|c| c.product)
            .collect())
    }
}

/// A result limit must be a positive count
pub fn validate_limit(limit: i64) -> SearchResult<usize> {
    if limit <= 0 {
        return Err(SearchError::InvalidLimit(limit));
    }
    usize::try_from(limit).map_err(|_| SearchError::InvalidLimit(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_products::NewProduct;

    fn product(pid: &str, embedding: Option<Vec<f32>>) -> Product {
        Product::new(NewProduct {
            pid: pid.to_string(),
            title: pid.to_string(),
            embedding,
            ..Default::default()
        })
    }

    fn pids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.pid.as_str()).collect()
    }

    #[test]
    fn test_ranks_by_similarity_and_applies_floor() {
        let query = [1.0, 0.0];
        let candidates = vec![
            product("A", Some(vec![1.0, 0.0])),
            product("B", Some(vec![0.0, 1.0])),
            product("C", Some(vec![0.7, 0.7])),
        ];

        let ranked = SimilarityRanker::default()
            .rank(&query, candidates, 10)
            .unwrap();
        assert_eq!(pids(&ranked), vec!["A", "C"]);
    }

    #[test]
    fn test_orthogonal_and_opposite_candidates_are_dropped() {
        let candidates = vec![
            product("same", Some(vec![1.0, 0.0])),
            product("orthogonal", Some(vec![0.0, 1.0])),
            product("opposite", Some(vec![-1.0, 0.0])),
        ];

        let ranked = SimilarityRanker::default()
            .rank(&[1.0, 0.0], candidates, 10)
            .unwrap();
        assert_eq!(pids(&ranked), vec!["same"]);
    }

    #[test]
    fn test_floor_is_exclusive() {
        let query = [1.0, 0.0];
        let candidates = vec![product("A", Some(vec![1.0, 0.0]))];

        let ranked = SimilarityRanker::new(1.0)
            .rank(&query, candidates, 10)
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_skips_mismatched_and_missing_embeddings() {
        let query = [1.0, 0.0];
        let candidates = vec![
            product("A", Some(vec![1.0, 0.0])),
            product("D", Some(vec![1.0, 0.0, 0.0])),
            product("E", None),
        ];

        let ranked = SimilarityRanker::default()
            .rank(&query, candidates, 10)
            .unwrap();
        assert_eq!(pids(&ranked), vec!["A"]);
    }

    #[test]
    fn test_rejects_non_positive_limit() {
        let ranker = SimilarityRanker::default();
        let candidates = vec![product("A", Some(vec![1.0, 0.0]))];

        assert!(matches!(
            ranker.rank(&[1.0, 0.0], candidates.clone(), 0),
            Err(SearchError::InvalidLimit(0))
        ));
        assert!(matches!(
            ranker.rank(&[1.0, 0.0], candidates, -3),
            Err(SearchError::InvalidLimit(-3))
        ));
    }

    #[test]
    fn test_limit_truncates_and_scores_descend() {
        let query = [1.0, 0.0];
        let candidates: Vec<Product> = (0..10)
            .map(|i| {
                let angle = i as f32 * 0.1;
                product(&format!("P{}", i), Some(vec![angle.cos(), angle.sin()]))
            })
            .collect();

        let scored = SimilarityRanker::default()
            .rank_scored(&query, candidates, 3)
            .unwrap();
        assert_eq!(scored.len(), 3);
        assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(scored[0].product.pid, "P0");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let query = [1.0, 0.0];
        let candidates = vec![
            product("first", Some(vec![2.0, 0.0])),
            product("second", Some(vec![1.0, 0.0])),
            product("third", Some(vec![5.0, 0.0])),
        ];

        let ranked = SimilarityRanker::default()
            .rank(&query, candidates, 10)
            .unwrap();
        assert_eq!(pids(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_reranking_output_is_stable() {
        let query = [0.6, 0.8];
        let candidates = vec![
            product("A", Some(vec![0.6, 0.8])),
            product("B", Some(vec![1.0, 0.0])),
            product("C", Some(vec![0.0, 1.0])),
            product("D", Some(vec![0.6, 0.8])),
        ];

        let ranker = SimilarityRanker::default();
        let once = ranker.rank(&query, candidates, 10).unwrap();
        let twice = ranker.rank(&query, once.clone(), 10).unwrap();
        assert_eq!(pids(&once), pids(&twice));
    }

    #[test]
    fn test_empty_query_vector_matches_nothing() {
        let candidates = vec![product("A", Some(vec![1.0, 0.0]))];
        let ranked = SimilarityRanker::default()
            .rank(&[], candidates, 10)
            .unwrap();
        assert!(ranked.is_empty());
    }
}
