use std::cmp::Ordering;

use crate::{
    error::{AppError, AppResult},
    models::ScoredPosition,
};

/// Dense N×N similarity scores, stored row-major
///
/// Entry (i, j) is the similarity of item i to item j. Values must be finite;
/// NaN is tolerated and ranks below every real score. The diagonal is never
/// consulted when ranking.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    dimension: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Validates and flattens a square matrix
    pub fn new(rows: Vec<Vec<f32>>) -> AppResult<Self> {
        let dimension = rows.len();
        let mut scores = Vec::with_capacity(dimension * dimension);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dimension {
                return Err(AppError::MalformedData(format!(
                    "similarity row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    dimension
                )));
            }

            if let Some(j) = row.iter().position(|score| score.is_infinite()) {
                return Err(AppError::MalformedData(format!(
                    "similarity entry ({}, {}) is not finite",
                    i, j
                )));
            }

            scores.extend(row);
        }

        Ok(Self { dimension, scores })
    }

    /// Number of rows (and columns)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Scores of `position` against every item, or `None` when out of range
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        if position >= self.dimension {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.scores[start..start + self.dimension])
    }
}

/// Selects the most similar items for a query position
#[derive(Debug, Clone)]
pub struct SimilarityRanker {
    matrix: SimilarityMatrix,
}

impl SimilarityRanker {
    pub fn new(matrix: SimilarityMatrix) -> Self {
        Self { matrix }
    }

    pub fn dimension(&self) -> usize {
        self.matrix.dimension()
    }

    /// Returns up to `k` other positions ordered by descending score
    ///
    /// Equal scores are ordered by ascending position, and NaN scores come
    /// after all real ones. `position` itself never appears in the result,
    /// whatever its self-similarity. The result holds `min(k, N - 1)` entries.
    ///
    /// Selection runs `select_nth_unstable_by` over the row before sorting
    /// only the kept prefix. Since `rank_order` is a strict total order over
    /// distinct positions, this yields exactly what a full sort would.
    pub fn top_k(&self, position: usize, k: usize) -> AppResult<Vec<ScoredPosition>> {
        let row = self
            .matrix
            .row(position)
            .ok_or_else(|| AppError::out_of_range(position, self.matrix.dimension()))?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<ScoredPosition> = row
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != position)
            .map(|(other, &score)| ScoredPosition {
                position: other,
                score,
            })
            .collect();

        let keep = k.min(candidates.len());
        if keep < candidates.len() {
            candidates.select_nth_unstable_by(keep, rank_order);
            candidates.truncate(keep);
        }
        candidates.sort_unstable_by(rank_order);

        Ok(candidates)
    }
}

/// Descending score, NaN last, then ascending position
fn rank_order(a: &ScoredPosition, b: &ScoredPosition) -> Ordering {
    let by_score = match (a.score.is_nan(), b.score.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal),
    };

    by_score.then_with(|| a.position.cmp(&b.position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranker(rows: Vec<Vec<f32>>) -> SimilarityRanker {
        SimilarityRanker::new(SimilarityMatrix::new(rows).unwrap())
    }

    /// Catalog [A, B, C, D] with A's row = [1.0, 0.9, 0.9, 0.2]
    fn four_items() -> SimilarityRanker {
        ranker(vec![
            vec![1.0, 0.9, 0.9, 0.2],
            vec![0.9, 1.0, 0.4, 0.3],
            vec![0.9, 0.4, 1.0, 0.7],
            vec![0.2, 0.3, 0.7, 1.0],
        ])
    }

    fn positions(results: &[ScoredPosition]) -> Vec<usize> {
        results.iter().map(|r| r.position).collect()
    }

    #[test]
    fn test_ties_break_by_ascending_position() {
        let results = four_items().top_k(0, 2).unwrap();
        assert_eq!(
            results,
            vec![
                ScoredPosition { position: 1, score: 0.9 },
                ScoredPosition { position: 2, score: 0.9 },
            ]
        );
    }

    #[test]
    fn test_k_larger_than_catalog_returns_n_minus_one() {
        let results = four_items().top_k(0, 10).unwrap();
        assert_eq!(positions(&results), vec![1, 2, 3]);
    }

    #[test]
    fn test_k_zero_returns_empty() {
        let ranker = four_items();
        for position in 0..4 {
            assert!(ranker.top_k(position, 0).unwrap().is_empty());
        }
    }

    #[test]
    fn test_never_includes_query_position() {
        let ranker = four_items();
        for position in 0..4 {
            for k in 0..6 {
                let results = ranker.top_k(position, k).unwrap();
                assert!(!positions(&results).contains(&position));
                assert_eq!(results.len(), k.min(3));
            }
        }
    }

    #[test]
    fn test_self_excluded_even_when_not_maximal() {
        let ranker = ranker(vec![
            vec![0.0, 0.5, 0.8],
            vec![0.5, 1.0, 0.1],
            vec![0.8, 0.1, 1.0],
        ]);

        let results = ranker.top_k(0, 5).unwrap();
        assert_eq!(positions(&results), vec![2, 1]);
    }

    #[test]
    fn test_self_excluded_exactly_once_when_tied_with_others() {
        let ranker = ranker(vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ]);

        assert_eq!(positions(&ranker.top_k(1, 5).unwrap()), vec![0, 2]);
    }

    #[test]
    fn test_results_sorted_descending() {
        let ranker = ranker(vec![
            vec![1.0, 0.1, 0.7, 0.3, 0.9, 0.5],
            vec![0.1, 1.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.7, 0.0, 1.0, 0.0, 0.0, 0.0],
            vec![0.3, 0.0, 0.0, 1.0, 0.0, 0.0],
            vec![0.9, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.5, 0.0, 0.0, 0.0, 0.0, 1.0],
        ]);

        let results = ranker.top_k(0, 3).unwrap();
        assert_eq!(positions(&results), vec![4, 2, 5]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_partial_selection_matches_full_ordering() {
        let n = 40;
        let rows: Vec<Vec<f32>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { 1.0 } else { ((i * 7 + j * 13) % 5) as f32 / 5.0 })
                    .collect()
            })
            .collect();
        let ranker = ranker(rows);

        let full = ranker.top_k(3, n).unwrap();
        for k in [1, 5, 12, 38, 39] {
            assert_eq!(ranker.top_k(3, k).unwrap(), full[..k].to_vec());
        }
    }

    #[test]
    fn test_nan_scores_rank_last() {
        let ranker = ranker(vec![
            vec![1.0, f32::NAN, 0.1, f32::NAN, 0.4],
            vec![0.0; 5],
            vec![0.0; 5],
            vec![0.0; 5],
            vec![0.0; 5],
        ]);

        let results = ranker.top_k(0, 4).unwrap();
        assert_eq!(positions(&results), vec![4, 2, 1, 3]);
        assert!(results[2].score.is_nan());
        assert!(results[3].score.is_nan());

        let truncated = ranker.top_k(0, 2).unwrap();
        assert_eq!(positions(&truncated), vec![4, 2]);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let ranker = four_items();
        let first = ranker.top_k(2, 3).unwrap();
        for _ in 0..10 {
            assert_eq!(ranker.top_k(2, 3).unwrap(), first);
        }
    }

    #[test]
    fn test_out_of_range_position() {
        let err = four_items().top_k(4, 2).unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfRange(_)));
    }

    #[test]
    fn test_single_item_catalog_has_no_neighbours() {
        let ranker = ranker(vec![vec![1.0]]);
        assert!(ranker.top_k(0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let err = SimilarityMatrix::new(vec![vec![1.0, 0.5], vec![0.5]]).unwrap_err();
        assert!(matches!(err, AppError::MalformedData(_)));
    }

    #[test]
    fn test_matrix_rejects_non_square() {
        let err = SimilarityMatrix::new(vec![vec![1.0, 0.5, 0.2], vec![0.5, 1.0, 0.1]])
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedData(_)));
    }

    #[test]
    fn test_matrix_rejects_infinite_scores() {
        let err = SimilarityMatrix::new(vec![vec![1.0, f32::INFINITY], vec![0.5, 1.0]])
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedData(_)));
    }

    #[test]
    fn test_matrix_row_access() {
        let matrix = SimilarityMatrix::new(vec![vec![1.0, 0.5], vec![0.25, 1.0]]).unwrap();
        assert_eq!(matrix.dimension(), 2);
        assert_eq!(matrix.row(1), Some(&[0.25, 1.0][..]));
        assert_eq!(matrix.row(2), None);
    }
}
