//! Similarity index over the chunk collection.
//!
//! Exactly one representation is active at a time. Row i of either
//! representation always corresponds to chunk i of the store's chunk
//! collection; ranking returns row indices so callers can map hits back.

use crate::embeddings::cosine_similarity;
use crate::error::{Result, StoreError};
use crate::lexical::{sparse_dot, SparseVector};
use ndarray::Array2;

/// The active index representation.
pub enum Index {
    /// No chunks indexed
    Empty,
    /// Dense matrix, one embedding row per chunk
    Dense(Array2<f32>),
    /// Sparse lexical rows in the fitted vocabulary space
    Lexical(Vec<SparseVector>),
}

impl Index {
    /// Build a dense index from provider row vectors.
    ///
    /// All rows must share one non-zero dimension.
    pub fn from_dense_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        if rows.is_empty() {
            return Ok(Self::Empty);
        }
        let dim = rows[0].len();
        if dim == 0 {
            return Err(StoreError::embedding("provider returned empty vectors"));
        }
        let mut flat = Vec::with_capacity(rows.len() * dim);
        for row in &rows {
            if row.len() != dim {
                return Err(StoreError::InvalidDimension {
                    expected: dim,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let matrix = Array2::from_shape_vec((rows.len(), dim), flat)
            .map_err(|err| StoreError::Other(err.to_string()))?;
        Ok(Self::Dense(matrix))
    }

    /// Number of indexed rows
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Dense(matrix) => matrix.nrows(),
            Self::Lexical(rows) => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rank dense rows against a query vector by cosine similarity.
///
/// Returns `(row_index, score)` sorted by descending score, at most `k`
/// entries. Tie order among equal scores is unspecified.
pub fn rank_dense(matrix: &Array2<f32>, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
    if matrix.ncols() != query.len() {
        return Err(StoreError::InvalidDimension {
            expected: matrix.ncols(),
            actual: query.len(),
        });
    }

    let mut scores: Vec<(usize, f32)> = matrix
        .outer_iter()
        .enumerate()
        .map(|(row_index, row)| {
            let row: Vec<f32> = row.to_vec();
            (row_index, cosine_similarity(&row, query))
        })
        .collect();

    sort_descending(&mut scores);
    scores.truncate(k);
    Ok(scores)
}

/// Rank sparse lexical rows against a projected query vector.
#[must_use]
pub fn rank_sparse(rows: &[SparseVector], query: &SparseVector, k: usize) -> Vec<(usize, f32)> {
    let mut scores: Vec<(usize, f32)> = rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| (row_index, sparse_dot(row, query)))
        .collect();

    sort_descending(&mut scores);
    scores.truncate(k);
    scores
}

fn sort_descending(scores: &mut [(usize, f32)]) {
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_ranking_orders_by_similarity() {
        let index = Index::from_dense_rows(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.9, 0.1, 0.0],
            vec![0.0, 1.0, 0.0],
        ])
        .unwrap();
        let Index::Dense(matrix) = index else {
            panic!("expected dense index");
        };

        let results = rank_dense(&matrix, &[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0, 1);
        assert!(results[1].1 > 0.9);
    }

    #[test]
    fn test_dense_dimension_mismatch() {
        let Index::Dense(matrix) =
            Index::from_dense_rows(vec![vec![1.0, 0.0, 0.0]]).unwrap()
        else {
            panic!("expected dense index");
        };
        assert!(rank_dense(&matrix, &[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Index::from_dense_rows(vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_rows_builds_empty_index() {
        let index = Index::from_dense_rows(Vec::new()).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_k_larger_than_row_count() {
        let Index::Dense(matrix) =
            Index::from_dense_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap()
        else {
            panic!("expected dense index");
        };
        let results = rank_dense(&matrix, &[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_sparse_ranking() {
        let rows = vec![
            vec![(0, 1.0)],
            vec![(1, 1.0)],
            vec![(0, 0.6), (1, 0.8)],
        ];
        let query = vec![(0, 1.0)];
        let results = rank_sparse(&rows, &query, 3);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0, 2);
        assert_eq!(results[2].0, 1);
        assert_eq!(results[2].1, 0.0);
    }
}
