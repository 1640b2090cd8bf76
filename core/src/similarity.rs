use crate::features::FeatureMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Corpus size beyond which the dense N x N matrix stops being a sensible
/// in-memory structure.
pub const SCALE_WARN_ITEMS: usize = 50_000;

/// Dense, symmetric N x N cosine similarity matrix stored row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    pub fn len(&self) -> usize { self.n }

    pub fn is_empty(&self) -> bool { self.n == 0 }

    /// True when the backing storage holds exactly `n * n` values.
    pub fn is_well_formed(&self) -> bool {
        self.n.checked_mul(self.n) == Some(self.values.len())
    }

    pub fn score(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.n || j >= self.n { return None; }
        self.values.get(i * self.n + j).copied()
    }

    pub fn row_slice(&self, position: usize) -> Option<&[f32]> {
        if position >= self.n { return None; }
        self.values.get(position * self.n..(position + 1) * self.n)
    }

    /// Full similarity row as (position, score) pairs in position order.
    pub fn row(&self, position: usize) -> Option<impl Iterator<Item = (usize, f32)> + '_> {
        self.row_slice(position).map(|r| r.iter().copied().enumerate())
    }
}

/// Cosine similarity between every pair of feature rows.
///
/// Zero rows score 0 against everything, including themselves; every other
/// diagonal entry is exactly 1.0 and off-diagonal values are clamped to [0, 1].
pub fn build(features: &FeatureMatrix) -> SimilarityMatrix {
    let start = Instant::now();
    let n = features.nrows();
    if n > SCALE_WARN_ITEMS {
        tracing::warn!(items = n, limit = SCALE_WARN_ITEMS, "similarity matrix is quadratic in corpus size");
    }
    let rows = features.rows();
    let norms: Vec<f32> = rows.iter().map(|r| r.norm()).collect();

    let mut values = vec![0.0f32; n * n];
    if n > 0 {
        values.par_chunks_mut(n).enumerate().for_each(|(i, out)| {
            if norms[i] == 0.0 { return; }
            for (j, slot) in out.iter_mut().enumerate() {
                *slot = if i == j {
                    1.0
                } else if norms[j] == 0.0 {
                    0.0
                } else {
                    (rows[i].dot(&rows[j]) / (norms[i] * norms[j])).clamp(0.0, 1.0)
                };
            }
        });
    }

    tracing::info!(items = n, elapsed_ms = start.elapsed().as_millis() as u64, "similarity matrix built");
    SimilarityMatrix { n, values }
}
