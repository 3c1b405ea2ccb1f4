//! This is the vector math module
//! Provide sparse vectors, dot product and cosine similarity

use serde::{Deserialize, Serialize};

/// Sparse vector over vocabulary dimensions.
///
/// Entries are kept sorted by dimension and only non-zero weights are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// Builds a vector from `(dimension, weight)` pairs in any order.
    ///
    /// Zero weights are dropped. Duplicate dimensions are summed.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> SparseVector {
        pairs.sort_by_key(|&(dim, _)| dim);

        let mut entries: Vec<(u32, f32)> = Vec::with_capacity(pairs.len());
        for (dim, weight) in pairs {
            match entries.last_mut() {
                Some(last) if last.0 == dim => last.1 += weight,
                _ => entries.push((dim, weight)),
            }
        }
        entries.retain(|&(_, weight)| weight != 0.0);

        SparseVector { entries }
    }

    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    /// Number of non-zero dimensions.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight stored for `dim`, zero when absent.
    pub fn get(&self, dim: u32) -> f32 {
        match self.entries.binary_search_by_key(&dim, |&(d, _)| d) {
            Ok(pos) => self.entries[pos].1,
            Err(_) => 0.0,
        }
    }

    /// Euclidean length
    /// ||v|| = sqrt(sum(v[i]^2))
    pub fn magnitude(&self) -> f32 {
        self.entries.iter()
            .map(|(_, w)| w * w)
            .sum::<f32>()
            .sqrt()
    }
}

/// Dot Product
/// dot_prod = sum(a[i] * b[i]) over dimensions present in both vectors
pub fn dot_product(left: &SparseVector, right: &SparseVector) -> f32 {
    let (a, b) = (left.entries(), right.entries());
    let (mut i, mut j) = (0, 0);
    let mut dot_prod = 0.0;

    while i < a.len() && j < b.len() {
        if a[i].0 == b[j].0 {
            dot_prod += a[i].1 * b[j].1;
            i += 1;
            j += 1;
        } else if a[i].0 < b[j].0 {
            i += 1;
        } else {
            j += 1;
        }
    }

    dot_prod
}

/// Cosine Similarity
/// cos = dot(a, b) / (||a|| * ||b||)
/// Similarity involving a zero vector is defined as 0
pub fn cosine_similarity(left: &SparseVector, right: &SparseVector) -> f32 {
    let denom = left.magnitude() * right.magnitude();
    if denom == 0.0 {
        return 0.0;
    }

    dot_product(left, right) / denom
}
