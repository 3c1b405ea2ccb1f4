//! Nearest document lookup by cosine similarity

use crate::vector::{cosine_similarity, SparseVector};

/// Minimum similarity a document must reach to count as an answer.
pub const DEFAULT_THRESHOLD: f32 = 0.40;

/// Best scoring document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub score: f32,
}

/// Cosine similarity of `query` against every document, in document order.
pub fn similarities(query: &SparseVector, documents: &[SparseVector]) -> Vec<f32> {
    documents.iter()
        .map(|doc| cosine_similarity(query, doc))
        .collect()
}

/// Finds the document closest to `query`.
///
/// Ties go to the lowest index. Returns `None` when there are no documents or
/// when the best score is below `threshold`.
///
/// # Examples
///
/// ```
/// use fixbot::matcher::{best_match, DEFAULT_THRESHOLD};
/// use fixbot::vector::SparseVector;
///
/// let docs = vec![
///     SparseVector::from_pairs(vec![(0, 1.0)]),
///     SparseVector::from_pairs(vec![(1, 1.0)]),
/// ];
/// let query = SparseVector::from_pairs(vec![(1, 2.0)]);
///
/// let found = best_match(&query, &docs, DEFAULT_THRESHOLD).unwrap();
/// assert_eq!(found.index, 1);
/// ```
pub fn best_match(query: &SparseVector, documents: &[SparseVector], threshold: f32) -> Option<Match> {
    let mut best: Option<Match> = None;

    for (index, doc) in documents.iter().enumerate() {
        let score = cosine_similarity(query, doc);
        match best {
            // strictly greater keeps the first occurrence on ties
            Some(current) if score <= current.score => {}
            _ => best = Some(Match { index, score }),
        }
    }

    best.filter(|m| m.score >= threshold)
}
