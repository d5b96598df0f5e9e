//! Similarity Source - nearest neighbours from the precomputed matrix
//!
//! ## Algorithm
//! 1. Read the queried movie's row of the similarity matrix
//! 2. Pair every other row with its score (the queried row is skipped by
//!    index, so it never appears even if another row outscores it)
//! 3. Order by score descending, lower row first on ties
//! 4. Return the first `limit` candidates
//!
//! Only the top `limit` entries need to be fully ordered, so the row is
//! partitioned with `select_nth_unstable_by` before sorting. The comparator is
//! a total order over (score, row), so the result is the same as a stable sort
//! of the whole row.

use crate::types::Candidate;
use data_loader::SimilarityStore;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of recommendations returned when the caller doesn't ask otherwise
pub const DEFAULT_LIMIT: usize = 29;

/// Ranks catalog rows by their precomputed similarity to a queried row
#[derive(Clone)]
pub struct SimilaritySource {
    /// Shared reference to the store (read-only, so no Mutex needed)
    store: Arc<SimilarityStore>,
}

impl SimilaritySource {
    /// Create a new similarity source
    pub fn new(store: Arc<SimilarityStore>) -> Self {
        Self { store }
    }

    /// Rank every other catalog row against `row` and keep the best `limit`.
    ///
    /// Returns `min(limit, len - 1)` candidates, or none if `row` is not a
    /// catalog row.
    #[instrument(skip(self))]
    pub fn get_candidates(&self, row: usize, limit: usize) -> Vec<Candidate> {
        let Some(scores) = self.store.similarity_row(row) else {
            debug!("Row {} is outside the catalog", row);
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let movies = self.store.movies();
        let mut candidates: Vec<Candidate> = scores
            .iter()
            .zip(movies)
            .enumerate()
            .filter(|&(other, _)| other != row)
            .map(|(other, (&score, movie))| Candidate::new(other, movie.id, score))
            .collect();

        if limit < candidates.len() {
            candidates.select_nth_unstable_by(limit, rank_order);
            candidates.truncate(limit);
        }
        candidates.sort_by(rank_order);

        debug!(
            "Ranked {} candidates for row {} (best score {:?})",
            candidates.len(),
            row,
            candidates.first().map(|c| c.score)
        );
        candidates
    }
}

/// Higher score first; equal scores keep catalog order
fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.row.cmp(&b.row))
}
