//! Types shared by candidate sources.

use data_loader::MovieId;
use serde::Serialize;

/// A catalog row ranked against the queried movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    /// Catalog row (and matrix column) of this movie
    pub row: usize,
    pub movie_id: MovieId,
    /// Similarity to the queried movie
    pub score: f64,
}

impl Candidate {
    pub fn new(row: usize, movie_id: MovieId, score: f64) -> Self {
        Self {
            row,
            movie_id,
            score,
        }
    }
}
