//! Core domain types for the movie catalog and its similarity matrix.
//!
//! The catalog is an ordered list of movies. A movie's position in that list
//! is its row in the similarity matrix, so the two are always stored together
//! in a [`SimilarityStore`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// TMDB identifier of a movie
pub type MovieId = u32;

// =============================================================================
// Movie
// =============================================================================

/// A movie in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
}

// =============================================================================
// SimilarityMatrix
// =============================================================================

/// Dense, square matrix of pairwise similarity scores.
///
/// Entry `(i, j)` is how similar movie `i` is to movie `j`; higher means more
/// alike. Scores are stored row-major in a single allocation so that a row
/// lookup is a slice borrow.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    dim: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build a matrix from row-major scores.
    ///
    /// Returns `None` unless `scores.len() == dim * dim`.
    pub fn from_flat(dim: usize, scores: Vec<f64>) -> Option<Self> {
        if dim.checked_mul(dim)? != scores.len() {
            return None;
        }
        Some(Self { dim, scores })
    }

    /// Build a matrix from nested rows.
    ///
    /// Returns `None` if the rows don't form a square.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let dim = rows.len();
        if rows.iter().any(|row| row.len() != dim) {
            return None;
        }
        Some(Self {
            dim,
            scores: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of rows (and columns)
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Borrow row `index`, or `None` if it is out of range
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.dim {
            return None;
        }
        let start = index * self.dim;
        Some(&self.scores[start..start + self.dim])
    }

    /// Score of `i` against `j`
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.row(i)?.get(j).copied()
    }
}

// =============================================================================
// SimilarityStore - catalog + matrix
// =============================================================================

/// The catalog and its similarity matrix, loaded once and then read-only.
///
/// Share it across tasks with `Arc<SimilarityStore>`; nothing mutates it after
/// construction so no locking is needed.
#[derive(Debug)]
pub struct SimilarityStore {
    pub(crate) movies: Vec<Movie>,
    pub(crate) matrix: SimilarityMatrix,
    /// Title -> first catalog row carrying that title
    pub(crate) title_index: HashMap<String, usize>,
}

impl SimilarityStore {
    /// Number of movies in the catalog
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// All movies in catalog order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Movie at catalog row `row`
    pub fn movie(&self, row: usize) -> Option<&Movie> {
        self.movies.get(row)
    }

    /// Row of the first movie whose title is exactly `title`.
    ///
    /// Matching is case-sensitive. When the catalog has duplicate titles only
    /// the first one is ever returned.
    pub fn find_title(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    /// Movies whose title contains `fragment`, ignoring case, in catalog order
    pub fn search_titles(&self, fragment: &str) -> Vec<&Movie> {
        let needle = fragment.to_lowercase();
        self.movies
            .iter()
            .filter(|movie| movie.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Similarity scores of `row` against every catalog row
    pub fn similarity_row(&self, row: usize) -> Option<&[f64]> {
        self.matrix.row(row)
    }
}
