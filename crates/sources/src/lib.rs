//! # Sources Crate
//!
//! Candidate generation for movie recommendations.
//!
//! ## Components
//!
//! ### Similarity Source
//! Nearest neighbours by precomputed similarity:
//! - "Movies most like the one you picked"
//! - Reads one row of the similarity matrix, no network access
//! - Deterministic: the same row always ranks the same way
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{SimilaritySource, DEFAULT_LIMIT};
//! use data_loader::SimilarityStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SimilarityStore::load_from_files(catalog, matrix)?);
//! let source = SimilaritySource::new(store.clone());
//!
//! let row = store.find_title("Avatar").unwrap();
//! let candidates = source.get_candidates(row, DEFAULT_LIMIT);
//! ```

// Public modules
pub mod types;
pub mod similarity;

// Re-export commonly used types
pub use types::Candidate;
pub use similarity::{SimilaritySource, DEFAULT_LIMIT};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_creation() {
        let candidate = Candidate::new(3, 550, 0.85);
        assert_eq!(candidate.row, 3);
        assert_eq!(candidate.movie_id, 550);
        assert_eq!(candidate.score, 0.85);
    }
}
