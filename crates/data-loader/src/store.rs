//! Building and validating the SimilarityStore.
//!
//! The catalog and matrix files are independent, so they are parsed in
//! parallel and only then checked against each other.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

impl SimilarityStore {
    /// Load the catalog and similarity matrix from disk.
    ///
    /// This is the main entry point for loading data. Any failure here means
    /// the store cannot be used; nothing is retried.
    pub fn load_from_files(catalog_path: &Path, matrix_path: &Path) -> Result<Self> {
        info!(
            "Loading catalog from {:?} and similarity matrix from {:?}",
            catalog_path, matrix_path
        );

        let (movies, matrix) = rayon::join(
            || parser::parse_catalog(catalog_path),
            || parser::parse_matrix(matrix_path),
        );
        let movies = movies?;
        let matrix = matrix?;

        info!(
            "Loaded {} movies and a {}x{} similarity matrix",
            movies.len(),
            matrix.dim(),
            matrix.dim()
        );

        Self::from_parts(movies, matrix)
    }

    /// Assemble a store from already-parsed parts, validating them.
    pub fn from_parts(movies: Vec<Movie>, matrix: SimilarityMatrix) -> Result<Self> {
        validate(&movies, &matrix)?;

        let mut title_index = HashMap::with_capacity(movies.len());
        let mut duplicates = 0usize;
        for (row, movie) in movies.iter().enumerate() {
            // First occurrence wins
            if title_index.contains_key(&movie.title) {
                duplicates += 1;
                continue;
            }
            title_index.insert(movie.title.clone(), row);
        }
        if duplicates > 0 {
            warn!(
                "{} catalog rows repeat an earlier title; lookups resolve to the first row",
                duplicates
            );
        }

        Ok(Self {
            movies,
            matrix,
            title_index,
        })
    }
}

/// Check that the catalog and matrix describe the same movies
fn validate(movies: &[Movie], matrix: &SimilarityMatrix) -> Result<()> {
    if movies.is_empty() {
        return Err(DataLoadError::ValidationError(
            "catalog contains no movies".to_string(),
        ));
    }
    if movies.len() != matrix.dim() {
        return Err(DataLoadError::DimensionMismatch {
            catalog: movies.len(),
            matrix: matrix.dim(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
        }
    }

    fn identity(dim: usize) -> SimilarityMatrix {
        let rows = (0..dim)
            .map(|i| (0..dim).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        SimilarityMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_from_parts_dimension_mismatch() {
        let err = SimilarityStore::from_parts(vec![movie(1, "A"), movie(2, "B")], identity(3))
            .unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::DimensionMismatch { catalog: 2, matrix: 3 }
        ));
    }

    #[test]
    fn test_from_parts_rejects_empty_catalog() {
        let err = SimilarityStore::from_parts(vec![], identity(0)).unwrap_err();
        assert!(matches!(err, DataLoadError::ValidationError(_)));
    }

    #[test]
    fn test_duplicate_titles_resolve_to_first_row() {
        let store = SimilarityStore::from_parts(
            vec![movie(1, "Heat"), movie(2, "Alien"), movie(3, "Heat")],
            identity(3),
        )
        .unwrap();

        assert_eq!(store.find_title("Heat"), Some(0));
        assert_eq!(store.find_title("Alien"), Some(1));
        assert_eq!(store.find_title("heat"), None);
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let catalog = dir.path().join("movies.csv");
        let matrix = dir.path().join("similarity.json");
        std::fs::write(&catalog, "movie_id,title\n10,A\n20,B\n").unwrap();
        std::fs::write(&matrix, "[[1.0, 0.4], [0.4, 1.0]]").unwrap();

        let store = SimilarityStore::load_from_files(&catalog, &matrix).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.movie(1).unwrap().id, 20);
        assert_eq!(store.similarity_row(0).unwrap(), &[1.0, 0.4]);
    }
}
