//! # Data Loader Crate
//!
//! Loads the movie catalog and its precomputed similarity matrix.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, SimilarityMatrix, SimilarityStore)
//! - **parser**: Parse the catalog CSV and the matrix file
//! - **store**: Assemble and validate the SimilarityStore
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::SimilarityStore;
//! use std::path::Path;
//!
//! let store = SimilarityStore::load_from_files(
//!     Path::new("data/movies.csv"),
//!     Path::new("data/similarity.json"),
//! )?;
//!
//! let row = store.find_title("Avatar").unwrap();
//! let scores = store.similarity_row(row).unwrap();
//! println!("{} has {} neighbours", store.movie(row).unwrap().title, scores.len() - 1);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{Movie, MovieId, SimilarityMatrix, SimilarityStore};
