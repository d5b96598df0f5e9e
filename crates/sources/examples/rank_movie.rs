//! Example: rank the movies most similar to one title
//!
//! Run with: cargo run --package sources --example rank_movie -- "Avatar"
//!
//! Expects `data/movies.csv` and `data/similarity.json` relative to the
//! working directory. No network access is needed.

use anyhow::{anyhow, Context};
use data_loader::SimilarityStore;
use sources::{SimilaritySource, DEFAULT_LIMIT};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let title = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: rank_movie <title>"))?;

    println!("Loading catalog and similarity matrix...");
    let start = Instant::now();
    let store = Arc::new(
        SimilarityStore::load_from_files(
            Path::new("data/movies.csv"),
            Path::new("data/similarity.json"),
        )
        .context("Failed to load data")?,
    );
    println!("Loaded {} movies in {:?}\n", store.len(), start.elapsed());

    let row = store
        .find_title(&title)
        .ok_or_else(|| anyhow!("'{}' is not in the catalog", title))?;

    let source = SimilaritySource::new(store.clone());
    let start = Instant::now();
    let candidates = source.get_candidates(row, DEFAULT_LIMIT);
    println!("Ranked in {:?}", start.elapsed());

    for (rank, candidate) in candidates.iter().enumerate() {
        let movie = &store.movies()[candidate.row];
        println!("{:>2}. {} ({:.3})", rank + 1, movie.title, candidate.score);
    }

    Ok(())
}
