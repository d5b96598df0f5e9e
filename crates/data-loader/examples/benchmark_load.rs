use data_loader::SimilarityStore;
use std::path::Path;
use std::time::Instant;

fn main() {
    let catalog = Path::new("data/movies.csv");
    let matrix = Path::new("data/similarity.json");

    println!("Loading catalog and similarity matrix...\n");

    let start = Instant::now();
    let store = SimilarityStore::load_from_files(catalog, matrix)
        .expect("Failed to load data");
    let elapsed = start.elapsed();

    let cells = store.len() * store.len();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", store.len());
    println!("Matrix cells: {}", cells);
    println!("\nPerformance: {:.0} cells/second",
             cells as f64 / elapsed.as_secs_f64());
}
