use data_loader::ModelSnapshot;
use std::path::Path;
use std::time::Instant;

fn main() {
    let model_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "app/models/recommendation_model.json".to_string());

    println!("Loading similarity snapshot from {}...\n", model_path);

    let start = Instant::now();
    let snapshot = ModelSnapshot::load_from_file(Path::new(&model_path))
        .expect("Failed to load snapshot");
    let elapsed = start.elapsed();

    let (movies, dim) = snapshot.counts();
    let cells = dim * dim;

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Matrix: {}x{} ({} scores)", dim, dim, cells);
    println!("\nPerformance: {:.0} scores/second",
             cells as f64 / elapsed.as_secs_f64());
}
