use anyhow::{Context, Result};
use data_loader::CatalogIndex;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let data_dir = Path::new("data/catalog");

    println!("Loading catalog snapshot...\n");

    let start = Instant::now();
    let index = CatalogIndex::load_from_files(data_dir).context("Failed to load catalog")?;
    let elapsed = start.elapsed();

    let counts = index.counts();
    let ratings = counts.movie_ratings + counts.episode_ratings;

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Actors: {}", counts.actors);
    println!("Directors: {}", counts.directors);
    println!("Movies: {}", counts.movies);
    println!("Shows: {} ({} seasons, {} episodes)", counts.shows, counts.seasons, counts.episodes);
    println!("Ratings: {}", ratings);
    println!("Integrity issues: {}", index.audit().len());
    println!(
        "\nPerformance: {:.0} ratings/second",
        ratings as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
