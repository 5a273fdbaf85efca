//! # Data Loader Crate
//!
//! This crate loads a movie/TV catalog snapshot and serves it through the
//! read contract the analytics crates depend on.
//!
//! ## Main Components
//!
//! - **types**: Domain records (Actor, Director, Movie, TvShow, Season,
//!   Episode, ratings) and the in-memory CatalogIndex
//! - **parser**: Parse `::`-delimited .dat files into Rust structs
//! - **index**: Load a snapshot directory, validate and audit it
//! - **store**: The `ContentStore` trait and its CatalogIndex implementation
//! - **error**: Load, store and data-integrity error types
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{ActorId, CatalogIndex, ContentStore};
//! use std::path::Path;
//!
//! let index = CatalogIndex::load_from_files(Path::new("data/catalog"))?;
//!
//! let movies = index.movies_for_actor(ActorId(1))?;
//! let ids: Vec<_> = movies.records.iter().map(|m| m.id).collect();
//! let ratings = index.movie_ratings(&ids)?;
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{DataIntegrityError, DataLoadError, Result, StoreError, StoreResult};
pub use store::ContentStore;
pub use types::{
    // Identifiers
    ActorId,
    DirectorId,
    EpisodeId,
    MovieId,
    RatingId,
    SeasonId,
    ShowId,
    // Records
    Actor,
    Director,
    Episode,
    EpisodeRating,
    Movie,
    MovieRating,
    Person,
    Season,
    TvShow,
    // Projections
    ContentRef,
    Credits,
    EpisodeCredit,
    EpisodeListing,
    Listing,
    MovieListing,
    ShowRef,
    // Store
    CatalogCounts,
    CatalogIndex,
    // Values
    Genre,
    RatingValue,
    MAX_RATING,
    MIN_RATING,
};
