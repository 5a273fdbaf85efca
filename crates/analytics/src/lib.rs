//! Rating and collaboration analytics over a catalog content store.
//!
//! This crate provides:
//! - RatingAggregator for movie, episode, season and show ratings
//! - ActorAnalytics for per-actor (and per-director) summaries
//! - CollaborationAnalyzer for actor-actor and actor-director co-appearances
//! - Warnings, the run-scoped list of data-integrity problems
//!
//! ## Architecture
//! Everything reads the catalog through `data_loader::ContentStore`, held as
//! `Arc<dyn ContentStore>`. Nothing here caches between calls: state that
//! outlives a single call (warnings, tallies) is owned by the caller.
//!
//! Undefined ratings are `None`, never 0.
//!
//! ## Example Usage
//! ```ignore
//! use analytics::{ActorAnalytics, CollaborationAnalyzer, Warnings};
//!
//! let mut warnings = Warnings::new();
//! let summary = ActorAnalytics::new(store.clone()).analyze_actor(ActorId(1), &mut warnings)?;
//!
//! let table = CollaborationAnalyzer::new(store)
//!     .with_top_k(5)
//!     .analyze(&actor_ids, &mut warnings)?;
//! ```

pub mod warnings;
pub mod aggregator;
pub mod actor_analytics;
pub mod collaboration;

// Re-export main types
pub use warnings::{Warning, Warnings, WorkUnit};
pub use aggregator::{mean_of, mean_of_means, AverageRating, RatingAggregator, RollupStrategy};
pub use actor_analytics::{
    ActorAnalytics, ActorSummary, AnalyticsError, ContentStats, DirectorSummary, GenreBreakdown,
    RatingPercentiles, Result, YearBreakdown,
};
pub use collaboration::{
    CollaborationAnalyzer, CollaborationTable, Collaborator, DirectorCollaboration,
    PairCollaboration,
};
