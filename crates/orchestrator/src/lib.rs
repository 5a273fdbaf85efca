//! Orchestrator crate for catalog analytics runs.
//!
//! This crate ties the analytics engines into one run: per-actor summaries
//! on a worker pool, then the collaboration table, then leaderboards and a
//! genre overview, all returned as one [`AnalyticsReport`].

pub mod config;
pub mod report;
pub mod orchestrator;

pub use config::AnalyticsConfig;
pub use orchestrator::{ReportOrchestrator, RunError};
pub use report::{AnalyticsReport, GenreOverview, LeaderboardEntry, Leaderboards, RunStatus};
