//! The data shape handed to report writers.

use analytics::{ActorSummary, AverageRating, CollaborationTable, Warnings};
use chrono::{DateTime, Utc};
use data_loader::{ActorId, Genre};
use serde::Serialize;
use std::collections::BTreeMap;

/// Whether a report covers everything that was asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    /// The run stopped early; the report holds whatever finished before
    Partial { reason: String },
}

impl RunStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, RunStatus::Complete)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub actor_id: ActorId,
    pub name: String,
    pub avg_rating: AverageRating,
    /// Movies or episodes, matching the board
    pub projects: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Leaderboards {
    pub top_movie_actors: Vec<LeaderboardEntry>,
    pub top_tv_actors: Vec<LeaderboardEntry>,
    /// Sum of the actors' movie credits
    pub total_movie_credits: u64,
    pub total_episode_credits: u64,
}

impl Leaderboards {
    /// Rank actors by average rating, highest first, ties by id
    pub fn from_summaries(summaries: &[ActorSummary], size: usize) -> Self {
        let board = |rating: fn(&ActorSummary) -> Option<AverageRating>,
                     projects: fn(&ActorSummary) -> u32| {
            let mut entries: Vec<LeaderboardEntry> = summaries
                .iter()
                .filter_map(|s| {
                    rating(s).map(|avg_rating| LeaderboardEntry {
                        actor_id: s.actor_id,
                        name: s.name.clone(),
                        avg_rating,
                        projects: projects(s),
                    })
                })
                .collect();
            entries.sort_by(|a, b| {
                b.avg_rating
                    .total_cmp(&a.avg_rating)
                    .then(a.actor_id.cmp(&b.actor_id))
            });
            entries.truncate(size);
            entries
        };

        Self {
            top_movie_actors: board(|s| s.stats.avg_movie_rating, |s| s.stats.total_movies),
            top_tv_actors: board(|s| s.stats.avg_episode_rating, |s| s.stats.total_episodes),
            total_movie_credits: summaries.iter().map(|s| u64::from(s.stats.total_movies)).sum(),
            total_episode_credits: summaries
                .iter()
                .map(|s| u64::from(s.stats.total_episodes))
                .sum(),
        }
    }
}

/// How one genre is represented across the analyzed actors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenreOverview {
    /// Actors with at least one project in the genre
    pub actors: u32,
    pub movie_credits: u32,
    pub episode_credits: u32,
}

pub fn genre_overview(summaries: &[ActorSummary]) -> BTreeMap<Genre, GenreOverview> {
    let mut overview: BTreeMap<Genre, GenreOverview> = BTreeMap::new();
    for summary in summaries {
        for (genre, breakdown) in &summary.stats.genre_breakdown {
            let entry = overview.entry(*genre).or_default();
            entry.actors += 1;
            entry.movie_credits += breakdown.movies;
            entry.episode_credits += breakdown.episodes;
        }
    }
    overview
}

/// Output of one analytics run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub status: RunStatus,
    /// Actors the run set out to analyze
    pub actors_requested: usize,
    /// One summary per analyzed actor, sorted by actor id
    pub summaries: Vec<ActorSummary>,
    /// Absent when the run stopped before the collaboration stage
    pub collaborations: Option<CollaborationTable>,
    pub leaderboards: Leaderboards,
    pub genre_overview: BTreeMap<Genre, GenreOverview>,
    pub warnings: Warnings,
}

impl AnalyticsReport {
    pub(crate) fn assemble(
        status: RunStatus,
        actors_requested: usize,
        summaries: Vec<ActorSummary>,
        collaborations: Option<CollaborationTable>,
        leaderboard_size: usize,
        warnings: Warnings,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            status,
            actors_requested,
            leaderboards: Leaderboards::from_summaries(&summaries, leaderboard_size),
            genre_overview: genre_overview(&summaries),
            summaries,
            collaborations,
            warnings,
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.status.is_complete()
    }

    pub fn summary(&self, id: ActorId) -> Option<&ActorSummary> {
        self.summaries
            .binary_search_by_key(&id, |s| s.actor_id)
            .ok()
            .map(|idx| &self.summaries[idx])
    }
}
