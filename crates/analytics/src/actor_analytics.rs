//! Actor Analytics Engine
//!
//! Builds a summary of one person's body of work: counts, average ratings,
//! genre and year breakdowns, career span, rating distribution and
//! percentiles.
//!
//! ## Query Shape
//! Every summary costs a fixed number of store round trips:
//! 1. the person lookup
//! 2. movies for the person
//! 3. episodes for the person, joined with their show
//! 4. one bulk ratings fetch for all those movies
//! 5. one bulk ratings fetch for all those episodes
//!
//! All bucketing (genre, year, distribution) happens in memory afterwards,
//! so the number of genres or years never adds queries.

use crate::aggregator::{mean_of, validated_ratings, AverageRating, MeanAccumulator};
use crate::warnings::{Warnings, WorkUnit};
use chrono::{Datelike, NaiveDate};
use data_loader::{
    ActorId, ContentRef, ContentStore, DataIntegrityError, DirectorId, EpisodeCredit,
    EpisodeListing, Genre, Movie, MovieListing, ShowId, StoreError,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors that stop one summary from being produced
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// The store failed. Fatal to the whole run.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The requested person does not exist. Only this unit is skipped.
    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Per-genre slice of a person's work
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenreBreakdown {
    pub movies: u32,
    pub episodes: u32,
    /// Mean of the defined ratings of the content in this genre
    pub avg_rating: Option<AverageRating>,
}

/// Projects released or aired in one calendar year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct YearBreakdown {
    pub movies: u32,
    pub episodes: u32,
}

impl YearBreakdown {
    pub fn total_projects(&self) -> u32 {
        self.movies + self.episodes
    }
}

/// Percentiles of a person's individual ratings.
///
/// Each value is the rating at sorted position `floor(n * pct / 100)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingPercentiles {
    pub p25: u8,
    pub p50: u8,
    pub p75: u8,
    pub p90: u8,
}

impl RatingPercentiles {
    /// Read percentiles off a 1..=5 rating histogram, `None` when it is empty
    pub fn from_distribution(distribution: &[u32; 5]) -> Option<Self> {
        let total: u64 = distribution.iter().map(|&c| u64::from(c)).sum();
        if total == 0 {
            return None;
        }
        let at = |pct: u64| -> u8 {
            let rank = total * pct / 100;
            let mut seen = 0u64;
            for (star, &count) in (1u8..).zip(distribution.iter()) {
                seen += u64::from(count);
                if rank < seen {
                    return star;
                }
            }
            distribution.len() as u8
        };
        Some(Self {
            p25: at(25),
            p50: at(50),
            p75: at(75),
            p90: at(90),
        })
    }
}

/// Statistics over a set of movies and episodes.
///
/// Shared by actor and director summaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentStats {
    pub total_movies: u32,
    pub total_episodes: u32,
    /// Distinct shows the episodes belong to
    pub total_tv_shows: u32,
    pub avg_movie_rating: Option<AverageRating>,
    pub avg_episode_rating: Option<AverageRating>,
    pub overall_avg_rating: Option<AverageRating>,
    pub genre_breakdown: BTreeMap<Genre, GenreBreakdown>,
    pub genre_diversity: u32,
    pub yearly_breakdown: BTreeMap<i32, YearBreakdown>,
    pub first_credit: Option<NaiveDate>,
    pub latest_credit: Option<NaiveDate>,
    pub career_span_years: u32,
    /// Counts of valid individual ratings, index 0 holds 1-star ratings
    pub rating_distribution: [u32; 5],
    pub rating_percentiles: Option<RatingPercentiles>,
}

impl ContentStats {
    pub fn total_projects(&self) -> u32 {
        self.total_movies + self.total_episodes
    }

    /// Genre with the most projects, ties going to the first genre in
    /// catalog order
    pub fn primary_genre(&self) -> Option<Genre> {
        self.genre_breakdown
            .iter()
            .max_by(|(ga, a), (gb, b)| {
                (a.movies + a.episodes)
                    .cmp(&(b.movies + b.episodes))
                    .then_with(|| gb.cmp(ga))
            })
            .map(|(genre, _)| *genre)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSummary {
    pub actor_id: ActorId,
    pub name: String,
    #[serde(flatten)]
    pub stats: ContentStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorSummary {
    pub director_id: DirectorId,
    pub name: String,
    #[serde(flatten)]
    pub stats: ContentStats,
}

/// Running totals for one genre bucket
#[derive(Default)]
struct GenreTally {
    movies: u32,
    episodes: u32,
    ratings: MeanAccumulator,
}

/// Builds [`ContentStats`] one item at a time
#[derive(Default)]
struct StatsBuilder {
    movies: u32,
    episodes: u32,
    shows: BTreeSet<ShowId>,
    movie_means: MeanAccumulator,
    episode_means: MeanAccumulator,
    overall: MeanAccumulator,
    genres: BTreeMap<Genre, GenreTally>,
    years: BTreeMap<i32, YearBreakdown>,
    first: Option<NaiveDate>,
    latest: Option<NaiveDate>,
    distribution: [u32; 5],
}

impl StatsBuilder {
    fn add_ratings(&mut self, ratings: &[u8]) -> Option<AverageRating> {
        for &r in ratings {
            self.distribution[usize::from(r) - 1] += 1;
        }
        let mean = mean_of(ratings);
        self.overall.add_opt(mean);
        mean
    }

    fn add_date(&mut self, date: NaiveDate) {
        self.first = Some(self.first.map_or(date, |d| d.min(date)));
        self.latest = Some(self.latest.map_or(date, |d| d.max(date)));
    }

    fn add_movie(&mut self, movie: &Movie, ratings: &[u8]) {
        let mean = self.add_ratings(ratings);
        self.movies += 1;
        self.movie_means.add_opt(mean);

        let genre = self.genres.entry(movie.genre).or_default();
        genre.movies += 1;
        genre.ratings.add_opt(mean);

        self.years.entry(movie.release_date.year()).or_default().movies += 1;
        self.add_date(movie.release_date);
    }

    fn add_episode(&mut self, credit: &EpisodeCredit, show_genre: Genre, ratings: &[u8]) {
        let mean = self.add_ratings(ratings);
        self.episodes += 1;
        self.episode_means.add_opt(mean);

        let genre = self.genres.entry(show_genre).or_default();
        genre.episodes += 1;
        genre.ratings.add_opt(mean);

        let air_date = credit.episode.air_date;
        self.years.entry(air_date.year()).or_default().episodes += 1;
        self.add_date(air_date);
    }

    fn finish(self) -> ContentStats {
        let career_span_years = match (self.first, self.latest) {
            (Some(first), Some(latest)) => ((latest - first).num_days() / 365) as u32,
            _ => 0,
        };
        let genre_breakdown: BTreeMap<Genre, GenreBreakdown> = self
            .genres
            .into_iter()
            .map(|(genre, tally)| {
                let breakdown = GenreBreakdown {
                    movies: tally.movies,
                    episodes: tally.episodes,
                    avg_rating: tally.ratings.mean(),
                };
                (genre, breakdown)
            })
            .collect();

        ContentStats {
            total_movies: self.movies,
            total_episodes: self.episodes,
            total_tv_shows: self.shows.len() as u32,
            avg_movie_rating: self.movie_means.mean(),
            avg_episode_rating: self.episode_means.mean(),
            overall_avg_rating: self.overall.mean(),
            genre_diversity: genre_breakdown.len() as u32,
            genre_breakdown,
            yearly_breakdown: self.years,
            first_credit: self.first,
            latest_credit: self.latest,
            career_span_years,
            rating_distribution: self.distribution,
            rating_percentiles: RatingPercentiles::from_distribution(&self.distribution),
        }
    }
}

/// Computes per-person summaries against a content store.
#[derive(Clone)]
pub struct ActorAnalytics {
    store: Arc<dyn ContentStore>,
}

impl ActorAnalytics {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Summarize one actor's movies and episodes
    ///
    /// An actor with no content gets zero counts and undefined means.
    #[instrument(skip(self, warnings))]
    pub fn analyze_actor(&self, id: ActorId, warnings: &mut Warnings) -> Result<ActorSummary> {
        let actor = self
            .store
            .actor(id)?
            .ok_or_else(|| DataIntegrityError::dangling("actor", id.0, "actor analysis request"))?;

        let movies = self.store.movies_for_actor(id)?;
        let episodes = self.store.episodes_for_actor(id)?;
        let stats = self.content_stats(WorkUnit::Actor(id), movies, episodes, warnings)?;

        debug!(
            actor = %id,
            movies = stats.total_movies,
            episodes = stats.total_episodes,
            "actor summarized"
        );

        Ok(ActorSummary {
            actor_id: id,
            name: actor.full_name(),
            stats,
        })
    }

    /// Summarize one director's movies and episodes
    #[instrument(skip(self, warnings))]
    pub fn analyze_director(
        &self,
        id: DirectorId,
        warnings: &mut Warnings,
    ) -> Result<DirectorSummary> {
        let director = self.store.director(id)?.ok_or_else(|| {
            DataIntegrityError::dangling("director", id.0, "director analysis request")
        })?;

        let movies = self.store.movies_for_director(id)?;
        let episodes = self.store.episodes_for_director(id)?;
        let stats = self.content_stats(WorkUnit::Director(id), movies, episodes, warnings)?;

        Ok(DirectorSummary {
            director_id: id,
            name: director.full_name(),
            stats,
        })
    }

    /// Fetch ratings for the given content in bulk and bucket everything
    fn content_stats(
        &self,
        unit: WorkUnit,
        movies: MovieListing,
        episodes: EpisodeListing,
        warnings: &mut Warnings,
    ) -> Result<ContentStats> {
        for id in movies.unresolved {
            warnings.push(unit, DataIntegrityError::dangling("movie", id.0, unit));
        }
        for id in episodes.unresolved {
            warnings.push(unit, DataIntegrityError::dangling("episode", id.0, unit));
        }
        let mut movies = movies.records;
        let mut episodes = episodes.records;

        // Fixed iteration order keeps float sums reproducible
        movies.sort_by_key(|m| m.id);
        movies.dedup_by_key(|m| m.id);
        episodes.sort_by_key(|c| c.episode.id);
        episodes.dedup_by_key(|c| c.episode.id);

        let episodes: Vec<(EpisodeCredit, Genre, ShowId)> = episodes
            .into_iter()
            .filter_map(|credit| match credit.show {
                Some(show) => Some((credit, show.genre, show.show_id)),
                None => {
                    warnings.push(
                        unit,
                        DataIntegrityError::dangling(
                            "season",
                            credit.episode.season_id.0,
                            format!("episode {}", credit.episode.id),
                        ),
                    );
                    None
                }
            })
            .collect();

        let movie_ids: Vec<_> = movies.iter().map(|m| m.id).collect();
        let episode_ids: Vec<_> = episodes.iter().map(|(c, _, _)| c.episode.id).collect();
        let movie_ratings = self.store.movie_ratings(&movie_ids)?;
        let episode_ratings = self.store.episode_ratings(&episode_ids)?;

        let mut builder = StatsBuilder::default();

        for movie in &movies {
            let content = ContentRef::Movie(movie.id);
            let raw = movie_ratings.get(&movie.id).map(Vec::as_slice).unwrap_or(&[]);
            let valid = validated_ratings(content, raw, unit, warnings);
            builder.add_movie(movie, &valid);
        }

        for (credit, genre, show_id) in &episodes {
            let content = ContentRef::Episode(credit.episode.id);
            let raw = episode_ratings
                .get(&credit.episode.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let valid = validated_ratings(content, raw, unit, warnings);
            builder.shows.insert(*show_id);
            builder.add_episode(credit, *genre, &valid);
        }

        Ok(builder.finish())
    }
}
