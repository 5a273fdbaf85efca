//! Rating Aggregator
//!
//! Turns raw rating rows into average ratings for movies, episodes, seasons
//! and shows.
//!
//! ## Rules
//! - An item with no valid ratings has no rating (`None`), never 0.
//! - A rating outside 1..=5 is recorded as a warning and skipped.
//! - Seasons and shows roll up their children according to
//!   [`RollupStrategy`]. Children without a rating are left out of the
//!   divisor.

use crate::warnings::{Warnings, WorkUnit};
use data_loader::{
    ContentRef, ContentStore, DataIntegrityError, EpisodeId, MovieId, RatingValue, SeasonId,
    ShowId, StoreResult, MAX_RATING, MIN_RATING,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A defined average rating.
///
/// Holds the full-precision mean; `rounded` and `Display` give the one
/// decimal place shown to people.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct AverageRating(f64);

impl AverageRating {
    pub fn value(self) -> f64 {
        self.0
    }

    /// Rounded to one decimal place, halves away from zero
    pub fn rounded(self) -> f64 {
        (self.0 * 10.0).round() / 10.0
    }

    /// Total order for sorting. Means of valid ratings are never NaN.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for AverageRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.rounded())
    }
}

/// How a season or show combines its children's ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollupStrategy {
    /// Average of the children's averages. Every rated child weighs the
    /// same no matter how many ratings it received.
    #[default]
    MeanOfMeans,
    /// One flat average over every individual rating underneath.
    Pooled,
}

/// Mean of a set of valid ratings. `None` for an empty set.
pub fn mean_of(ratings: &[u8]) -> Option<AverageRating> {
    if ratings.is_empty() {
        return None;
    }
    let total: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
    Some(AverageRating(total as f64 / ratings.len() as f64))
}

/// Mean of already-defined averages, in iteration order.
pub fn mean_of_means(means: impl IntoIterator<Item = AverageRating>) -> Option<AverageRating> {
    let mut acc = MeanAccumulator::default();
    for mean in means {
        acc.add(mean.value());
    }
    acc.mean()
}

/// Keep the in-range values of `raw`, recording a warning for the rest.
pub fn validated_ratings(
    content: ContentRef,
    raw: &[RatingValue],
    unit: WorkUnit,
    warnings: &mut Warnings,
) -> Vec<u8> {
    let mut valid = Vec::with_capacity(raw.len());
    for &value in raw {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            valid.push(value as u8);
        } else {
            warnings.push(
                unit,
                DataIntegrityError::RatingOutOfRange { content, value },
            );
        }
    }
    valid
}

/// Running sum and count for a mean.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MeanAccumulator {
    sum: f64,
    count: u32,
}

impl MeanAccumulator {
    pub(crate) fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub(crate) fn add_opt(&mut self, value: Option<AverageRating>) {
        if let Some(value) = value {
            self.add(value.value());
        }
    }

    pub(crate) fn mean(&self) -> Option<AverageRating> {
        (self.count > 0).then(|| AverageRating(self.sum / self.count as f64))
    }
}

/// Computes ratings for individual catalog items.
///
/// Each call makes a fixed number of store round trips regardless of how
/// many children or ratings are involved.
#[derive(Clone)]
pub struct RatingAggregator {
    store: Arc<dyn ContentStore>,
    strategy: RollupStrategy,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            strategy: RollupStrategy::default(),
        }
    }

    /// Configure how seasons and shows roll up (default: mean of means)
    pub fn with_strategy(mut self, strategy: RollupStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> RollupStrategy {
        self.strategy
    }

    /// Average of a movie's own ratings
    pub fn movie_rating(
        &self,
        id: MovieId,
        warnings: &mut Warnings,
    ) -> StoreResult<Option<AverageRating>> {
        let content = ContentRef::Movie(id);
        let ratings = self.store.movie_ratings(&[id])?;
        let raw = ratings.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        Ok(mean_of(&validated_ratings(
            content,
            raw,
            WorkUnit::Content(content),
            warnings,
        )))
    }

    /// Average of an episode's own ratings
    pub fn episode_rating(
        &self,
        id: EpisodeId,
        warnings: &mut Warnings,
    ) -> StoreResult<Option<AverageRating>> {
        let content = ContentRef::Episode(id);
        let ratings = self.store.episode_ratings(&[id])?;
        let raw = ratings.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        Ok(mean_of(&validated_ratings(
            content,
            raw,
            WorkUnit::Content(content),
            warnings,
        )))
    }

    /// Season rating from its episodes.
    ///
    /// Round trips: containment, then one bulk ratings fetch.
    #[instrument(skip(self, warnings))]
    pub fn season_rating(
        &self,
        id: SeasonId,
        warnings: &mut Warnings,
    ) -> StoreResult<Option<AverageRating>> {
        let unit = WorkUnit::Content(ContentRef::Season(id));
        let containment = self.store.season_episodes(&[id])?;
        let Some(episodes) = containment.get(&id) else {
            warnings.push(
                unit,
                DataIntegrityError::dangling("season", id.0, "season rating request"),
            );
            return Ok(None);
        };

        let ratings = self.store.episode_ratings(episodes)?;
        let season = self.rollup_season(episodes, &ratings, unit, warnings);
        debug!(season = %id, episodes = episodes.len(), "season rolled up");
        Ok(season.mean(self.strategy))
    }

    /// Show rating from its seasons.
    ///
    /// Round trips: seasons, containment for all seasons at once, then one
    /// bulk ratings fetch for every episode of the show.
    #[instrument(skip(self, warnings))]
    pub fn show_rating(
        &self,
        id: ShowId,
        warnings: &mut Warnings,
    ) -> StoreResult<Option<AverageRating>> {
        let unit = WorkUnit::Content(ContentRef::Show(id));
        let Some(seasons) = self.store.show_seasons(id)? else {
            warnings.push(
                unit,
                DataIntegrityError::dangling("show", id.0, "show rating request"),
            );
            return Ok(None);
        };

        let containment = self.store.season_episodes(&seasons)?;
        let all_episodes: Vec<EpisodeId> = seasons
            .iter()
            .filter_map(|season_id| containment.get(season_id))
            .flatten()
            .copied()
            .collect();
        let ratings = self.store.episode_ratings(&all_episodes)?;

        let mut show = Rollup::default();
        for season_id in &seasons {
            let Some(episodes) = containment.get(season_id) else {
                continue;
            };
            let season = self.rollup_season(episodes, &ratings, unit, warnings);
            show.absorb(season, self.strategy);
        }
        Ok(show.mean(self.strategy))
    }

    fn rollup_season(
        &self,
        episodes: &[EpisodeId],
        ratings: &HashMap<EpisodeId, Vec<RatingValue>>,
        unit: WorkUnit,
        warnings: &mut Warnings,
    ) -> Rollup {
        let mut rollup = Rollup::default();
        for episode_id in episodes {
            let raw = ratings.get(episode_id).map(Vec::as_slice).unwrap_or(&[]);
            let valid = validated_ratings(ContentRef::Episode(*episode_id), raw, unit, warnings);
            rollup.add_leaf(&valid);
        }
        rollup
    }
}

/// Intermediate state of one level of the roll-up.
///
/// Tracks both the children's means and the pooled leaf ratings so either
/// strategy can be answered from the same pass.
#[derive(Debug, Default)]
struct Rollup {
    child_means: MeanAccumulator,
    leaf_sum: u64,
    leaf_count: u64,
}

impl Rollup {
    fn add_leaf(&mut self, ratings: &[u8]) {
        self.child_means.add_opt(mean_of(ratings));
        self.leaf_sum += ratings.iter().map(|&r| u64::from(r)).sum::<u64>();
        self.leaf_count += ratings.len() as u64;
    }

    fn absorb(&mut self, child: Rollup, strategy: RollupStrategy) {
        if strategy == RollupStrategy::MeanOfMeans {
            self.child_means.add_opt(child.mean(strategy));
        }
        self.leaf_sum += child.leaf_sum;
        self.leaf_count += child.leaf_count;
    }

    fn mean(&self, strategy: RollupStrategy) -> Option<AverageRating> {
        match strategy {
            RollupStrategy::MeanOfMeans => self.child_means.mean(),
            RollupStrategy::Pooled => (self.leaf_count > 0)
                .then(|| AverageRating(self.leaf_sum as f64 / self.leaf_count as f64)),
        }
    }
}
