//! The read contract analytics code uses to reach the catalog.
//!
//! Every method is one round trip to the store. Bulk variants take a slice
//! of ids so callers can fetch everything a unit of work needs in a fixed
//! number of calls instead of one call per item.

use crate::error::StoreResult;
use crate::types::*;
use std::collections::HashMap;

/// Narrow, read-only view of a content store.
///
/// ## Design Note
/// - `Send + Sync` so one store can serve a pool of workers
/// - Object safe, so callers can hold `&dyn ContentStore` and tests can wrap
///   a store to count calls or inject failures
/// - Listings come back sorted by id
pub trait ContentStore: Send + Sync {
    /// Every actor, sorted by id
    fn actors(&self) -> StoreResult<Vec<Actor>>;

    fn actor(&self, id: ActorId) -> StoreResult<Option<Actor>>;

    fn director(&self, id: DirectorId) -> StoreResult<Option<Director>>;

    /// Movies the actor appears in, plus linked movie ids with no record
    fn movies_for_actor(&self, id: ActorId) -> StoreResult<MovieListing>;

    /// Episodes the actor appears in, joined with their show
    fn episodes_for_actor(&self, id: ActorId) -> StoreResult<EpisodeListing>;

    fn movies_for_director(&self, id: DirectorId) -> StoreResult<MovieListing>;

    fn episodes_for_director(&self, id: DirectorId) -> StoreResult<EpisodeListing>;

    /// Raw rating values per movie. Movies without ratings are absent.
    fn movie_ratings(&self, ids: &[MovieId]) -> StoreResult<HashMap<MovieId, Vec<RatingValue>>>;

    /// Raw rating values per episode. Episodes without ratings are absent.
    fn episode_ratings(
        &self,
        ids: &[EpisodeId],
    ) -> StoreResult<HashMap<EpisodeId, Vec<RatingValue>>>;

    /// Cast and crew per movie. Unknown movies are absent.
    fn movie_credits(&self, ids: &[MovieId]) -> StoreResult<HashMap<MovieId, Credits>>;

    /// Cast and crew per episode. Unknown episodes are absent.
    fn episode_credits(&self, ids: &[EpisodeId]) -> StoreResult<HashMap<EpisodeId, Credits>>;

    /// Episodes of each season in episode order. Unknown seasons are absent.
    fn season_episodes(
        &self,
        ids: &[SeasonId],
    ) -> StoreResult<HashMap<SeasonId, Vec<EpisodeId>>>;

    /// Seasons of a show in season order, or `None` if the show is unknown
    fn show_seasons(&self, id: ShowId) -> StoreResult<Option<Vec<SeasonId>>>;
}

impl CatalogIndex {
    fn load_movies(&self, ids: &[MovieId]) -> MovieListing {
        let mut listing = Listing {
            records: Vec::with_capacity(ids.len()),
            unresolved: Vec::new(),
        };
        for id in ids {
            match self.movies.get(id) {
                Some(movie) => listing.records.push(movie.clone()),
                None => listing.unresolved.push(*id),
            }
        }
        listing
    }

    fn episode_credits_for(&self, ids: &[EpisodeId]) -> EpisodeListing {
        let mut listing = Listing {
            records: Vec::with_capacity(ids.len()),
            unresolved: Vec::new(),
        };
        for id in ids {
            let Some(episode) = self.episodes.get(id) else {
                listing.unresolved.push(*id);
                continue;
            };
            listing.records.push(EpisodeCredit {
                episode: episode.clone(),
                show: self.show_of_episode(episode.id).map(|show| ShowRef {
                    show_id: show.id,
                    genre: show.genre,
                }),
            });
        }
        listing
    }
}

impl ContentStore for CatalogIndex {
    fn actors(&self) -> StoreResult<Vec<Actor>> {
        let mut actors: Vec<Actor> = self.actors.values().cloned().collect();
        actors.sort_by_key(|a| a.id);
        Ok(actors)
    }

    fn actor(&self, id: ActorId) -> StoreResult<Option<Actor>> {
        Ok(self.get_actor(id).cloned())
    }

    fn director(&self, id: DirectorId) -> StoreResult<Option<Director>> {
        Ok(self.get_director(id).cloned())
    }

    fn movies_for_actor(&self, id: ActorId) -> StoreResult<MovieListing> {
        Ok(self.load_movies(self.get_actor_movies(id)))
    }

    fn episodes_for_actor(&self, id: ActorId) -> StoreResult<EpisodeListing> {
        Ok(self.episode_credits_for(self.get_actor_episodes(id)))
    }

    fn movies_for_director(&self, id: DirectorId) -> StoreResult<MovieListing> {
        Ok(self.load_movies(self.get_director_movies(id)))
    }

    fn episodes_for_director(&self, id: DirectorId) -> StoreResult<EpisodeListing> {
        Ok(self.episode_credits_for(self.get_director_episodes(id)))
    }

    fn movie_ratings(&self, ids: &[MovieId]) -> StoreResult<HashMap<MovieId, Vec<RatingValue>>> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                let ratings = self.get_movie_ratings(*id);
                (!ratings.is_empty())
                    .then(|| (*id, ratings.iter().map(|r| r.rating).collect::<Vec<_>>()))
            })
            .collect())
    }

    fn episode_ratings(
        &self,
        ids: &[EpisodeId],
    ) -> StoreResult<HashMap<EpisodeId, Vec<RatingValue>>> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                let ratings = self.get_episode_ratings(*id);
                (!ratings.is_empty())
                    .then(|| (*id, ratings.iter().map(|r| r.rating).collect::<Vec<_>>()))
            })
            .collect())
    }

    fn movie_credits(&self, ids: &[MovieId]) -> StoreResult<HashMap<MovieId, Credits>> {
        Ok(ids
            .iter()
            .filter(|id| self.movies.contains_key(*id))
            .map(|id| {
                let credits = Credits {
                    actors: self.get_movie_cast(*id).to_vec(),
                    directors: self.get_movie_crew(*id).to_vec(),
                };
                (*id, credits)
            })
            .collect())
    }

    fn episode_credits(&self, ids: &[EpisodeId]) -> StoreResult<HashMap<EpisodeId, Credits>> {
        Ok(ids
            .iter()
            .filter(|id| self.episodes.contains_key(*id))
            .map(|id| {
                let credits = Credits {
                    actors: self.get_episode_cast(*id).to_vec(),
                    directors: self.get_episode_crew(*id).to_vec(),
                };
                (*id, credits)
            })
            .collect())
    }

    fn season_episodes(
        &self,
        ids: &[SeasonId],
    ) -> StoreResult<HashMap<SeasonId, Vec<EpisodeId>>> {
        Ok(ids
            .iter()
            .filter(|id| self.seasons.contains_key(*id))
            .map(|id| (*id, self.get_season_episodes(*id)))
            .collect())
    }

    fn show_seasons(&self, id: ShowId) -> StoreResult<Option<Vec<SeasonId>>> {
        if !self.shows.contains_key(&id) {
            return Ok(None);
        }
        Ok(Some(self.get_show_seasons(id)))
    }
}
