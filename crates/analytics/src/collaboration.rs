//! Collaboration Analyzer
//!
//! Counts how often actors appear together and how often each actor works
//! with each director.
//!
//! ## Algorithm
//! Checking every pair of actors is O(N²) store calls. Instead:
//! 1. List each actor's movies and episodes, and invert that into
//!    `content -> cast` restricted to the population. Crews for the same
//!    content are fetched in two bulk calls. This step is a barrier: no
//!    counting starts until the whole inversion exists.
//! 2. Partition content items across rayon workers. Each worker counts the
//!    pairs inside each cast into its own local tally.
//! 3. Merge the local tallies and sort the result.
//!
//! Work is O(content × cast²), which is far below N² when casts are small
//! relative to the population.

use crate::warnings::{Warnings, WorkUnit};
use data_loader::{
    ActorId, ContentStore, Credits, DataIntegrityError, DirectorId, EpisodeId, EpisodeListing,
    MovieId, MovieListing, StoreResult,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Co-appearances of one unordered pair of actors. `actor_a < actor_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairCollaboration {
    pub actor_a: ActorId,
    pub actor_b: ActorId,
    pub shared_movies: u32,
    pub shared_episodes: u32,
    pub total: u32,
}

/// One entry of an actor's top collaborators list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Collaborator {
    pub actor_id: ActorId,
    pub count: u32,
}

/// Number of movies and episodes an actor made with a director
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectorCollaboration {
    pub actor_id: ActorId,
    pub director_id: DirectorId,
    pub count: u32,
}

/// Result of one collaboration analysis.
///
/// Every collection is sorted, so two runs over the same snapshot produce
/// identical tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollaborationTable {
    /// Pairs with at least one shared project, sorted by (actor_a, actor_b)
    pub pairs: Vec<PairCollaboration>,
    /// Top-K collaborators per actor in the population (count desc, id asc)
    pub top_collaborators: BTreeMap<ActorId, Vec<Collaborator>>,
    /// Actor-director pairs, sorted by (actor_id, director_id)
    pub directors: Vec<DirectorCollaboration>,
}

impl CollaborationTable {
    /// Shared movies plus shared episodes of two actors, in either order.
    /// Zero for an actor with itself.
    pub fn collaboration(&self, a: ActorId, b: ActorId) -> u32 {
        self.pair(a, b).map_or(0, |p| p.total)
    }

    pub fn pair(&self, a: ActorId, b: ActorId) -> Option<&PairCollaboration> {
        if a == b {
            return None;
        }
        let key = (a.min(b), a.max(b));
        self.pairs
            .binary_search_by(|p| (p.actor_a, p.actor_b).cmp(&key))
            .ok()
            .map(|idx| &self.pairs[idx])
    }

    pub fn top_collaborators(&self, id: ActorId) -> &[Collaborator] {
        self.top_collaborators
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn directors_of(&self, id: ActorId) -> impl Iterator<Item = &DirectorCollaboration> {
        self.directors.iter().filter(move |d| d.actor_id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Movie,
    Episode,
}

/// One content item after inversion: cast within the population, sorted
struct CastEntry {
    kind: ContentKind,
    cast: Vec<ActorId>,
    crew: Vec<DirectorId>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PairCounts {
    movies: u32,
    episodes: u32,
}

/// Counts produced by one worker
#[derive(Default)]
struct PartialTally {
    pairs: HashMap<(ActorId, ActorId), PairCounts>,
    directors: HashMap<(ActorId, DirectorId), u32>,
}

impl PartialTally {
    fn add(mut self, entry: &CastEntry) -> Self {
        for (i, &a) in entry.cast.iter().enumerate() {
            for &b in &entry.cast[i + 1..] {
                let counts = self.pairs.entry((a, b)).or_default();
                match entry.kind {
                    ContentKind::Movie => counts.movies += 1,
                    ContentKind::Episode => counts.episodes += 1,
                }
            }
            for &director in &entry.crew {
                *self.directors.entry((a, director)).or_insert(0) += 1;
            }
        }
        self
    }

    fn merge(mut self, other: PartialTally) -> Self {
        for (pair, counts) in other.pairs {
            let acc = self.pairs.entry(pair).or_default();
            acc.movies += counts.movies;
            acc.episodes += counts.episodes;
        }
        for (key, count) in other.directors {
            *self.directors.entry(key).or_insert(0) += count;
        }
        self
    }
}

/// Computes collaboration tables over a population of actors.
#[derive(Clone)]
pub struct CollaborationAnalyzer {
    store: Arc<dyn ContentStore>,
    top_k: usize,
}

impl CollaborationAnalyzer {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store, top_k: 5 }
    }

    /// Configure how many collaborators to keep per actor (default: 5)
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Analyze collaborations among `actors`.
    ///
    /// Duplicate ids are ignored. Round trips: two listings per actor plus
    /// two bulk credit fetches.
    #[instrument(skip(self, actors, warnings), fields(actors = actors.len()))]
    pub fn analyze(
        &self,
        actors: &[ActorId],
        warnings: &mut Warnings,
    ) -> StoreResult<CollaborationTable> {
        let population: Vec<ActorId> = actors
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let entries = self.invert(&population, warnings)?;
        debug!(content = entries.len(), "cast inversion built");

        let tally = entries
            .par_iter()
            .fold(PartialTally::default, |tally, entry| tally.add(entry))
            .reduce(PartialTally::default, PartialTally::merge);

        let table = self.build_table(&population, tally);
        info!(
            pairs = table.pairs.len(),
            director_pairs = table.directors.len(),
            "collaboration analysis complete"
        );
        Ok(table)
    }

    /// Build `content -> cast ∩ population` plus each item's crew
    fn invert(
        &self,
        population: &[ActorId],
        warnings: &mut Warnings,
    ) -> StoreResult<Vec<CastEntry>> {
        let listings: Vec<(ActorId, MovieListing, EpisodeListing)> = population
            .par_iter()
            .map(|&id| -> StoreResult<(ActorId, MovieListing, EpisodeListing)> {
                let movies = self.store.movies_for_actor(id)?;
                let episodes = self.store.episodes_for_actor(id)?;
                Ok((id, movies, episodes))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        // Population is sorted, so every cast list comes out sorted
        let mut movie_casts: BTreeMap<MovieId, Vec<ActorId>> = BTreeMap::new();
        let mut episode_casts: BTreeMap<EpisodeId, Vec<ActorId>> = BTreeMap::new();
        for (actor, movies, episodes) in listings {
            for movie in movies.records {
                push_unique(movie_casts.entry(movie.id).or_default(), actor);
            }
            for credit in episodes.records {
                push_unique(episode_casts.entry(credit.episode.id).or_default(), actor);
            }
            for id in movies.unresolved {
                let error = DataIntegrityError::dangling("movie", id.0, format!("actor {}", actor));
                warnings.push(WorkUnit::Collaboration, error);
            }
            for id in episodes.unresolved {
                let error =
                    DataIntegrityError::dangling("episode", id.0, format!("actor {}", actor));
                warnings.push(WorkUnit::Collaboration, error);
            }
        }

        let movie_ids: Vec<MovieId> = movie_casts.keys().copied().collect();
        let episode_ids: Vec<EpisodeId> = episode_casts.keys().copied().collect();
        let movie_credits = self.store.movie_credits(&movie_ids)?;
        let episode_credits = self.store.episode_credits(&episode_ids)?;

        let mut entries = Vec::with_capacity(movie_casts.len() + episode_casts.len());
        for (id, cast) in movie_casts {
            let crew = crew_of(movie_credits.get(&id), "movie", id.0, warnings);
            entries.push(CastEntry {
                kind: ContentKind::Movie,
                cast,
                crew,
            });
        }
        for (id, cast) in episode_casts {
            let crew = crew_of(episode_credits.get(&id), "episode", id.0, warnings);
            entries.push(CastEntry {
                kind: ContentKind::Episode,
                cast,
                crew,
            });
        }
        Ok(entries)
    }

    fn build_table(&self, population: &[ActorId], tally: PartialTally) -> CollaborationTable {
        let mut pairs: Vec<PairCollaboration> = tally
            .pairs
            .into_iter()
            .map(|((actor_a, actor_b), counts)| PairCollaboration {
                actor_a,
                actor_b,
                shared_movies: counts.movies,
                shared_episodes: counts.episodes,
                total: counts.movies + counts.episodes,
            })
            .collect();
        pairs.sort_unstable_by_key(|p| (p.actor_a, p.actor_b));

        let mut per_actor: BTreeMap<ActorId, Vec<Collaborator>> =
            population.iter().map(|&id| (id, Vec::new())).collect();
        for pair in &pairs {
            for (me, other) in [(pair.actor_a, pair.actor_b), (pair.actor_b, pair.actor_a)] {
                if let Some(list) = per_actor.get_mut(&me) {
                    list.push(Collaborator {
                        actor_id: other,
                        count: pair.total,
                    });
                }
            }
        }
        for list in per_actor.values_mut() {
            list.sort_unstable_by(|a, b| b.count.cmp(&a.count).then(a.actor_id.cmp(&b.actor_id)));
            list.truncate(self.top_k);
        }

        let mut directors: Vec<DirectorCollaboration> = tally
            .directors
            .into_iter()
            .map(|((actor_id, director_id), count)| DirectorCollaboration {
                actor_id,
                director_id,
                count,
            })
            .collect();
        directors.sort_unstable_by_key(|d| (d.actor_id, d.director_id));

        CollaborationTable {
            pairs,
            top_collaborators: per_actor,
            directors,
        }
    }
}

fn push_unique(cast: &mut Vec<ActorId>, actor: ActorId) {
    if cast.last() != Some(&actor) {
        cast.push(actor);
    }
}

/// Crew of a listed item, or a warning if the store no longer knows it
fn crew_of(
    credits: Option<&Credits>,
    entity: &'static str,
    id: u32,
    warnings: &mut Warnings,
) -> Vec<DirectorId> {
    match credits {
        Some(credits) => credits.directors.clone(),
        None => {
            warnings.push(
                WorkUnit::Collaboration,
                DataIntegrityError::dangling(entity, id, "cast listing"),
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use data_loader::{Actor, CatalogIndex, Director, Genre, Movie, Person};

    fn create_test_index() -> CatalogIndex {
        let mut index = CatalogIndex::new();
        for id in 1..=4 {
            index.insert_actor(Actor {
                id: ActorId(id),
                person: Person::new("Actor", id.to_string()),
            });
        }
        index.insert_director(Director {
            id: DirectorId(1),
            person: Person::new("Director", "One"),
        });
        for id in 1..=2 {
            index.insert_movie(Movie {
                id: MovieId(id),
                title: format!("Movie {}", id),
                genre: Genre::Action,
                release_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                duration_minutes: 90,
                poster: String::new(),
            });
        }
        // M1 {1, 2, 3}, M2 {2, 3}
        for actor in [1, 2, 3] {
            index.link_movie_actor(MovieId(1), ActorId(actor));
        }
        for actor in [2, 3] {
            index.link_movie_actor(MovieId(2), ActorId(actor));
        }
        index.link_movie_director(MovieId(1), DirectorId(1));
        index.link_movie_director(MovieId(2), DirectorId(1));
        index
    }

    fn analyze(actors: &[u32]) -> CollaborationTable {
        let ids: Vec<ActorId> = actors.iter().map(|&id| ActorId(id)).collect();
        CollaborationAnalyzer::new(Arc::new(create_test_index()))
            .analyze(&ids, &mut Warnings::new())
            .unwrap()
    }

    #[test]
    fn test_shared_movie_counts() {
        let table = analyze(&[1, 2, 3, 4]);

        assert_eq!(table.collaboration(ActorId(2), ActorId(3)), 2);
        assert_eq!(table.collaboration(ActorId(1), ActorId(2)), 1);
        assert_eq!(table.collaboration(ActorId(1), ActorId(3)), 1);
        assert_eq!(table.collaboration(ActorId(1), ActorId(4)), 0);
        assert_eq!(table.pairs.len(), 3);
    }

    #[test]
    fn test_population_restricts_cast() {
        let table = analyze(&[1, 2]);

        assert_eq!(table.pairs.len(), 1);
        assert_eq!(table.collaboration(ActorId(1), ActorId(2)), 1);
        assert_eq!(table.collaboration(ActorId(2), ActorId(3)), 0);
    }

    #[test]
    fn test_director_counts() {
        let table = analyze(&[1, 2, 3]);

        let counts: Vec<(u32, u32)> = table
            .directors
            .iter()
            .map(|d| (d.actor_id.0, d.count))
            .collect();
        assert_eq!(counts, vec![(1, 1), (2, 2), (3, 2)]);
        assert_eq!(table.directors_of(ActorId(2)).count(), 1);
    }

    #[test]
    fn test_actor_without_collaborators_has_empty_list() {
        let table = analyze(&[1, 4]);

        assert!(table.pairs.is_empty());
        assert!(table.top_collaborators(ActorId(4)).is_empty());
        assert!(table.top_collaborators.contains_key(&ActorId(4)));
    }

    #[test]
    fn test_unresolved_links_are_reported_not_counted() {
        let mut index = create_test_index();
        index.link_movie_actor(MovieId(999), ActorId(1));
        index.link_movie_actor(MovieId(999), ActorId(4));

        let mut warnings = Warnings::new();
        let table = CollaborationAnalyzer::new(Arc::new(index))
            .analyze(&[ActorId(1), ActorId(4)], &mut warnings)
            .unwrap();

        assert_eq!(table.collaboration(ActorId(1), ActorId(4)), 0);
        let errors: Vec<_> = warnings.iter().map(|w| w.error.clone()).collect();
        assert_eq!(
            errors,
            vec![
                DataIntegrityError::dangling("movie", 999, "actor 1"),
                DataIntegrityError::dangling("movie", 999, "actor 4"),
            ]
        );
    }

    #[test]
    fn test_duplicate_ids_are_ignored() {
        let table = analyze(&[3, 2, 3, 2]);
        assert_eq!(table.collaboration(ActorId(2), ActorId(3)), 2);
    }
}
