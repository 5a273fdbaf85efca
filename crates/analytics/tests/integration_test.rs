//! Integration tests for the analytics crate.
//!
//! These run the aggregator, actor analytics and collaboration analyzer
//! against one small catalog, and wrap the store to check how many round
//! trips each operation makes.

use analytics::{
    ActorAnalytics, CollaborationAnalyzer, RatingAggregator, RollupStrategy, Warnings,
};
use chrono::NaiveDate;
use data_loader::{
    Actor, ActorId, CatalogIndex, ContentStore, Credits, Director, DirectorId, Episode,
    EpisodeId, EpisodeListing, EpisodeRating, Genre, Movie, MovieId, MovieListing, MovieRating,
    Person, RatingId, RatingValue, Season, SeasonId, ShowId, StoreResult, TvShow,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Catalog used by every test:
/// - actors 1..=6, director 1
/// - M1 cast {1, 2, 3}, M2 cast {2, 3}, both directed by director 1
/// - M3 cast {4, 5}, M4 cast {4, 6} (ties for actor 4)
/// - show 1 (Comedy) with seasons 1 and 2; episodes 1, 2 in season 1 and
///   episode 3 in season 2; actors 1 and 2 appear in episode 1
fn create_test_index() -> CatalogIndex {
    let mut index = CatalogIndex::new();

    for id in 1..=6 {
        index.insert_actor(Actor {
            id: ActorId(id),
            person: Person::new("Actor", format!("No{}", id)),
        });
    }
    index.insert_director(Director {
        id: DirectorId(1),
        person: Person::new("Rosa", "Lind"),
    });

    let movies = [
        (1, Genre::Drama, date(1998, 2, 1)),
        (2, Genre::Drama, date(2004, 7, 1)),
        (3, Genre::Horror, date(2012, 10, 31)),
        (4, Genre::Horror, date(2013, 10, 31)),
    ];
    for (id, genre, release_date) in movies {
        index.insert_movie(Movie {
            id: MovieId(id),
            title: format!("Movie {}", id),
            genre,
            release_date,
            duration_minutes: 95,
            poster: String::new(),
        });
    }
    for (movie, actors) in [(1, vec![1, 2, 3]), (2, vec![2, 3]), (3, vec![4, 5]), (4, vec![4, 6])]
    {
        for actor in actors {
            index.link_movie_actor(MovieId(movie), ActorId(actor));
        }
    }
    index.link_movie_director(MovieId(1), DirectorId(1));
    index.link_movie_director(MovieId(2), DirectorId(1));

    index.insert_show(TvShow {
        id: ShowId(1),
        title: "Open Office".to_string(),
        genre: Genre::Comedy,
        start_date: date(2006, 1, 1),
        end_date: Some(date(2008, 1, 1)),
        poster: String::new(),
    });
    for (id, number) in [(1, 1), (2, 2)] {
        index.insert_season(Season {
            id: SeasonId(id),
            show_id: ShowId(1),
            number,
            title: format!("Season {}", number),
            air_date: date(2005 + number as i32, 1, 1),
        });
    }
    for (id, season, number) in [(1, 1, 1), (2, 1, 2), (3, 2, 1)] {
        index.insert_episode(Episode {
            id: EpisodeId(id),
            season_id: SeasonId(season),
            title: format!("Episode {}", id),
            episode_number: number,
            air_date: date(2006, 1, 7 * id),
            description: String::new(),
            duration_minutes: 22,
        });
    }
    index.link_episode_actor(EpisodeId(1), ActorId(1));
    index.link_episode_actor(EpisodeId(1), ActorId(2));

    let mut next_id = 0;
    let mut rate_movie = |index: &mut CatalogIndex, movie: u32, rating: RatingValue| {
        next_id += 1;
        index.insert_movie_rating(MovieRating {
            id: RatingId(next_id),
            movie_id: MovieId(movie),
            rating,
        });
    };
    for (movie, rating) in [(1, 5), (1, 3), (2, 4), (3, 1)] {
        rate_movie(&mut index, movie, rating);
    }
    // episode 1 {5, 5}, episode 2 unrated, episode 3 {2}
    for (id, episode, rating) in [(100, 1, 5), (101, 1, 5), (102, 3, 2)] {
        index.insert_episode_rating(EpisodeRating {
            id: RatingId(id),
            episode_id: EpisodeId(episode),
            rating,
        });
    }

    index
}

/// Delegating store that counts every round trip
struct CountingStore {
    inner: CatalogIndex,
    calls: AtomicUsize,
}

impl CountingStore {
    fn new(inner: CatalogIndex) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentStore for CountingStore {
    fn actors(&self) -> StoreResult<Vec<Actor>> {
        self.tick();
        self.inner.actors()
    }

    fn actor(&self, id: ActorId) -> StoreResult<Option<Actor>> {
        self.tick();
        self.inner.actor(id)
    }

    fn director(&self, id: DirectorId) -> StoreResult<Option<Director>> {
        self.tick();
        self.inner.director(id)
    }

    fn movies_for_actor(&self, id: ActorId) -> StoreResult<MovieListing> {
        self.tick();
        self.inner.movies_for_actor(id)
    }

    fn episodes_for_actor(&self, id: ActorId) -> StoreResult<EpisodeListing> {
        self.tick();
        self.inner.episodes_for_actor(id)
    }

    fn movies_for_director(&self, id: DirectorId) -> StoreResult<MovieListing> {
        self.tick();
        self.inner.movies_for_director(id)
    }

    fn episodes_for_director(&self, id: DirectorId) -> StoreResult<EpisodeListing> {
        self.tick();
        self.inner.episodes_for_director(id)
    }

    fn movie_ratings(&self, ids: &[MovieId]) -> StoreResult<HashMap<MovieId, Vec<RatingValue>>> {
        self.tick();
        self.inner.movie_ratings(ids)
    }

    fn episode_ratings(
        &self,
        ids: &[EpisodeId],
    ) -> StoreResult<HashMap<EpisodeId, Vec<RatingValue>>> {
        self.tick();
        self.inner.episode_ratings(ids)
    }

    fn movie_credits(&self, ids: &[MovieId]) -> StoreResult<HashMap<MovieId, Credits>> {
        self.tick();
        self.inner.movie_credits(ids)
    }

    fn episode_credits(&self, ids: &[EpisodeId]) -> StoreResult<HashMap<EpisodeId, Credits>> {
        self.tick();
        self.inner.episode_credits(ids)
    }

    fn season_episodes(
        &self,
        ids: &[SeasonId],
    ) -> StoreResult<HashMap<SeasonId, Vec<EpisodeId>>> {
        self.tick();
        self.inner.season_episodes(ids)
    }

    fn show_seasons(&self, id: ShowId) -> StoreResult<Option<Vec<SeasonId>>> {
        self.tick();
        self.inner.show_seasons(id)
    }
}

#[test]
fn test_show_rollup_excludes_unrated_episode() {
    let aggregator = RatingAggregator::new(Arc::new(create_test_index()));
    let mut warnings = Warnings::new();

    // season 1: episode 1 = 5.0, episode 2 unrated -> 5.0
    let season = aggregator
        .season_rating(SeasonId(1), &mut warnings)
        .unwrap();
    assert_eq!(season.map(|r| r.value()), Some(5.0));

    // show: (5.0 + 2.0) / 2
    let show = aggregator.show_rating(ShowId(1), &mut warnings).unwrap();
    assert_eq!(show.unwrap().to_string(), "3.5");

    // pooled: (5 + 5 + 2) / 3
    let pooled = aggregator
        .clone()
        .with_strategy(RollupStrategy::Pooled)
        .show_rating(ShowId(1), &mut warnings)
        .unwrap();
    assert_eq!(pooled.unwrap().to_string(), "4.0");
    assert!(warnings.is_empty());
}

#[test]
fn test_actor_summary_round_trips_are_fixed() {
    let store = Arc::new(CountingStore::new(create_test_index()));
    let analytics = ActorAnalytics::new(store.clone());
    let mut warnings = Warnings::new();

    // Actor 2: two movies in one genre, one episode in another
    let summary = analytics.analyze_actor(ActorId(2), &mut warnings).unwrap();
    assert_eq!(summary.stats.total_projects(), 3);
    assert_eq!(store.calls(), 5);

    // Actor 6 has a single movie; still five round trips
    analytics.analyze_actor(ActorId(6), &mut warnings).unwrap();
    assert_eq!(store.calls(), 10);
}

#[test]
fn test_season_and_show_round_trips_are_fixed() {
    let store = Arc::new(CountingStore::new(create_test_index()));
    let aggregator = RatingAggregator::new(store.clone());
    let mut warnings = Warnings::new();

    aggregator.season_rating(SeasonId(1), &mut warnings).unwrap();
    assert_eq!(store.calls(), 2);

    aggregator.show_rating(ShowId(1), &mut warnings).unwrap();
    assert_eq!(store.calls(), 5);
}

#[test]
fn test_collaboration_example_and_symmetry() {
    let store: Arc<dyn ContentStore> = Arc::new(create_test_index());
    let population: Vec<ActorId> = (1..=6).map(ActorId).collect();
    let table = CollaborationAnalyzer::new(store)
        .analyze(&population, &mut Warnings::new())
        .unwrap();

    // M1 {1,2,3} and M2 {2,3}, plus episode 1 {1,2}
    assert_eq!(table.collaboration(ActorId(2), ActorId(3)), 2);
    assert_eq!(table.collaboration(ActorId(1), ActorId(3)), 1);
    assert_eq!(table.collaboration(ActorId(1), ActorId(2)), 2);
    let pair = table.pair(ActorId(2), ActorId(1)).unwrap();
    assert_eq!((pair.shared_movies, pair.shared_episodes), (1, 1));

    for a in &population {
        assert_eq!(table.collaboration(*a, *a), 0);
        for b in &population {
            assert_eq!(table.collaboration(*a, *b), table.collaboration(*b, *a));
        }
    }
    assert!(table.pairs.iter().all(|p| p.actor_a < p.actor_b));
}

#[test]
fn test_top_collaborators_break_ties_by_id() {
    let store: Arc<dyn ContentStore> = Arc::new(create_test_index());
    let population: Vec<ActorId> = (1..=6).map(ActorId).collect();
    let table = CollaborationAnalyzer::new(store)
        .with_top_k(1)
        .analyze(&population, &mut Warnings::new())
        .unwrap();

    // Actor 4 worked once each with 5 and 6
    let top = table.top_collaborators(ActorId(4));
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].actor_id, ActorId(5));

    // Actor 2: 1 twice, 3 twice -> 1 first
    assert_eq!(table.top_collaborators(ActorId(2))[0].actor_id, ActorId(1));
}

#[test]
fn test_collaboration_round_trips() {
    let store = Arc::new(CountingStore::new(create_test_index()));
    let population: Vec<ActorId> = (1..=6).map(ActorId).collect();

    CollaborationAnalyzer::new(store.clone())
        .analyze(&population, &mut Warnings::new())
        .unwrap();

    // Two listings per actor plus two bulk credit fetches
    assert_eq!(store.calls(), 2 * population.len() + 2);
}

#[test]
fn test_summaries_are_deterministic() {
    let store: Arc<dyn ContentStore> = Arc::new(create_test_index());
    let analytics = ActorAnalytics::new(store);

    for id in 1..=6 {
        let first = analytics
            .analyze_actor(ActorId(id), &mut Warnings::new())
            .unwrap();
        let second = analytics
            .analyze_actor(ActorId(id), &mut Warnings::new())
            .unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn test_summary_json_shape() {
    let store: Arc<dyn ContentStore> = Arc::new(create_test_index());
    let summary = ActorAnalytics::new(store)
        .analyze_actor(ActorId(1), &mut Warnings::new())
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["actor_id"], 1);
    assert_eq!(json["total_movies"], 1);
    assert_eq!(json["total_episodes"], 1);
    assert_eq!(json["avg_movie_rating"], 4.0);
    assert!(json["genre_breakdown"]["DRAMA"].is_object());
    assert!(json["yearly_breakdown"]["2006"].is_object());
}
