//! Core domain types for the catalog.
//!
//! This module defines the records held by the content store:
//! - Identifier newtypes, one per entity, so an actor id can never be
//!   passed where a director id is expected
//! - People (actors and directors), movies, TV shows, seasons, episodes
//! - Individual rating rows for movies and episodes
//! - The fixed genre vocabulary shared by movies and shows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse().map($name)
            }
        }
    };
}

define_id!(
    /// Identifier of an actor. Actors and directors never share identity.
    ActorId
);
define_id!(
    /// Identifier of a director.
    DirectorId
);
define_id!(MovieId);
define_id!(ShowId);
define_id!(SeasonId);
define_id!(EpisodeId);
define_id!(
    /// Identifier of a single rating row (movie or episode rating).
    RatingId
);

/// Raw rating value as stored.
///
/// Valid values are 1..=5. The store is expected to enforce that on write,
/// but readers treat anything else as a data-integrity problem rather than
/// trusting it.
pub type RatingValue = i32;

/// Inclusive bounds for a valid rating value.
pub const MIN_RATING: RatingValue = 1;
pub const MAX_RATING: RatingValue = 5;

// =============================================================================
// People
// =============================================================================

/// Name fields shared by actors and directors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    #[serde(flatten)]
    pub person: Person,
}

impl Actor {
    pub fn full_name(&self) -> String {
        self.person.full_name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
    pub id: DirectorId,
    #[serde(flatten)]
    pub person: Person,
}

impl Director {
    pub fn full_name(&self) -> String {
        self.person.full_name()
    }
}

// =============================================================================
// Genres
// =============================================================================

/// Genre vocabulary shared by movies and TV shows.
///
/// Stored as upper-case codes (`SCI_FI`), displayed with a human label
/// (`Sci-Fi`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Family,
    Fantasy,
    History,
    Horror,
    Kids,
    Mystery,
    News,
    Reality,
    Romance,
    SciFi,
    Soap,
    Talk,
    Thriller,
    War,
    Western,
}

impl Genre {
    pub const ALL: [Genre; 22] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Family,
        Genre::Fantasy,
        Genre::History,
        Genre::Horror,
        Genre::Kids,
        Genre::Mystery,
        Genre::News,
        Genre::Reality,
        Genre::Romance,
        Genre::SciFi,
        Genre::Soap,
        Genre::Talk,
        Genre::Thriller,
        Genre::War,
        Genre::Western,
    ];

    /// Storage code, e.g. `SCI_FI`
    pub fn code(self) -> &'static str {
        match self {
            Genre::Action => "ACTION",
            Genre::Adventure => "ADVENTURE",
            Genre::Animation => "ANIMATION",
            Genre::Comedy => "COMEDY",
            Genre::Crime => "CRIME",
            Genre::Documentary => "DOCUMENTARY",
            Genre::Drama => "DRAMA",
            Genre::Family => "FAMILY",
            Genre::Fantasy => "FANTASY",
            Genre::History => "HISTORY",
            Genre::Horror => "HORROR",
            Genre::Kids => "KIDS",
            Genre::Mystery => "MYSTERY",
            Genre::News => "NEWS",
            Genre::Reality => "REALITY",
            Genre::Romance => "ROMANCE",
            Genre::SciFi => "SCI_FI",
            Genre::Soap => "SOAP",
            Genre::Talk => "TALK",
            Genre::Thriller => "THRILLER",
            Genre::War => "WAR",
            Genre::Western => "WESTERN",
        }
    }

    /// Human-readable label, e.g. `Sci-Fi`
    pub fn label(self) -> &'static str {
        match self {
            Genre::SciFi => "Sci-Fi",
            Genre::Talk => "Talk Show",
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Family => "Family",
            Genre::Fantasy => "Fantasy",
            Genre::History => "History",
            Genre::Horror => "Horror",
            Genre::Kids => "Kids",
            Genre::Mystery => "Mystery",
            Genre::News => "News",
            Genre::Reality => "Reality",
            Genre::Romance => "Romance",
            Genre::Soap => "Soap",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Movies
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub genre: Genre,
    pub release_date: NaiveDate,
    pub duration_minutes: u32,
    /// Opaque reference to the poster image; storage is someone else's job.
    pub poster: String,
}

/// One rating row for a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRating {
    pub id: RatingId,
    pub movie_id: MovieId,
    pub rating: RatingValue,
}

// =============================================================================
// TV shows, seasons and episodes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TvShow {
    pub id: ShowId,
    pub title: String,
    pub genre: Genre,
    pub start_date: NaiveDate,
    /// `None` while the show is still running
    pub end_date: Option<NaiveDate>,
    pub poster: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub show_id: ShowId,
    /// Unique per show
    pub number: u16,
    pub title: String,
    pub air_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub season_id: SeasonId,
    pub title: String,
    /// Unique per season
    pub episode_number: u16,
    pub air_date: NaiveDate,
    pub description: String,
    pub duration_minutes: u32,
}

/// One rating row for an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRating {
    pub id: RatingId,
    pub episode_id: EpisodeId,
    pub rating: RatingValue,
}

// =============================================================================
// Read-side projections
// =============================================================================

/// Records reached through a person's credit links.
///
/// `unresolved` holds linked ids that have no record in the store, in id
/// order. Readers skip them but should report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T, Id> {
    pub records: Vec<T>,
    pub unresolved: Vec<Id>,
}

pub type MovieListing = Listing<Movie, MovieId>;
pub type EpisodeListing = Listing<EpisodeCredit, EpisodeId>;

impl<T, Id> Listing<T, Id> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An episode joined with the show it belongs to.
///
/// `show` is `None` when the season or show row the episode points at is
/// missing from the store (a dangling foreign key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCredit {
    pub episode: Episode,
    pub show: Option<ShowRef>,
}

/// The parts of a show an episode needs for genre bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRef {
    pub show_id: ShowId,
    pub genre: Genre,
}

/// Cast and crew of one movie or episode, both sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    pub actors: Vec<ActorId>,
    pub directors: Vec<DirectorId>,
}

/// Points at one rateable item in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ContentRef {
    Movie(MovieId),
    Episode(EpisodeId),
    Season(SeasonId),
    Show(ShowId),
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRef::Movie(id) => write!(f, "movie {}", id),
            ContentRef::Episode(id) => write!(f, "episode {}", id),
            ContentRef::Season(id) => write!(f, "season {}", id),
            ContentRef::Show(id) => write!(f, "show {}", id),
        }
    }
}

// =============================================================================
// CatalogIndex - The In-Memory Content Store
// =============================================================================

/// Holds one snapshot of the catalog plus the join indices readers need.
///
/// Every link (cast, crew, containment, rating) is indexed in both
/// directions at insert time, so lookups from either side are O(1) and no
/// separate build step is required. Link lists are kept sorted and free of
/// duplicates.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    // Primary records
    pub(crate) actors: HashMap<ActorId, Actor>,
    pub(crate) directors: HashMap<DirectorId, Director>,
    pub(crate) movies: HashMap<MovieId, Movie>,
    pub(crate) shows: HashMap<ShowId, TvShow>,
    pub(crate) seasons: HashMap<SeasonId, Season>,
    pub(crate) episodes: HashMap<EpisodeId, Episode>,

    // Ratings grouped by the item they rate
    pub(crate) movie_ratings: HashMap<MovieId, Vec<MovieRating>>,
    pub(crate) episode_ratings: HashMap<EpisodeId, Vec<EpisodeRating>>,

    // Content -> people
    pub(crate) movie_cast: HashMap<MovieId, Vec<ActorId>>,
    pub(crate) movie_crew: HashMap<MovieId, Vec<DirectorId>>,
    pub(crate) episode_cast: HashMap<EpisodeId, Vec<ActorId>>,
    pub(crate) episode_crew: HashMap<EpisodeId, Vec<DirectorId>>,

    // People -> content
    pub(crate) actor_movies: HashMap<ActorId, Vec<MovieId>>,
    pub(crate) actor_episodes: HashMap<ActorId, Vec<EpisodeId>>,
    pub(crate) director_movies: HashMap<DirectorId, Vec<MovieId>>,
    pub(crate) director_episodes: HashMap<DirectorId, Vec<EpisodeId>>,

    // Containment
    pub(crate) show_seasons: HashMap<ShowId, Vec<SeasonId>>,
    pub(crate) season_episodes: HashMap<SeasonId, Vec<EpisodeId>>,
}

impl CatalogIndex {
    /// Creates a new, empty CatalogIndex
    pub fn new() -> Self {
        Self::default()
    }

    // Getters

    pub fn get_actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn get_director(&self, id: DirectorId) -> Option<&Director> {
        self.directors.get(&id)
    }

    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    pub fn get_show(&self, id: ShowId) -> Option<&TvShow> {
        self.shows.get(&id)
    }

    pub fn get_season(&self, id: SeasonId) -> Option<&Season> {
        self.seasons.get(&id)
    }

    pub fn get_episode(&self, id: EpisodeId) -> Option<&Episode> {
        self.episodes.get(&id)
    }

    /// All rating rows for a movie; empty slice if it has none
    pub fn get_movie_ratings(&self, id: MovieId) -> &[MovieRating] {
        self.movie_ratings
            .get(&id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All rating rows for an episode; empty slice if it has none
    pub fn get_episode_ratings(&self, id: EpisodeId) -> &[EpisodeRating] {
        self.episode_ratings
            .get(&id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_actor_movies(&self, id: ActorId) -> &[MovieId] {
        slice_of(&self.actor_movies, &id)
    }

    pub fn get_actor_episodes(&self, id: ActorId) -> &[EpisodeId] {
        slice_of(&self.actor_episodes, &id)
    }

    pub fn get_director_movies(&self, id: DirectorId) -> &[MovieId] {
        slice_of(&self.director_movies, &id)
    }

    pub fn get_director_episodes(&self, id: DirectorId) -> &[EpisodeId] {
        slice_of(&self.director_episodes, &id)
    }

    pub fn get_movie_cast(&self, id: MovieId) -> &[ActorId] {
        slice_of(&self.movie_cast, &id)
    }

    pub fn get_movie_crew(&self, id: MovieId) -> &[DirectorId] {
        slice_of(&self.movie_crew, &id)
    }

    pub fn get_episode_cast(&self, id: EpisodeId) -> &[ActorId] {
        slice_of(&self.episode_cast, &id)
    }

    pub fn get_episode_crew(&self, id: EpisodeId) -> &[DirectorId] {
        slice_of(&self.episode_crew, &id)
    }

    /// Seasons of a show, in season-number order
    pub fn get_show_seasons(&self, id: ShowId) -> Vec<SeasonId> {
        let mut seasons = slice_of(&self.show_seasons, &id).to_vec();
        seasons.sort_by_key(|season_id| {
            (self.seasons.get(season_id).map(|s| s.number), *season_id)
        });
        seasons
    }

    /// Episodes of a season, in episode-number order
    pub fn get_season_episodes(&self, id: SeasonId) -> Vec<EpisodeId> {
        let mut episodes = slice_of(&self.season_episodes, &id).to_vec();
        episodes.sort_by_key(|episode_id| {
            (
                self.episodes.get(episode_id).map(|e| e.episode_number),
                *episode_id,
            )
        });
        episodes
    }

    /// Resolve the show an episode belongs to through its season.
    pub fn show_of_episode(&self, id: EpisodeId) -> Option<&TvShow> {
        let episode = self.episodes.get(&id)?;
        let season = self.seasons.get(&episode.season_id)?;
        self.shows.get(&season.show_id)
    }

    // Mutators - used during loading and by tests

    pub fn insert_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    pub fn insert_director(&mut self, director: Director) {
        self.directors.insert(director.id, director);
    }

    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
    }

    pub fn insert_show(&mut self, show: TvShow) {
        self.shows.insert(show.id, show);
    }

    /// Insert a season and link it under its show
    pub fn insert_season(&mut self, season: Season) {
        insert_sorted(self.show_seasons.entry(season.show_id).or_default(), season.id);
        self.seasons.insert(season.id, season);
    }

    /// Insert an episode and link it under its season
    pub fn insert_episode(&mut self, episode: Episode) {
        insert_sorted(
            self.season_episodes.entry(episode.season_id).or_default(),
            episode.id,
        );
        self.episodes.insert(episode.id, episode);
    }

    pub fn insert_movie_rating(&mut self, rating: MovieRating) {
        self.movie_ratings
            .entry(rating.movie_id)
            .or_default()
            .push(rating);
    }

    pub fn insert_episode_rating(&mut self, rating: EpisodeRating) {
        self.episode_ratings
            .entry(rating.episode_id)
            .or_default()
            .push(rating);
    }

    /// Record that an actor appears in a movie (both directions)
    pub fn link_movie_actor(&mut self, movie_id: MovieId, actor_id: ActorId) {
        insert_sorted(self.movie_cast.entry(movie_id).or_default(), actor_id);
        insert_sorted(self.actor_movies.entry(actor_id).or_default(), movie_id);
    }

    pub fn link_movie_director(&mut self, movie_id: MovieId, director_id: DirectorId) {
        insert_sorted(self.movie_crew.entry(movie_id).or_default(), director_id);
        insert_sorted(self.director_movies.entry(director_id).or_default(), movie_id);
    }

    pub fn link_episode_actor(&mut self, episode_id: EpisodeId, actor_id: ActorId) {
        insert_sorted(self.episode_cast.entry(episode_id).or_default(), actor_id);
        insert_sorted(self.actor_episodes.entry(actor_id).or_default(), episode_id);
    }

    pub fn link_episode_director(&mut self, episode_id: EpisodeId, director_id: DirectorId) {
        insert_sorted(self.episode_crew.entry(episode_id).or_default(), director_id);
        insert_sorted(
            self.director_episodes.entry(director_id).or_default(),
            episode_id,
        );
    }

    /// Get counts for debugging/validation
    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            actors: self.actors.len(),
            directors: self.directors.len(),
            movies: self.movies.len(),
            shows: self.shows.len(),
            seasons: self.seasons.len(),
            episodes: self.episodes.len(),
            movie_ratings: self.movie_ratings.values().map(|v| v.len()).sum(),
            episode_ratings: self.episode_ratings.values().map(|v| v.len()).sum(),
        }
    }
}

/// Record counts of a loaded catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub actors: usize,
    pub directors: usize,
    pub movies: usize,
    pub shows: usize,
    pub seasons: usize,
    pub episodes: usize,
    pub movie_ratings: usize,
    pub episode_ratings: usize,
}

fn slice_of<'a, K: std::hash::Hash + Eq, V>(map: &'a HashMap<K, Vec<V>>, key: &K) -> &'a [V] {
    map.get(key).map(|v| v.as_slice()).unwrap_or(&[])
}

fn insert_sorted<T: Ord>(list: &mut Vec<T>, value: T) {
    if let Err(pos) = list.binary_search(&value) {
        list.insert(pos, value);
    }
}
