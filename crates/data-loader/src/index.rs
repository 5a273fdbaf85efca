//! CatalogIndex loading and integrity checks.
//!
//! Loading parses every snapshot file (in parallel with Rayon), inserts the
//! records (a repeated primary id in any file fails the load), and then runs
//! two checks:
//! - `validate`: structural uniqueness rules the store guarantees. A
//!   violation means the snapshot is unusable and loading fails.
//! - `audit`: per-record problems (dangling links, out-of-range ratings).
//!   These are logged and returned; readers skip the affected records.

use crate::error::{DataIntegrityError, DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Feed `records` to `insert`, failing on the first repeated primary id
fn insert_unique<T>(
    records: Vec<T>,
    what: &str,
    id: impl Fn(&T) -> u32,
    mut insert: impl FnMut(T),
) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        let key = id(&record);
        if !seen.insert(key) {
            return Err(DataLoadError::DuplicateKey {
                what: format!("{} id", what),
                key: key.to_string(),
            });
        }
        insert(record);
    }
    Ok(())
}

impl CatalogIndex {
    /// Load a catalog snapshot from a directory
    ///
    /// Steps:
    /// 1. Parse all snapshot files in parallel
    /// 2. Insert records and links (indices are maintained on insert),
    ///    rejecting repeated primary ids
    /// 3. Validate uniqueness constraints
    /// 4. Audit per-record integrity and log what was found
    #[instrument(skip_all, fields(data_dir = %data_dir.display()))]
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog snapshot from {:?}", data_dir);

        let path = |name: &str| data_dir.join(name);

        // Records and links are independent files, parse both halves at once
        let (records, links) = rayon::join(
            || {
                let ((people, movies), (shows, episodes)) = rayon::join(
                    || {
                        rayon::join(
                            || {
                                rayon::join(
                                    || parser::parse_actors(&path("actors.dat")),
                                    || parser::parse_directors(&path("directors.dat")),
                                )
                            },
                            || {
                                rayon::join(
                                    || parser::parse_movies(&path("movies.dat")),
                                    || parser::parse_movie_ratings(&path("movie_ratings.dat")),
                                )
                            },
                        )
                    },
                    || {
                        rayon::join(
                            || {
                                rayon::join(
                                    || parser::parse_shows(&path("tv_shows.dat")),
                                    || parser::parse_seasons(&path("seasons.dat")),
                                )
                            },
                            || {
                                rayon::join(
                                    || parser::parse_episodes(&path("episodes.dat")),
                                    || {
                                        parser::parse_episode_ratings(&path(
                                            "episode_ratings.dat",
                                        ))
                                    },
                                )
                            },
                        )
                    },
                );
                (people, movies, shows, episodes)
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || parser::parse_links::<MovieId, ActorId>(&path("movie_actors.dat")),
                            || {
                                parser::parse_links::<MovieId, DirectorId>(&path(
                                    "movie_directors.dat",
                                ))
                            },
                        )
                    },
                    || {
                        rayon::join(
                            || {
                                parser::parse_links::<EpisodeId, ActorId>(&path(
                                    "episode_actors.dat",
                                ))
                            },
                            || {
                                parser::parse_links::<EpisodeId, DirectorId>(&path(
                                    "episode_directors.dat",
                                ))
                            },
                        )
                    },
                )
            },
        );

        let ((actors, directors), (movies, movie_ratings), (shows, seasons), (episodes, episode_ratings)) =
            records;
        let ((movie_actors, movie_directors), (episode_actors, episode_directors)) = links;

        let mut index = CatalogIndex::new();

        // Every insert replaces by id, so repeated ids must be caught before
        // they leave stale entries in the link indices
        insert_unique(actors?, "actor", |a| a.id.0, |a| index.insert_actor(a))?;
        insert_unique(directors?, "director", |d| d.id.0, |d| index.insert_director(d))?;
        insert_unique(movies?, "movie", |m| m.id.0, |m| index.insert_movie(m))?;
        insert_unique(shows?, "show", |s| s.id.0, |s| index.insert_show(s))?;
        insert_unique(seasons?, "season", |s| s.id.0, |s| index.insert_season(s))?;
        insert_unique(episodes?, "episode", |e| e.id.0, |e| index.insert_episode(e))?;
        insert_unique(movie_ratings?, "movie rating", |r| r.id.0, |r| {
            index.insert_movie_rating(r)
        })?;
        insert_unique(episode_ratings?, "episode rating", |r| r.id.0, |r| {
            index.insert_episode_rating(r)
        })?;
        for (movie_id, actor_id) in movie_actors? {
            index.link_movie_actor(movie_id, actor_id);
        }
        for (movie_id, director_id) in movie_directors? {
            index.link_movie_director(movie_id, director_id);
        }
        for (episode_id, actor_id) in episode_actors? {
            index.link_episode_actor(episode_id, actor_id);
        }
        for (episode_id, director_id) in episode_directors? {
            index.link_episode_director(episode_id, director_id);
        }

        let counts = index.counts();
        info!(
            "Loaded {} actors, {} directors, {} movies, {} shows, {} episodes, {} ratings",
            counts.actors,
            counts.directors,
            counts.movies,
            counts.shows,
            counts.episodes,
            counts.movie_ratings + counts.episode_ratings
        );

        index.validate()?;

        let issues = index.audit();
        if !issues.is_empty() {
            warn!("Catalog audit found {} integrity issues", issues.len());
            for issue in issues.iter().take(20) {
                warn!("{}", issue);
            }
        }

        info!("CatalogIndex successfully built and validated");
        Ok(index)
    }

    /// Check the uniqueness constraints the store guarantees:
    /// - season numbers are unique per show
    /// - episode numbers are unique per season
    pub fn validate(&self) -> Result<()> {
        let mut season_slots: HashMap<(ShowId, u16), SeasonId> = HashMap::new();
        let mut seasons: Vec<&Season> = self.seasons.values().collect();
        seasons.sort_by_key(|s| s.id);
        for season in seasons {
            if let Some(existing) = season_slots.insert((season.show_id, season.number), season.id)
            {
                return Err(DataLoadError::DuplicateKey {
                    what: "season number".to_string(),
                    key: format!(
                        "show {} season {} (seasons {} and {})",
                        season.show_id, season.number, existing, season.id
                    ),
                });
            }
        }

        let mut episode_slots: HashMap<(SeasonId, u16), EpisodeId> = HashMap::new();
        let mut episodes: Vec<&Episode> = self.episodes.values().collect();
        episodes.sort_by_key(|e| e.id);
        for episode in episodes {
            if let Some(existing) =
                episode_slots.insert((episode.season_id, episode.episode_number), episode.id)
            {
                return Err(DataLoadError::DuplicateKey {
                    what: "episode number".to_string(),
                    key: format!(
                        "season {} episode {} (episodes {} and {})",
                        episode.season_id, episode.episode_number, existing, episode.id
                    ),
                });
            }
        }

        Ok(())
    }

    /// Collect every per-record integrity problem in the snapshot.
    ///
    /// The result is sorted so two audits of the same snapshot are equal.
    pub fn audit(&self) -> Vec<DataIntegrityError> {
        let mut issues = Vec::new();

        for (movie_id, ratings) in &self.movie_ratings {
            if !self.movies.contains_key(movie_id) {
                issues.push(DataIntegrityError::dangling(
                    "movie",
                    movie_id.0,
                    "movie rating",
                ));
            }
            for rating in ratings {
                if !(MIN_RATING..=MAX_RATING).contains(&rating.rating) {
                    issues.push(DataIntegrityError::RatingOutOfRange {
                        content: ContentRef::Movie(*movie_id),
                        value: rating.rating,
                    });
                }
            }
        }

        for (episode_id, ratings) in &self.episode_ratings {
            if !self.episodes.contains_key(episode_id) {
                issues.push(DataIntegrityError::dangling(
                    "episode",
                    episode_id.0,
                    "episode rating",
                ));
            }
            for rating in ratings {
                if !(MIN_RATING..=MAX_RATING).contains(&rating.rating) {
                    issues.push(DataIntegrityError::RatingOutOfRange {
                        content: ContentRef::Episode(*episode_id),
                        value: rating.rating,
                    });
                }
            }
        }

        for season in self.seasons.values() {
            if !self.shows.contains_key(&season.show_id) {
                issues.push(DataIntegrityError::dangling(
                    "show",
                    season.show_id.0,
                    ContentRef::Season(season.id),
                ));
            }
        }

        for episode in self.episodes.values() {
            if !self.seasons.contains_key(&episode.season_id) {
                issues.push(DataIntegrityError::dangling(
                    "season",
                    episode.season_id.0,
                    ContentRef::Episode(episode.id),
                ));
            }
        }

        for (movie_id, cast) in &self.movie_cast {
            self.audit_link(&mut issues, ContentRef::Movie(*movie_id), cast, &[]);
        }
        for (movie_id, crew) in &self.movie_crew {
            self.audit_link(&mut issues, ContentRef::Movie(*movie_id), &[], crew);
        }
        for (episode_id, cast) in &self.episode_cast {
            self.audit_link(&mut issues, ContentRef::Episode(*episode_id), cast, &[]);
        }
        for (episode_id, crew) in &self.episode_crew {
            self.audit_link(&mut issues, ContentRef::Episode(*episode_id), &[], crew);
        }

        issues.sort_by_key(|issue| issue.to_string());
        issues.dedup();
        issues
    }

    fn audit_link(
        &self,
        issues: &mut Vec<DataIntegrityError>,
        content: ContentRef,
        cast: &[ActorId],
        crew: &[DirectorId],
    ) {
        let content_exists = match content {
            ContentRef::Movie(id) => self.movies.contains_key(&id),
            ContentRef::Episode(id) => self.episodes.contains_key(&id),
            ContentRef::Season(id) => self.seasons.contains_key(&id),
            ContentRef::Show(id) => self.shows.contains_key(&id),
        };
        if !content_exists {
            let (entity, id) = match content {
                ContentRef::Movie(id) => ("movie", id.0),
                ContentRef::Episode(id) => ("episode", id.0),
                ContentRef::Season(id) => ("season", id.0),
                ContentRef::Show(id) => ("show", id.0),
            };
            issues.push(DataIntegrityError::dangling(entity, id, "credit link"));
        }
        for actor_id in cast {
            if !self.actors.contains_key(actor_id) {
                issues.push(DataIntegrityError::dangling("actor", actor_id.0, content));
            }
        }
        for director_id in crew {
            if !self.directors.contains_key(director_id) {
                issues.push(DataIntegrityError::dangling(
                    "director",
                    director_id.0,
                    content,
                ));
            }
        }
    }
}
