//! Benchmarks for the analytics engines
//!
//! Run with: cargo bench --package analytics
//!
//! Uses a synthetic catalog so the benchmark needs no data files.

use analytics::{ActorAnalytics, CollaborationAnalyzer, RatingAggregator, Warnings};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{
    Actor, ActorId, CatalogIndex, ContentStore, Episode, EpisodeId, EpisodeRating, Genre, Movie,
    MovieId, MovieRating, Person, RatingId, Season, SeasonId, ShowId, TvShow,
};
use std::sync::Arc;

const ACTORS: u32 = 500;
const MOVIES: u32 = 2_000;
const SHOWS: u32 = 40;
const CAST_SIZE: u32 = 6;

/// Deterministic synthetic catalog: every movie gets a fixed-size cast and a
/// handful of ratings, every show has three seasons of ten episodes.
fn build_catalog() -> Arc<dyn ContentStore> {
    let mut index = CatalogIndex::new();
    let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();

    for id in 1..=ACTORS {
        index.insert_actor(Actor {
            id: ActorId(id),
            person: Person::new("Actor", id.to_string()),
        });
    }

    let mut rating_id = 0;
    for id in 1..=MOVIES {
        let genre = Genre::ALL[(id as usize) % Genre::ALL.len()];
        index.insert_movie(Movie {
            id: MovieId(id),
            title: format!("Movie {}", id),
            genre,
            release_date: base + chrono::Duration::days(i64::from(id) * 5),
            duration_minutes: 90 + id % 60,
            poster: String::new(),
        });
        for slot in 0..CAST_SIZE {
            let actor = (id * 7 + slot * 31) % ACTORS + 1;
            index.link_movie_actor(MovieId(id), ActorId(actor));
        }
        for r in 0..(id % 7) {
            rating_id += 1;
            index.insert_movie_rating(MovieRating {
                id: RatingId(rating_id),
                movie_id: MovieId(id),
                rating: ((id + r) % 5 + 1) as i32,
            });
        }
    }

    let mut episode_id = 0;
    let mut season_id = 0;
    for show in 1..=SHOWS {
        index.insert_show(TvShow {
            id: ShowId(show),
            title: format!("Show {}", show),
            genre: Genre::ALL[(show as usize) % Genre::ALL.len()],
            start_date: base,
            end_date: None,
            poster: String::new(),
        });
        for number in 1..=3u16 {
            season_id += 1;
            index.insert_season(Season {
                id: SeasonId(season_id),
                show_id: ShowId(show),
                number,
                title: String::new(),
                air_date: base,
            });
            for episode_number in 1..=10u16 {
                episode_id += 1;
                index.insert_episode(Episode {
                    id: EpisodeId(episode_id),
                    season_id: SeasonId(season_id),
                    title: String::new(),
                    episode_number,
                    air_date: base + chrono::Duration::days(i64::from(episode_id)),
                    description: String::new(),
                    duration_minutes: 42,
                });
                index.link_episode_actor(EpisodeId(episode_id), ActorId(episode_id % ACTORS + 1));
                rating_id += 1;
                index.insert_episode_rating(EpisodeRating {
                    id: RatingId(rating_id),
                    episode_id: EpisodeId(episode_id),
                    rating: (episode_id % 5 + 1) as i32,
                });
            }
        }
    }

    Arc::new(index)
}

fn bench_actor_summary(c: &mut Criterion) {
    let analytics = ActorAnalytics::new(build_catalog());

    c.bench_function("analyze_actor", |b| {
        b.iter(|| {
            let mut warnings = Warnings::new();
            let summary = analytics
                .analyze_actor(black_box(ActorId(42)), &mut warnings)
                .unwrap();
            black_box(summary)
        })
    });
}

fn bench_show_rating(c: &mut Criterion) {
    let aggregator = RatingAggregator::new(build_catalog());

    c.bench_function("show_rating", |b| {
        b.iter(|| {
            let mut warnings = Warnings::new();
            black_box(aggregator.show_rating(black_box(ShowId(7)), &mut warnings).unwrap())
        })
    });
}

fn bench_collaborations(c: &mut Criterion) {
    let analyzer = CollaborationAnalyzer::new(build_catalog());
    let population: Vec<ActorId> = (1..=ACTORS).map(ActorId).collect();

    c.bench_function("collaboration_table", |b| {
        b.iter(|| {
            let mut warnings = Warnings::new();
            let table = analyzer.analyze(black_box(&population), &mut warnings).unwrap();
            black_box(table)
        })
    });
}

criterion_group!(
    benches,
    bench_actor_summary,
    bench_show_rating,
    bench_collaborations
);
criterion_main!(benches);
