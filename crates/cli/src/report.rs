//! Report writer: renders an [`AnalyticsReport`] as text or JSON and writes
//! it to stdout or a file.

use std::fmt::Write as _;
use std::path::Path;

use analytics::{ActorSummary, AverageRating, Warnings};
use data_loader::ActorId;
use anyhow::{Context, Result};
use clap::ValueEnum;
use orchestrator::{AnalyticsReport, LeaderboardEntry, RunStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// "4.3", or "n/a" when undefined
pub fn fmt_rating(rating: Option<AverageRating>) -> String {
    rating.map_or_else(|| "n/a".to_string(), |r| r.to_string())
}

pub fn render(report: &AnalyticsReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report")
        }
    }
}

/// Write to `output`, or print when no path is given
pub async fn write_report(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

pub fn render_text(report: &AnalyticsReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(80);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "ACTOR PERFORMANCE ANALYTICS REPORT");
    let _ = writeln!(out, "{}", rule);
    if let RunStatus::Partial { reason } = &report.status {
        let _ = writeln!(out, "*** PARTIAL REPORT: {} ***", reason);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Generated at: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        "Total actors analyzed: {} of {}",
        report.summaries.len(),
        report.actors_requested
    );
    let _ = writeln!(out);

    for summary in &report.summaries {
        write_actor_block(&mut out, summary);
    }

    let boards = &report.leaderboards;
    let _ = writeln!(out, "SUMMARY:");
    let _ = writeln!(out, "Total Movie Credits: {}", boards.total_movie_credits);
    let _ = writeln!(out, "Total Episode Credits: {}", boards.total_episode_credits);
    write_board(&mut out, "TOP MOVIE ACTORS BY RATING", &boards.top_movie_actors, "movies");
    write_board(&mut out, "TOP TV ACTORS BY RATING", &boards.top_tv_actors, "episodes");

    if !report.genre_overview.is_empty() {
        let _ = writeln!(out, "\nGENRE OVERVIEW:");
        for (genre, overview) in &report.genre_overview {
            let _ = writeln!(
                out,
                "  {:<12} {:>5} actors  {:>6} movie credits  {:>6} episode credits",
                genre.label(),
                overview.actors,
                overview.movie_credits,
                overview.episode_credits
            );
        }
    }

    if let Some(table) = &report.collaborations {
        let mut strongest = table.pairs.clone();
        strongest.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then((a.actor_a, a.actor_b).cmp(&(b.actor_a, b.actor_b)))
        });
        let _ = writeln!(out, "\nSTRONGEST COLLABORATIONS:");
        for pair in strongest.iter().take(10) {
            let _ = writeln!(
                out,
                "  {} & {}: {} shared ({} movies, {} episodes)",
                actor_name(report, pair.actor_a),
                actor_name(report, pair.actor_b),
                pair.total,
                pair.shared_movies,
                pair.shared_episodes
            );
        }
    }

    write_warnings(&mut out, &report.warnings);
    out
}

fn actor_name(report: &AnalyticsReport, id: ActorId) -> String {
    report
        .summary(id)
        .map_or_else(|| format!("actor {}", id), |s| s.name.clone())
}

pub fn write_actor_block(out: &mut String, summary: &ActorSummary) {
    let stats = &summary.stats;
    let _ = writeln!(out, "Actor: {} (#{})", summary.name, summary.actor_id);
    let _ = writeln!(out, "  Total Movies: {}", stats.total_movies);
    let _ = writeln!(out, "  Total TV Episodes: {}", stats.total_episodes);
    let _ = writeln!(out, "  Total TV Shows: {}", stats.total_tv_shows);
    let _ = writeln!(out, "  Average Movie Rating: {}", fmt_rating(stats.avg_movie_rating));
    let _ = writeln!(out, "  Average TV Rating: {}", fmt_rating(stats.avg_episode_rating));
    let _ = writeln!(out, "  Overall Rating: {}", fmt_rating(stats.overall_avg_rating));
    if let Some(p) = stats.rating_percentiles {
        let _ = writeln!(
            out,
            "  Rating Percentiles: p25 {} / p50 {} / p75 {} / p90 {}",
            p.p25, p.p50, p.p75, p.p90
        );
    }
    let _ = writeln!(out, "  Career Span: {} years", stats.career_span_years);
    let _ = writeln!(out, "  Genre Diversity: {} genres", stats.genre_diversity);
    if let Some(genre) = stats.primary_genre() {
        let _ = writeln!(out, "  Primary Genre: {}", genre);
    }
    let _ = writeln!(out, "{}", "-".repeat(40));
}

fn write_board(out: &mut String, title: &str, entries: &[LeaderboardEntry], unit: &str) {
    let _ = writeln!(out, "\n{}:", title);
    if entries.is_empty() {
        let _ = writeln!(out, "  (none rated)");
    }
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:2}. {}: {} ({} {})",
            i + 1,
            entry.name,
            entry.avg_rating,
            entry.projects,
            unit
        );
    }
}

fn write_warnings(out: &mut String, warnings: &Warnings) {
    if warnings.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nWARNINGS ({}):", warnings.len());
    for warning in warnings.iter() {
        let _ = writeln!(out, "  {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use data_loader::{Actor, CatalogIndex, Genre, Movie, MovieId, MovieRating, Person, RatingId};
    use orchestrator::ReportOrchestrator;
    use std::sync::Arc;

    fn build_report() -> AnalyticsReport {
        let mut index = CatalogIndex::new();
        for id in 1..=2 {
            index.insert_actor(Actor {
                id: ActorId(id),
                person: Person::new("Lee", format!("Park{}", id)),
            });
        }
        index.insert_movie(Movie {
            id: MovieId(1),
            title: "Night Train".to_string(),
            genre: Genre::Thriller,
            release_date: NaiveDate::from_ymd_opt(2011, 3, 4).unwrap(),
            duration_minutes: 101,
            poster: String::new(),
        });
        index.link_movie_actor(MovieId(1), ActorId(1));
        index.link_movie_actor(MovieId(1), ActorId(2));
        index.insert_movie_rating(MovieRating {
            id: RatingId(1),
            movie_id: MovieId(1),
            rating: 4,
        });
        ReportOrchestrator::new(Arc::new(index)).run().unwrap()
    }

    #[test]
    fn test_text_report_layout() {
        let text = render_text(&build_report());

        assert!(text.contains("ACTOR PERFORMANCE ANALYTICS REPORT"));
        assert!(text.contains("Actor: Lee Park1 (#1)"));
        assert!(text.contains("Average Movie Rating: 4.0"));
        assert!(text.contains("Average TV Rating: n/a"));
        assert!(text.contains("Rating Percentiles: p25 4 / p50 4 / p75 4 / p90 4"));
        assert!(text.contains(" 1. Lee Park1: 4.0 (1 movies)"));
        assert!(text.contains("Lee Park1 & Lee Park2: 1 shared"));
        assert!(!text.contains("PARTIAL"));
    }

    #[test]
    fn test_collaborator_names_resolve_by_id() {
        let mut report = build_report();
        // Only actor 2 keeps a summary, actor 1 falls back to its id
        report.summaries.remove(0);

        let text = render_text(&report);
        assert!(text.contains("actor 1 & Lee Park2: 1 shared"));
    }

    #[test]
    fn test_partial_marker() {
        let mut report = build_report();
        report.status = RunStatus::Partial {
            reason: "content store unavailable: timeout".to_string(),
        };

        let text = render_text(&report);
        assert!(text.contains("*** PARTIAL REPORT: content store unavailable: timeout ***"));

        let json = render(&report, ReportFormat::Json).unwrap();
        assert!(json.contains("\"partial\""));
    }
}
