mod report;

use analytics::{
    ActorAnalytics, CollaborationAnalyzer, RatingAggregator, RollupStrategy, Warnings,
};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{
    ActorId, CatalogIndex, ContentStore, DirectorId, EpisodeId, MovieId, SeasonId, ShowId,
};
use orchestrator::{AnalyticsConfig, ReportOrchestrator, RunError};
use report::{fmt_rating, render, write_actor_block, write_report, ReportFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// catalog-report - rating and collaboration analytics for a movie/TV catalog
#[derive(Parser)]
#[command(name = "catalog-report")]
#[command(about = "Actor rating and collaboration analytics over a catalog snapshot", long_about = None)]
struct Cli {
    /// Path to the catalog snapshot directory
    #[arg(short, long, default_value = "data/catalog")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analytics report over every actor
    Report {
        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,

        /// Worker threads for per-actor analysis
        #[arg(long, default_value = "5")]
        workers: usize,

        /// Collaborators kept per actor
        #[arg(long, default_value = "5")]
        top_k: usize,

        /// Entries per leaderboard
        #[arg(long, default_value = "10")]
        leaderboard: usize,

        /// Analyze only the first N actors by id
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one actor's summary
    Actor {
        #[arg(long)]
        actor_id: ActorId,
    },

    /// Show one director's summary
    Director {
        #[arg(long)]
        director_id: DirectorId,
    },

    /// Show the strongest collaborations among actors
    Collaborations {
        /// Collaborators listed per actor
        #[arg(long, default_value = "5")]
        top_k: usize,

        /// Restrict to the first N actors by id
        #[arg(long, default_value = "500")]
        limit: usize,
    },

    /// Show the rating of one movie, episode, season or show
    Rating {
        #[command(flatten)]
        target: RatingTarget,

        /// How seasons and shows combine their children
        #[arg(long, value_enum, default_value = "mean-of-means")]
        rollup: RollupArg,
    },

    /// Audit the catalog for out-of-range ratings and dangling references
    Check,

    /// Time actor summaries to test performance
    Benchmark {
        /// Number of actors to summarize
        #[arg(long, default_value = "100")]
        runs: usize,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct RatingTarget {
    #[arg(long)]
    movie: Option<MovieId>,
    #[arg(long)]
    episode: Option<EpisodeId>,
    #[arg(long)]
    season: Option<SeasonId>,
    #[arg(long)]
    show: Option<ShowId>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RollupArg {
    MeanOfMeans,
    Pooled,
}

impl From<RollupArg> for RollupStrategy {
    fn from(arg: RollupArg) -> Self {
        match arg {
            RollupArg::MeanOfMeans => RollupStrategy::MeanOfMeans,
            RollupArg::Pooled => RollupStrategy::Pooled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load the snapshot off the async runtime
    println!("Loading catalog from {}...", cli.data_dir.display());
    let start = Instant::now();
    let data_dir = cli.data_dir.clone();
    let index = tokio::task::spawn_blocking(move || CatalogIndex::load_from_files(&data_dir))
        .await
        .context("Loader task panicked")?
        .context("Failed to load catalog")?;
    let index = Arc::new(index);
    println!("{} Loaded catalog in {:?}", "✓".green(), start.elapsed());

    match cli.command {
        Commands::Report {
            output,
            format,
            workers,
            top_k,
            leaderboard,
            limit,
        } => {
            let config = AnalyticsConfig::default()
                .with_workers(workers)
                .with_top_k(top_k)
                .with_leaderboard_size(leaderboard)
                .with_limit(limit);
            handle_report(index, config, format, output).await?
        }
        Commands::Actor { actor_id } => handle_actor(index, actor_id)?,
        Commands::Director { director_id } => handle_director(index, director_id)?,
        Commands::Collaborations { top_k, limit } => {
            handle_collaborations(index, top_k, limit).await?
        }
        Commands::Rating { target, rollup } => handle_rating(index, target, rollup.into())?,
        Commands::Check => handle_check(&index),
        Commands::Benchmark { runs } => handle_benchmark(index, runs).await?,
    }

    Ok(())
}

/// Handle the 'report' command
async fn handle_report(
    store: Arc<dyn ContentStore>,
    config: AnalyticsConfig,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let orchestrator = ReportOrchestrator::new(store).with_config(config);
    let outcome = tokio::task::spawn_blocking(move || orchestrator.run())
        .await
        .context("Report task panicked")?;

    let (report, failure) = match outcome {
        Ok(report) => (report, None),
        Err(RunError::StoreUnavailable { source, partial }) => (*partial, Some(source)),
        Err(other) => return Err(other.into()),
    };

    let content = render(&report, format)?;
    write_report(&content, output.as_deref()).await?;
    if let Some(path) = &output {
        println!("{} Report written to {}", "✓".green(), path.display());
    }

    if !report.warnings.is_empty() {
        println!(
            "{} {} data-integrity warnings",
            "!".yellow(),
            report.warnings.len()
        );
    }

    match failure {
        Some(source) => Err(anyhow!(source).context("Report is PARTIAL")),
        None => Ok(()),
    }
}

/// Handle the 'actor' command
fn handle_actor(store: Arc<dyn ContentStore>, actor_id: ActorId) -> Result<()> {
    let mut warnings = Warnings::new();
    let summary = ActorAnalytics::new(store)
        .analyze_actor(actor_id, &mut warnings)
        .with_context(|| format!("Failed to analyze actor {}", actor_id))?;

    let mut out = String::new();
    write_actor_block(&mut out, &summary);
    print!("{}", out);

    let stats = &summary.stats;
    println!("{}", "Genres:".bold().blue());
    for (genre, breakdown) in &stats.genre_breakdown {
        println!(
            "{}{}: {} movies, {} episodes, avg {}",
            "• ".green(),
            genre,
            breakdown.movies,
            breakdown.episodes,
            fmt_rating(breakdown.avg_rating)
        );
    }
    println!("{}", "Years:".bold().blue());
    for (year, breakdown) in &stats.yearly_breakdown {
        println!(
            "{}{}: {} projects",
            "• ".cyan(),
            year,
            breakdown.total_projects()
        );
    }
    println!("{}", "Rating distribution:".bold().blue());
    for (stars, count) in stats.rating_distribution.iter().enumerate() {
        println!("  {} stars: {}", stars + 1, count);
    }

    print_warnings(&warnings);
    Ok(())
}

/// Handle the 'director' command
fn handle_director(store: Arc<dyn ContentStore>, director_id: DirectorId) -> Result<()> {
    let mut warnings = Warnings::new();
    let summary = ActorAnalytics::new(store)
        .analyze_director(director_id, &mut warnings)
        .with_context(|| format!("Failed to analyze director {}", director_id))?;
    let stats = &summary.stats;

    println!("{}", format!("Director: {} (#{})", summary.name, director_id).bold().blue());
    println!("{}Movies: {}", "• ".green(), stats.total_movies);
    println!("{}Episodes: {}", "• ".green(), stats.total_episodes);
    println!("{}Average Movie Rating: {}", "• ".cyan(), fmt_rating(stats.avg_movie_rating));
    println!("{}Average TV Rating: {}", "• ".cyan(), fmt_rating(stats.avg_episode_rating));
    println!("{}Career Span: {} years", "• ".cyan(), stats.career_span_years);

    print_warnings(&warnings);
    Ok(())
}

/// Handle the 'collaborations' command
async fn handle_collaborations(
    store: Arc<dyn ContentStore>,
    top_k: usize,
    limit: usize,
) -> Result<()> {
    let names: std::collections::HashMap<ActorId, String> = store
        .actors()?
        .into_iter()
        .take(limit)
        .map(|a| (a.id, a.full_name()))
        .collect();
    let mut population: Vec<ActorId> = names.keys().copied().collect();
    population.sort();

    let analyzer = CollaborationAnalyzer::new(store).with_top_k(top_k);
    let (table, warnings) = tokio::task::spawn_blocking(move || {
        let mut warnings = Warnings::new();
        analyzer
            .analyze(&population, &mut warnings)
            .map(|table| (table, warnings))
    })
    .await
    .context("Collaboration task panicked")??;

    let name = |id: &ActorId| names.get(id).cloned().unwrap_or_else(|| id.to_string());

    println!("{}", "Top collaborators:".bold().blue());
    for (actor, collaborators) in &table.top_collaborators {
        if collaborators.is_empty() {
            continue;
        }
        let list = collaborators
            .iter()
            .map(|c| format!("{} ({})", name(&c.actor_id), c.count))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}{}: {}", "• ".green(), name(actor), list);
    }

    println!("{}", "Actor-director pairs:".bold().blue());
    let mut directors = table.directors.clone();
    directors.sort_by(|a, b| b.count.cmp(&a.count).then(a.actor_id.cmp(&b.actor_id)));
    for pair in directors.iter().take(20) {
        println!(
            "{}{} with director {}: {}",
            "• ".cyan(),
            name(&pair.actor_id),
            pair.director_id,
            pair.count
        );
    }

    print_warnings(&warnings);
    Ok(())
}

/// Handle the 'rating' command
fn handle_rating(
    store: Arc<dyn ContentStore>,
    target: RatingTarget,
    rollup: RollupStrategy,
) -> Result<()> {
    let aggregator = RatingAggregator::new(store).with_strategy(rollup);
    let mut warnings = Warnings::new();

    let (label, rating) = if let Some(id) = target.movie {
        (format!("movie {}", id), aggregator.movie_rating(id, &mut warnings)?)
    } else if let Some(id) = target.episode {
        (format!("episode {}", id), aggregator.episode_rating(id, &mut warnings)?)
    } else if let Some(id) = target.season {
        (format!("season {}", id), aggregator.season_rating(id, &mut warnings)?)
    } else if let Some(id) = target.show {
        (format!("show {}", id), aggregator.show_rating(id, &mut warnings)?)
    } else {
        return Err(anyhow!("No rating target given"));
    };

    match rating {
        Some(rating) => println!("{}: {}", label.bold(), rating.to_string().green()),
        None => println!("{}: {}", label.bold(), "no rating".yellow()),
    }
    print_warnings(&warnings);
    Ok(())
}

/// Handle the 'check' command
fn handle_check(index: &CatalogIndex) {
    let issues = index.audit();
    if issues.is_empty() {
        println!("{} No integrity issues found", "✓".green());
        return;
    }
    println!("{}", format!("{} integrity issues:", issues.len()).bold().yellow());
    for issue in &issues {
        println!("  {}", issue);
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(store: Arc<dyn ContentStore>, runs: usize) -> Result<()> {
    let actors = store.actors()?;
    if actors.is_empty() {
        return Err(anyhow!("Catalog has no actors to benchmark"));
    }

    // Random actor ids drawn from the catalog
    let actor_ids: Vec<ActorId> = (0..runs)
        .map(|_| actors[rand::random_range(0..actors.len())].id)
        .collect();
    info!("Benchmarking {} actor summaries", actor_ids.len());

    let analytics = ActorAnalytics::new(store);
    let wall = Instant::now();
    let mut handles = Vec::with_capacity(actor_ids.len());
    for id in actor_ids {
        let analytics = analytics.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let mut warnings = Warnings::new();
            analytics.analyze_actor(id, &mut warnings)?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings = Vec::with_capacity(handles.len());
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall = wall.elapsed();
    if timings.is_empty() {
        warn!("No runs requested");
        return Ok(());
    }

    timings.sort();
    let total: Duration = timings.iter().sum();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {:?}", wall);
    println!("Average latency: {:?}", total / timings.len() as u32);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} summaries/second",
        timings.len() as f64 / wall.as_secs_f64()
    );
    Ok(())
}

fn print_warnings(warnings: &Warnings) {
    if warnings.is_empty() {
        return;
    }
    println!("{}", format!("{} warnings:", warnings.len()).yellow());
    for warning in warnings.iter() {
        println!("  {}", warning);
    }
}
