//! # Report Orchestrator
//!
//! Coordinates one analytics run over the catalog:
//! 1. List the actors (optionally the first `limit` by id)
//! 2. Summarize every actor on a bounded worker pool
//! 3. Run the collaboration analysis over the analyzed actors
//! 4. Build leaderboards and the genre overview
//!
//! Per-actor integrity problems become warnings and that actor is skipped.
//! A store failure stops the run: workers that have not started yet are
//! skipped and the caller gets a report marked partial inside the error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;
use tracing::{info, instrument, warn};

use analytics::{
    ActorAnalytics, ActorSummary, AnalyticsError, CollaborationAnalyzer, Warnings, WorkUnit,
};
use data_loader::{ActorId, ContentStore, StoreError};

use crate::config::AnalyticsConfig;
use crate::report::{AnalyticsReport, RunStatus};

/// Errors that end a run
#[derive(Error, Debug)]
pub enum RunError {
    /// The store failed mid-run. `partial` holds what finished before.
    #[error("content store became unavailable: {source}")]
    StoreUnavailable {
        source: StoreError,
        partial: Box<AnalyticsReport>,
    },

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl RunError {
    /// The partial report, if the run got far enough to have one
    pub fn partial_report(&self) -> Option<&AnalyticsReport> {
        match self {
            RunError::StoreUnavailable { partial, .. } => Some(partial),
            RunError::Pool(_) => None,
        }
    }
}

/// Result of summarizing one actor on a worker
enum ActorOutcome {
    Done(ActorSummary, Warnings),
    Skipped(Warnings),
    /// Not attempted because the run was already aborting
    Aborted,
    Failed(StoreError, Warnings),
}

/// Runs the full analytics pipeline against one store
#[derive(Clone)]
pub struct ReportOrchestrator {
    store: Arc<dyn ContentStore>,
    config: AnalyticsConfig,
}

impl ReportOrchestrator {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            config: AnalyticsConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Run every stage and return the finished report
    #[instrument(skip(self), fields(workers = self.config.workers))]
    pub fn run(&self) -> Result<AnalyticsReport, RunError> {
        let start_time = Instant::now();
        let mut warnings = Warnings::new();

        let actors = match self.store.actors() {
            Ok(actors) => actors,
            Err(source) => return Err(self.abort(source, 0, Vec::new(), warnings)),
        };
        let mut actor_ids: Vec<ActorId> = actors.iter().map(|a| a.id).collect();
        if let Some(limit) = self.config.limit {
            actor_ids.truncate(limit);
        }
        let requested = actor_ids.len();
        info!("Analyzing {} actors", requested);

        // Stage 1: per-actor summaries
        let pool = self.build_pool()?;
        let outcomes = self.summarize_all(&pool, &actor_ids);

        let mut summaries = Vec::with_capacity(outcomes.len());
        let mut unit_warnings = Vec::with_capacity(outcomes.len());
        let mut failure = None;
        for outcome in outcomes {
            match outcome {
                ActorOutcome::Done(summary, unit) => {
                    summaries.push(summary);
                    unit_warnings.push(unit);
                }
                ActorOutcome::Skipped(unit) => unit_warnings.push(unit),
                ActorOutcome::Failed(error, unit) => {
                    unit_warnings.push(unit);
                    failure.get_or_insert(error);
                }
                ActorOutcome::Aborted => {}
            }
        }
        // Cast members of one bad movie all see the same bad row
        warnings.absorb_distinct(unit_warnings);
        if let Some(source) = failure {
            return Err(self.abort(source, requested, summaries, warnings));
        }
        info!(
            "Summarized {} of {} actors in {:.2?}",
            summaries.len(),
            requested,
            start_time.elapsed()
        );

        // Stage 2: collaborations, only after every summary is in
        let analyzed: Vec<ActorId> = summaries.iter().map(|s| s.actor_id).collect();
        let analyzer =
            CollaborationAnalyzer::new(self.store.clone()).with_top_k(self.config.top_k);
        let mut collab_warnings = Warnings::new();
        let result = pool.install(|| analyzer.analyze(&analyzed, &mut collab_warnings));
        warnings.absorb_distinct([collab_warnings]);
        let collaborations = match result {
            Ok(table) => table,
            Err(source) => return Err(self.abort(source, requested, summaries, warnings)),
        };

        let report = AnalyticsReport::assemble(
            RunStatus::Complete,
            requested,
            summaries,
            Some(collaborations),
            self.config.leaderboard_size,
            warnings,
        );
        info!(
            "Report complete in {:.2?} ({} warnings)",
            start_time.elapsed(),
            report.warnings.len()
        );
        Ok(report)
    }

    fn build_pool(&self) -> Result<ThreadPool, RunError> {
        Ok(ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("analytics-worker-{}", i))
            .build()?)
    }

    /// Summarize each actor on the pool. Output order matches `actor_ids`.
    fn summarize_all(&self, pool: &ThreadPool, actor_ids: &[ActorId]) -> Vec<ActorOutcome> {
        let analytics = ActorAnalytics::new(self.store.clone());
        let aborted = AtomicBool::new(false);

        pool.install(|| {
            actor_ids
                .par_iter()
                .map(|&id| {
                    if aborted.load(Ordering::Relaxed) {
                        return ActorOutcome::Aborted;
                    }
                    let mut unit_warnings = Warnings::new();
                    match analytics.analyze_actor(id, &mut unit_warnings) {
                        Ok(summary) => ActorOutcome::Done(summary, unit_warnings),
                        Err(AnalyticsError::Integrity(error)) => {
                            unit_warnings.push(WorkUnit::Actor(id), error);
                            ActorOutcome::Skipped(unit_warnings)
                        }
                        Err(AnalyticsError::Store(error)) => {
                            warn!(actor = %id, "store failed, aborting run: {}", error);
                            aborted.store(true, Ordering::Relaxed);
                            ActorOutcome::Failed(error, unit_warnings)
                        }
                    }
                })
                .collect()
        })
    }

    /// Package what finished so far as a partial report inside the error
    fn abort(
        &self,
        source: StoreError,
        requested: usize,
        summaries: Vec<ActorSummary>,
        warnings: Warnings,
    ) -> RunError {
        warn!(
            "Run aborted after {} summaries: {}",
            summaries.len(),
            source
        );
        let partial = AnalyticsReport::assemble(
            RunStatus::Partial {
                reason: source.to_string(),
            },
            requested,
            summaries,
            None,
            self.config.leaderboard_size,
            warnings,
        );
        RunError::StoreUnavailable {
            source,
            partial: Box::new(partial),
        }
    }
}
