//! Settings for one analytics run.

/// Knobs for [`crate::ReportOrchestrator`].
///
/// Built with `AnalyticsConfig::default()` plus `with_*` overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Worker threads for the per-actor stage
    pub workers: usize,
    /// Collaborators kept per actor
    pub top_k: usize,
    /// Entries per leaderboard
    pub leaderboard_size: usize,
    /// Analyze only the first N actors by id
    pub limit: Option<usize>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            top_k: 5,
            leaderboard_size: 10,
            limit: None,
        }
    }
}

impl AnalyticsConfig {
    /// Configure the worker pool size (default: 5, minimum 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Configure collaborators kept per actor (default: 5)
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Configure leaderboard length (default: 10)
    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = AnalyticsConfig::default()
            .with_workers(0)
            .with_top_k(3)
            .with_limit(Some(500));

        assert_eq!(config.workers, 1);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.leaderboard_size, 10);
        assert_eq!(config.limit, Some(500));
    }
}
