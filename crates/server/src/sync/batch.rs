//! Grouped resolution of many URLs.

use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::pipeline::{FetchPipeline, ResolveOutcome, Tier};

/// Per-outcome counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummary {
    /// URLs submitted.
    pub total: usize,
    /// Served from the memory index or the record store.
    pub cached: usize,
    /// Retrieved from the network and stored.
    pub fetched: usize,
    /// Not cacheable.
    pub skipped: usize,
    /// Cacheable but not retrievable.
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ResolveOutcome) {
        self.total += 1;
        match outcome {
            ResolveOutcome::Hit { tier: Tier::Network, .. } => self.fetched += 1,
            ResolveOutcome::Hit { .. } => self.cached += 1,
            ResolveOutcome::Skipped(_) => self.skipped += 1,
            ResolveOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// URLs that now have a handle.
    pub fn resolved(&self) -> usize {
        self.cached + self.fetched
    }
}

/// Resolve `urls` in consecutive groups of `group_size`.
///
/// Resolves within a group run concurrently; the next group starts once the
/// whole group has settled. One URL failing never affects the others.
pub async fn resolve_batch(pipeline: &FetchPipeline, urls: &[String], group_size: usize) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for group in urls.chunks(group_size.max(1)) {
        let outcomes = join_all(group.iter().map(|url| pipeline.resolve_outcome(url))).await;
        for outcome in &outcomes {
            summary.record(outcome);
        }
    }
    summary
}
