use crate::sources::SourceDescriptor;
use crate::state::SourcePerformanceStat;
use crate::storage::PerformanceStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Weight of the declared prior in a source's ranking score
const PRIOR_WEIGHT: f64 = 0.7;

/// Weight of the observed success rate in a source's ranking score
const OBSERVED_WEIGHT: f64 = 0.3;

/// Tracks per-source reliability and uses it to rank and suppress sources
///
/// Statistics are advisory: a failure to persist them is logged and never
/// fails the search that produced them.
pub struct SourcePerformanceTracker {
    stats: Mutex<HashMap<String, SourcePerformanceStat>>,
    store: Option<Arc<dyn PerformanceStore>>,
}

impl SourcePerformanceTracker {
    /// Creates a tracker that keeps statistics in memory only
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(HashMap::new()),
            store: None,
        }
    }

    /// Creates a tracker backed by a store, preloading what it holds
    pub fn with_store(store: Arc<dyn PerformanceStore>) -> Self {
        let stats = match store.load_all_stats() {
            Ok(all) => all.into_iter().collect(),
            Err(e) => {
                tracing::warn!("Failed to load source performance: {}", e);
                HashMap::new()
            }
        };

        Self {
            stats: Mutex::new(stats),
            store: Some(store),
        }
    }

    fn stats(&self) -> MutexGuard<'_, HashMap<String, SourcePerformanceStat>> {
        // A panic while holding the lock leaves the map consistent; keep using it
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records one attempt against a source
    pub fn record(&self, source: &str, success: bool, latency: Duration) {
        self.record_at(source, success, latency, Utc::now());
    }

    pub fn record_at(&self, source: &str, success: bool, latency: Duration, now: DateTime<Utc>) {
        let updated = {
            let mut stats = self.stats();
            let stat = stats.entry(source.to_string()).or_default();
            stat.record_attempt(success, latency.as_secs_f64(), now);
            stat.clone()
        };

        tracing::debug!(
            "Source {} attempt recorded: success={} latency={:.2}s ({}/{})",
            source,
            success,
            latency.as_secs_f64(),
            updated.successes,
            updated.attempts
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.save_stat(source, &updated) {
                tracing::warn!("Failed to persist performance for {}: {}", source, e);
            }
        }
    }

    /// Current statistics for a source, if it has ever been attempted
    pub fn stat(&self, source: &str) -> Option<SourcePerformanceStat> {
        self.stats().get(source).cloned()
    }

    /// All statistics, ordered by source name
    pub fn snapshot(&self) -> Vec<(String, SourcePerformanceStat)> {
        let mut all: Vec<_> = self
            .stats()
            .iter()
            .map(|(name, stat)| (name.clone(), stat.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn should_skip(&self, source: &str) -> bool {
        self.should_skip_at(source, Utc::now())
    }

    /// Evaluates suppression at a given instant
    pub fn should_skip_at(&self, source: &str, now: DateTime<Utc>) -> bool {
        self.stats()
            .get(source)
            .map(|stat| stat.should_skip(now))
            .unwrap_or(false)
    }

    /// Ranking score: `0.7 * prior + 0.3 * observed rate`, or the prior alone
    /// for a source that has never been attempted
    pub fn score(&self, source: &SourceDescriptor) -> f64 {
        let observed = self
            .stats()
            .get(&source.name)
            .and_then(SourcePerformanceStat::success_rate);

        match observed {
            Some(rate) => PRIOR_WEIGHT * source.reliability_prior + OBSERVED_WEIGHT * rate,
            None => source.reliability_prior,
        }
    }

    /// Orders sources by descending score; ties keep their input order
    pub fn rank<'a>(&self, candidates: &[&'a SourceDescriptor]) -> Vec<&'a SourceDescriptor> {
        let mut scored: Vec<(f64, &'a SourceDescriptor)> =
            candidates.iter().map(|s| (self.score(s), *s)).collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, s)| s).collect()
    }
}

impl Default for SourcePerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}
