use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Attempts a source must exceed before it can be suppressed
pub const SKIP_MIN_ATTEMPTS: u32 = 5;

/// Success rate below which a source is suppressed
pub const SKIP_MAX_SUCCESS_RATE: f64 = 0.2;

/// How long a suppressed source stays suppressed after its last attempt
pub fn skip_cooldown() -> Duration {
    Duration::hours(1)
}

/// Reliability statistics for one external source
///
/// One record exists per source name. It is created on first use, updated
/// after every attempt and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePerformanceStat {
    pub attempts: u32,
    pub successes: u32,

    /// Running latency average in seconds
    pub avg_latency_secs: f64,

    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
}

impl SourcePerformanceStat {
    /// Creates an empty stat for a source that has never been attempted
    pub fn new() -> Self {
        Self {
            attempts: 0,
            successes: 0,
            avg_latency_secs: 0.0,
            last_attempt: None,
            last_success: None,
        }
    }

    /// Records the outcome of one attempt
    ///
    /// The first latency sample sets the average; later samples are folded in
    /// as `(avg + sample) / 2`, which weights recent attempts heavily.
    pub fn record_attempt(&mut self, success: bool, latency_secs: f64, now: DateTime<Utc>) {
        if self.attempts == 0 {
            self.avg_latency_secs = latency_secs;
        } else {
            self.avg_latency_secs = (self.avg_latency_secs + latency_secs) / 2.0;
        }

        self.attempts += 1;
        if success {
            self.successes += 1;
            self.last_success = Some(now);
        }
        self.last_attempt = Some(now);
    }

    /// Observed success rate, or None if never attempted
    pub fn success_rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(f64::from(self.successes) / f64::from(self.attempts))
        }
    }

    /// Checks whether the source should be left out of a search at `now`
    ///
    /// A source is suppressed only when it has more than five attempts, a
    /// success rate under 20% and an attempt within the last hour.
    pub fn should_skip(&self, now: DateTime<Utc>) -> bool {
        if self.attempts <= SKIP_MIN_ATTEMPTS {
            return false;
        }

        let rate = self.success_rate().unwrap_or(1.0);
        if rate >= SKIP_MAX_SUCCESS_RATE {
            return false;
        }

        match self.last_attempt {
            Some(last) => now - last < skip_cooldown(),
            None => false,
        }
    }

    /// Time left until a suppressed source becomes eligible again
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.should_skip(now) {
            return None;
        }
        self.last_attempt
            .map(|last| skip_cooldown() - (now - last))
    }
}

impl Default for SourcePerformanceStat {
    fn default() -> Self {
        Self::new()
    }
}
