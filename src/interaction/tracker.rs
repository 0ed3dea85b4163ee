//! Per-location interaction bookkeeping.
//!
//! The tracker remembers, for every location touched in a session, how many
//! attempts were made, how many failed since the last success, and which
//! strategies have been excluded. Records are created lazily and live for
//! the whole session.
//!
//! ```text
//! record_outcome(loc, strategy, Failure) ──> attempts+1, failures+1, exclude(strategy)
//! record_outcome(loc, strategy, Success) ──> attempts+1, failures=0, exclusions cleared
//! record_cancelled(loc)                  ──> attempts+1 only
//! ```

use super::{AttemptOutcome, FailureReason, Location, Offset, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Default number of failures at a location before alternatives are tried.
pub const DEFAULT_ATTEMPTS_BEFORE_ALTERNATIVE: u32 = 2;

/// The last thing that happened at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LastOutcome {
    Success {
        strategy: Strategy,
    },
    Failure {
        strategy: Strategy,
        reason: FailureReason,
    },
    Cancelled,
}

/// Interaction state for one location.
///
/// Invariant: `attempts >= failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Attempts made at this location during the session.
    pub attempts: u32,
    /// Failures since the last success.
    pub failures: u32,
    /// Strategies that failed here since the last success.
    pub excluded: BTreeSet<Strategy>,
    /// Most recent outcome.
    pub last_outcome: Option<LastOutcome>,
    /// Attempts abandoned because the caller cancelled.
    pub cancellations: u32,
    /// Coordinate offsets already clicked here.
    pub tried_offsets: Vec<Offset>,
}

impl InteractionRecord {
    /// Whether `strategy` may still be offered here.
    #[must_use]
    pub fn is_available(&self, strategy: Strategy) -> bool {
        !self.excluded.contains(&strategy)
    }

    /// Strategies not yet excluded, in priority order.
    #[must_use]
    pub fn available(&self) -> Vec<Strategy> {
        Strategy::ALL
            .into_iter()
            .filter(|s| self.is_available(*s))
            .collect()
    }
}

/// Attempt counters for one strategy across the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub attempts: u32,
    pub successes: u32,
}

/// Session-wide statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Failures in a row across every location.
    pub consecutive_failures: u32,
    /// Strategy of the most recent success anywhere.
    pub last_successful_strategy: Option<Strategy>,
    /// Per-strategy counters.
    pub per_strategy: BTreeMap<Strategy, StrategyStats>,
    /// Cancelled attempts.
    pub cancellations: u32,
}

impl SessionStats {
    /// Total attempts recorded.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.per_strategy.values().map(|s| s.attempts).sum()
    }

    /// Total successful attempts recorded.
    #[must_use]
    pub fn total_successes(&self) -> u32 {
        self.per_strategy.values().map(|s| s.successes).sum()
    }

    /// Success rate of a strategy (0.0 when never tried).
    #[must_use]
    pub fn success_rate(&self, strategy: Strategy) -> f64 {
        match self.per_strategy.get(&strategy) {
            Some(stats) if stats.attempts > 0 => stats.successes as f64 / stats.attempts as f64,
            _ => 0.0,
        }
    }

    /// Get a summary for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} attempts, {} successful",
            self.total_attempts(),
            self.total_successes()
        )];
        for (strategy, stats) in &self.per_strategy {
            lines.push(format!(
                "  {}: {}/{} ({:.0}%)",
                strategy,
                stats.successes,
                stats.attempts,
                self.success_rate(*strategy) * 100.0
            ));
        }
        lines.join("\n")
    }
}

/// Tracks interaction attempts and failures per location.
#[derive(Debug, Clone)]
pub struct InteractionTracker {
    records: HashMap<Location, InteractionRecord>,
    attempts_before_alternative: u32,
    stats: SessionStats,
}

impl InteractionTracker {
    /// Create a tracker that diversifies after `attempts_before_alternative`
    /// failures at a location.
    #[must_use]
    pub fn new(attempts_before_alternative: u32) -> Self {
        Self {
            records: HashMap::new(),
            attempts_before_alternative,
            stats: SessionStats::default(),
        }
    }

    /// Failure threshold before alternatives are offered.
    #[must_use]
    pub fn attempts_before_alternative(&self) -> u32 {
        self.attempts_before_alternative
    }

    /// Record the outcome of an attempt.
    pub fn record_outcome(
        &mut self,
        location: Location,
        strategy: Strategy,
        outcome: &AttemptOutcome,
    ) {
        let record = self.records.entry(location).or_default();
        record.attempts += 1;

        let stats = self.stats.per_strategy.entry(strategy).or_default();
        stats.attempts += 1;

        match outcome {
            AttemptOutcome::Success => {
                record.failures = 0;
                record.excluded.clear();
                record.tried_offsets.clear();
                record.last_outcome = Some(LastOutcome::Success { strategy });

                stats.successes += 1;
                self.stats.consecutive_failures = 0;
                self.stats.last_successful_strategy = Some(strategy);
            }
            AttemptOutcome::Failure { reason } => {
                record.failures += 1;
                record.excluded.insert(strategy);
                record.last_outcome = Some(LastOutcome::Failure {
                    strategy,
                    reason: reason.clone(),
                });

                self.stats.consecutive_failures += 1;
            }
        }
    }

    /// Record an attempt abandoned by cancellation.
    ///
    /// Counts as an attempt for bookkeeping but neither raises the failure
    /// count nor excludes any strategy.
    pub fn record_cancelled(&mut self, location: Location) {
        let record = self.records.entry(location).or_default();
        record.attempts += 1;
        record.cancellations += 1;
        record.last_outcome = Some(LastOutcome::Cancelled);
        self.stats.cancellations += 1;
    }

    /// Whether the next attempt at `location` should use an alternative.
    ///
    /// True once the location has failed `attempts_before_alternative` times
    /// since its last success and some strategy is still available.
    #[must_use]
    pub fn should_try_alternative(&self, location: Location) -> bool {
        match self.records.get(&location) {
            Some(record) => {
                record.failures >= self.attempts_before_alternative
                    && record.excluded.len() < Strategy::COUNT
            }
            None => false,
        }
    }

    /// First strategy in priority order that is not excluded here.
    #[must_use]
    pub fn next_strategy(&self, location: Location) -> Option<Strategy> {
        match self.records.get(&location) {
            Some(record) => Strategy::ALL.into_iter().find(|s| record.is_available(*s)),
            None => Some(Strategy::FIRST),
        }
    }

    /// Failures at `location` since its last success.
    #[must_use]
    pub fn failures(&self, location: Location) -> u32 {
        self.records.get(&location).map_or(0, |r| r.failures)
    }

    /// Excluded strategies at `location`, in priority order.
    #[must_use]
    pub fn excluded(&self, location: Location) -> Vec<Strategy> {
        self.records
            .get(&location)
            .map(|r| r.excluded.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The record for a location, if one exists.
    #[must_use]
    pub fn record(&self, location: Location) -> Option<&InteractionRecord> {
        self.records.get(&location)
    }

    /// Offsets already clicked at a location.
    #[must_use]
    pub fn tried_offsets(&self, location: Location) -> &[Offset] {
        self.records
            .get(&location)
            .map(|r| r.tried_offsets.as_slice())
            .unwrap_or(&[])
    }

    /// Remember that an offset was clicked at a location.
    pub fn mark_offset_tried(&mut self, location: Location, offset: Offset) {
        let record = self.records.entry(location).or_default();
        if !record.tried_offsets.contains(&offset) {
            record.tried_offsets.push(offset);
        }
    }

    /// Number of locations with a record.
    #[must_use]
    pub fn location_count(&self) -> usize {
        self.records.len()
    }

    /// Session statistics.
    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

impl Default for InteractionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS_BEFORE_ALTERNATIVE)
    }
}
