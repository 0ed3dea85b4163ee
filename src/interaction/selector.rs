//! Strategy selection.
//!
//! Derives the strategy for the next attempt purely from tracker state:
//! keep retrying the current strategy until the location has failed often
//! enough, then rotate through untried strategies in priority order.

use super::{InteractionTracker, Location, Strategy};
use serde::{Deserialize, Serialize};

/// What the next attempt at a location should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "strategy", rename_all = "snake_case")]
pub enum Selection {
    /// Repeat the current strategy (failure threshold not reached yet).
    Retry(Strategy),
    /// Switch to a strategy that has not failed here.
    Rotate(Strategy),
    /// Nothing left to try.
    Exhausted,
}

impl Selection {
    /// The chosen strategy, if any.
    #[must_use]
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Self::Retry(s) | Self::Rotate(s) => Some(*s),
            Self::Exhausted => None,
        }
    }

    #[must_use]
    pub fn is_rotation(&self) -> bool {
        matches!(self, Self::Rotate(_))
    }
}

/// Picks strategies from [`InteractionTracker`] state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySelector;

impl StrategySelector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Select the strategy for the next attempt at `location`.
    ///
    /// `current` is the strategy used by the previous attempt of the same
    /// request, or `None` when the request is just starting.
    #[must_use]
    pub fn select(
        &self,
        tracker: &InteractionTracker,
        location: Location,
        current: Option<Strategy>,
    ) -> Selection {
        if tracker.should_try_alternative(location) {
            return match tracker.next_strategy(location) {
                Some(next) if Some(next) == current => Selection::Retry(next),
                Some(next) => Selection::Rotate(next),
                None => Selection::Exhausted,
            };
        }

        if tracker.failures(location) >= tracker.attempts_before_alternative() {
            // Threshold reached with every strategy excluded.
            return Selection::Exhausted;
        }

        Selection::Retry(current.unwrap_or(Strategy::FIRST))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{AttemptOutcome, FailureReason};

    const TARGET: Location = Location::new(100, 100);

    fn fail(tracker: &mut InteractionTracker, strategy: Strategy) {
        tracker.record_outcome(
            TARGET,
            strategy,
            &AttemptOutcome::failure(FailureReason::NoStateChange),
        );
    }

    #[test]
    fn test_fresh_location_starts_direct() {
        let tracker = InteractionTracker::new(2);
        assert_eq!(
            StrategySelector::new().select(&tracker, TARGET, None),
            Selection::Retry(Strategy::Direct)
        );
    }

    #[test]
    fn test_retries_direct_below_threshold() {
        let mut tracker = InteractionTracker::new(2);
        fail(&mut tracker, Strategy::Direct);
        assert_eq!(
            StrategySelector::new().select(&tracker, TARGET, Some(Strategy::Direct)),
            Selection::Retry(Strategy::Direct)
        );
    }

    #[test]
    fn test_rotates_at_threshold() {
        let mut tracker = InteractionTracker::new(2);
        fail(&mut tracker, Strategy::Direct);
        fail(&mut tracker, Strategy::Direct);
        let selection = StrategySelector::new().select(&tracker, TARGET, Some(Strategy::Direct));
        assert_eq!(selection, Selection::Rotate(Strategy::KeyboardNav));
        assert!(selection.is_rotation());
    }

    #[test]
    fn test_rotation_follows_priority_order() {
        let mut tracker = InteractionTracker::new(1);
        let selector = StrategySelector::new();
        let mut current = None;
        let mut order = Vec::new();
        while let Some(strategy) = selector.select(&tracker, TARGET, current).strategy() {
            order.push(strategy);
            fail(&mut tracker, strategy);
            current = Some(strategy);
        }
        assert_eq!(order, Strategy::ALL.to_vec());
    }

    #[test]
    fn test_exhausted_when_everything_failed() {
        let mut tracker = InteractionTracker::new(2);
        for strategy in Strategy::ALL {
            fail(&mut tracker, strategy);
        }
        assert_eq!(
            StrategySelector::new().select(&tracker, TARGET, None),
            Selection::Exhausted
        );
    }

    #[test]
    fn test_resumes_rotation_on_new_request() {
        let mut tracker = InteractionTracker::new(2);
        fail(&mut tracker, Strategy::Direct);
        fail(&mut tracker, Strategy::Direct);
        fail(&mut tracker, Strategy::KeyboardNav);
        assert_eq!(
            StrategySelector::new().select(&tracker, TARGET, None),
            Selection::Rotate(Strategy::ElementSearch)
        );
    }

    #[test]
    fn test_never_offers_excluded_strategy_on_rotation() {
        let mut tracker = InteractionTracker::new(1);
        fail(&mut tracker, Strategy::Direct);
        fail(&mut tracker, Strategy::AltCoordinate);
        let selector = StrategySelector::new();
        let mut current = Some(Strategy::AltCoordinate);
        while let Selection::Rotate(next) = selector.select(&tracker, TARGET, current) {
            assert!(!tracker.excluded(TARGET).contains(&next));
            fail(&mut tracker, next);
            current = Some(next);
        }
    }
}
