//! Loop detection over the action window.
//!
//! Two patterns mean the automation is not making progress:
//!
//! ```text
//! identical:    ... A A A          (trailing K actions structurally equal)
//! alternating:  ... A B A B        (trailing 2P actions repeat with period P)
//! ```
//!
//! Detection is side-effect-free and purely advisory; the controller decides
//! what to do with a verdict.

use super::{Action, ActionHistory};
use serde::{Deserialize, Serialize};

/// Default run length that counts as an identical loop.
pub const DEFAULT_IDENTICAL_WINDOW: usize = 3;

/// Default largest period checked for alternating loops.
pub const DEFAULT_ALTERNATING_PERIOD_MAX: usize = 3;

/// Alternatives offered to the caller when a loop is detected.
pub const LOOP_SUGGESTIONS: &[&str] = &[
    "Try a different click location nearby",
    "Use keyboard navigation (Tab, Enter, Arrow keys)",
    "Search for alternative UI elements",
    "Use text-based input methods",
    "Wait for UI to stabilize before retrying",
    "Consider if the task approach needs to be changed",
];

/// Result of a loop check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoopVerdict {
    /// No loop.
    None,
    /// The trailing `count` actions are identical.
    Identical { count: usize },
    /// The trailing actions cycle with this period.
    Alternating { period: usize },
}

impl LoopVerdict {
    /// Whether this verdict reports a loop.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for LoopVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "no loop"),
            Self::Identical { count } => write!(f, "same action repeated {} times", count),
            Self::Alternating { period } => {
                write!(f, "actions alternating with period {}", period)
            }
        }
    }
}

/// Flags identical-repeat and alternating-cycle patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopDetector {
    identical_window: usize,
    alternating_period_max: usize,
}

impl LoopDetector {
    /// Create a detector.
    ///
    /// `identical_window` is clamped to at least 2. An
    /// `alternating_period_max` below 2 disables alternating detection.
    #[must_use]
    pub fn new(identical_window: usize, alternating_period_max: usize) -> Self {
        Self {
            identical_window: identical_window.max(2),
            alternating_period_max,
        }
    }

    #[must_use]
    pub fn identical_window(&self) -> usize {
        self.identical_window
    }

    #[must_use]
    pub fn alternating_period_max(&self) -> usize {
        self.alternating_period_max
    }

    /// Check a window of actions, oldest first.
    #[must_use]
    pub fn detect(&self, window: &[&Action]) -> LoopVerdict {
        if let Some(count) = self.identical_run(window) {
            return LoopVerdict::Identical { count };
        }
        if let Some(period) = self.alternating_period(window) {
            return LoopVerdict::Alternating { period };
        }
        LoopVerdict::None
    }

    /// Check the current history.
    #[must_use]
    pub fn detect_history(&self, history: &ActionHistory) -> LoopVerdict {
        self.detect(&history.window())
    }

    /// Check the history as if `candidate` were appended next.
    #[must_use]
    pub fn detect_with(&self, history: &ActionHistory, candidate: &Action) -> LoopVerdict {
        self.detect(&history.preview(candidate))
    }

    fn identical_run(&self, window: &[&Action]) -> Option<usize> {
        let last = window.last()?;
        let run = window.iter().rev().take_while(|a| **a == *last).count();
        (run >= self.identical_window).then_some(run)
    }

    fn alternating_period(&self, window: &[&Action]) -> Option<usize> {
        (2..=self.alternating_period_max).find(|&period| {
            if window.len() < 2 * period {
                return false;
            }
            let tail = &window[window.len() - 2 * period..];
            let block = &tail[..period];
            // A constant block is an identical run, not a cycle.
            let constant = block.iter().all(|a| *a == block[0]);
            !constant && (0..period).all(|i| tail[i] == tail[i + period])
        })
    }
}

impl Default for LoopDetector {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTICAL_WINDOW, DEFAULT_ALTERNATING_PERIOD_MAX)
    }
}
