//! Interaction targets, strategies and per-location bookkeeping.
//!
//! - [`Location`] / [`Offset`] - integer screen coordinates
//! - [`strategy`] - the closed set of interaction strategies
//! - [`outcome`] - attempt outcomes and failure reasons
//! - [`tracker`] - per-location attempt/failure counters and exclusions
//! - [`selector`] - picks the strategy for the next attempt

pub mod outcome;
pub mod selector;
pub mod strategy;
pub mod tracker;

pub use outcome::{AttemptOutcome, FailureReason};
pub use selector::{Selection, StrategySelector};
pub use strategy::Strategy;
pub use tracker::{
    InteractionRecord, InteractionTracker, LastOutcome, SessionStats, StrategyStats,
};

use serde::{Deserialize, Serialize};

/// A target point on screen.
///
/// Failure state is keyed by exact coordinate, so `(100, 100)` and
/// `(101, 100)` are tracked independently.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    /// Create a new location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Shift this location by an offset.
    #[must_use]
    pub fn offset_by(&self, offset: Offset) -> Self {
        Self {
            x: self.x.saturating_add(offset.dx),
            y: self.y.saturating_add(offset.dy),
        }
    }

    /// Chebyshev distance, matching a square search box around a point.
    #[must_use]
    pub fn distance_to(&self, other: Location) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A coordinate perturbation applied by [`Strategy::AltCoordinate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    /// Create a new offset.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// The four cardinal offsets at `distance`: right, left, down, up.
    #[must_use]
    pub fn cardinal(distance: i32) -> Vec<Offset> {
        vec![
            Offset::new(distance, 0),
            Offset::new(-distance, 0),
            Offset::new(0, distance),
            Offset::new(0, -distance),
        ]
    }

    /// True for the zero offset, which would just repeat a direct click.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:+}, {:+})", self.dx, self.dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new(100, 200).to_string(), "(100, 200)");
    }

    #[test]
    fn test_location_offset_saturates() {
        let loc = Location::new(i32::MAX, 0);
        assert_eq!(loc.offset_by(Offset::new(8, -8)), Location::new(i32::MAX, -8));
    }

    #[test]
    fn test_location_distance_is_chebyshev() {
        let a = Location::new(100, 100);
        assert_eq!(a.distance_to(Location::new(108, 97)), 8);
        assert_eq!(a.distance_to(a), 0);
    }

    #[test]
    fn test_cardinal_offsets_order() {
        let offsets = Offset::cardinal(8);
        assert_eq!(
            offsets,
            vec![
                Offset::new(8, 0),
                Offset::new(-8, 0),
                Offset::new(0, 8),
                Offset::new(0, -8)
            ]
        );
        assert!(offsets.iter().all(|o| !o.is_zero()));
    }

    #[test]
    fn test_offset_display_is_signed() {
        assert_eq!(Offset::new(8, -8).to_string(), "(+8, -8)");
    }
}
