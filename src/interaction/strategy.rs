//! The closed set of interaction strategies.

use serde::{Deserialize, Serialize};

/// A way of attempting a UI interaction.
///
/// Declaration order is the global priority order: strategies are offered
/// from first to last, and the derived `Ord` follows the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Click exactly at the target location.
    Direct,
    /// Move focus with a keyboard sequence and activate.
    KeyboardNav,
    /// Find the nearest interactive element and activate it.
    ElementSearch,
    /// Click at a slightly perturbed coordinate.
    AltCoordinate,
    /// Type matching text and confirm.
    TextSelect,
}

impl Strategy {
    /// All strategies in priority order.
    pub const ALL: [Strategy; 5] = [
        Strategy::Direct,
        Strategy::KeyboardNav,
        Strategy::ElementSearch,
        Strategy::AltCoordinate,
        Strategy::TextSelect,
    ];

    /// Number of strategies.
    pub const COUNT: usize = Self::ALL.len();

    /// The strategy every fresh location starts with.
    pub const FIRST: Strategy = Strategy::Direct;

    /// Stable snake_case name, used in actions and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::KeyboardNav => "keyboard_nav",
            Self::ElementSearch => "element_search",
            Self::AltCoordinate => "alt_coordinate",
            Self::TextSelect => "text_select",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Direct => "Click directly at the target coordinates",
            Self::KeyboardNav => "Navigate to the element with the keyboard and activate it",
            Self::ElementSearch => "Activate the nearest interactive element",
            Self::AltCoordinate => "Click at slightly offset coordinates",
            Self::TextSelect => "Type the target text and confirm",
        }
    }

    /// Zero-based position in the priority order.
    #[must_use]
    pub fn priority(&self) -> usize {
        *self as usize
    }

    /// Whether this strategy delivers a pointer click.
    #[must_use]
    pub fn uses_pointer(&self) -> bool {
        matches!(self, Self::Direct | Self::AltCoordinate)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_matches_declaration_order() {
        for (index, strategy) in Strategy::ALL.iter().enumerate() {
            assert_eq!(strategy.priority(), index);
        }
        assert!(Strategy::Direct < Strategy::TextSelect);
    }

    #[test]
    fn test_first_is_direct() {
        assert_eq!(Strategy::FIRST, Strategy::ALL[0]);
    }

    #[test]
    fn test_names_round_trip_through_serde() {
        for strategy in Strategy::ALL {
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{}\"", strategy.name()));
        }
    }

    #[test]
    fn test_descriptions_are_distinct() {
        let descriptions: std::collections::HashSet<_> =
            Strategy::ALL.iter().map(|s| s.description()).collect();
        assert_eq!(descriptions.len(), Strategy::COUNT);
        assert!(Strategy::TextSelect.description().contains("text"));
    }

    #[test]
    fn test_uses_pointer() {
        assert!(Strategy::Direct.uses_pointer());
        assert!(Strategy::AltCoordinate.uses_pointer());
        assert!(!Strategy::KeyboardNav.uses_pointer());
    }
}
