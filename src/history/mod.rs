//! Action history and loop detection.
//!
//! - [`Action`] - one issued automation action
//! - [`ActionHistory`] - bounded FIFO window of recent actions
//! - [`detector`] - identical-repeat and alternating-cycle detection

pub mod detector;

pub use detector::{LoopDetector, LoopVerdict, LOOP_SUGGESTIONS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Default number of actions kept for pattern checks.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Action parameters, ordered by name so equality is canonical.
pub type ActionParams = BTreeMap<String, serde_json::Value>;

/// An automation action as issued to the UI.
///
/// Equality is structural: two actions are equal when their names and
/// parameters match. The timestamp never takes part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub params: ActionParams,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Action {
    /// Create an action with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ActionParams::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create an action with the given parameters.
    pub fn with_params(name: impl Into<String>, params: ActionParams) -> Self {
        Self {
            name: name.into(),
            params,
            timestamp: Utc::now(),
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params
    }
}

impl Eq for Action {}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

/// Bounded, ordered log of recently issued actions.
#[derive(Debug, Clone)]
pub struct ActionHistory {
    actions: VecDeque<Action>,
    capacity: usize,
}

impl ActionHistory {
    /// Create a history holding at most `capacity` actions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            actions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an action, evicting the oldest beyond capacity.
    pub fn append(&mut self, action: Action) {
        self.actions.push_back(action);
        while self.actions.len() > self.capacity {
            self.actions.pop_front();
        }
    }

    /// The current window, oldest first.
    #[must_use]
    pub fn window(&self) -> Vec<&Action> {
        self.actions.iter().collect()
    }

    /// The window as it would look after appending `candidate`.
    #[must_use]
    pub fn preview<'a>(&'a self, candidate: &'a Action) -> Vec<&'a Action> {
        let skip = (self.actions.len() + 1).saturating_sub(self.capacity);
        self.actions
            .iter()
            .skip(skip)
            .chain(std::iter::once(candidate))
            .collect()
    }

    /// Most recent action.
    #[must_use]
    pub fn last(&self) -> Option<&Action> {
        self.actions.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
