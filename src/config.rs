//! Configuration for the retry and loop-prevention engine.
//!
//! Configuration is read once, at controller construction. Lookup order:
//!
//! 1. `clickguard.toml` in the project directory
//! 2. `clickguard/config.toml` in the user config directory
//! 3. built-in defaults
//!
//! The first file found wins; files are not merged. Every field is optional.
//!
//! ```toml
//! attempts_before_alternative = 2
//! identical_window = 3
//! alternating_period_max = 3
//! history_capacity = 20
//! max_executor_exceptions = 3
//! keyboard_sequence = ["tab", "enter"]
//! confirm_key = "enter"
//! search_radius = 50
//!
//! [[coordinate_offsets]]
//! dx = 8
//! dy = 0
//! ```

pub mod validation;

pub use validation::{ConfigValidator, ValidationReport};

use crate::error::{GuardError, Result};
use crate::interaction::{Offset, Strategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-level config file name.
pub const CONFIG_FILE_NAME: &str = "clickguard.toml";

/// Distance of the default coordinate offsets.
pub const DEFAULT_OFFSET_DISTANCE: i32 = 8;

/// Field names accepted in a config file.
pub const KNOWN_FIELDS: &[&str] = &[
    "attempts_before_alternative",
    "identical_window",
    "alternating_period_max",
    "history_capacity",
    "coordinate_offsets",
    "max_executor_exceptions",
    "keyboard_sequence",
    "confirm_key",
    "search_radius",
];

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Failures at a location before alternative strategies are tried (default: 2).
    #[serde(default = "default_attempts_before_alternative")]
    pub attempts_before_alternative: u32,

    /// Trailing identical actions that count as a loop (default: 3).
    #[serde(default = "default_identical_window")]
    pub identical_window: usize,

    /// Largest period checked for alternating loops (default: 3).
    #[serde(default = "default_alternating_period_max")]
    pub alternating_period_max: usize,

    /// Actions kept in the history window (default: 20).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Offsets tried by the alternative-coordinate strategy, in order
    /// (default: ±8 in four directions).
    #[serde(default = "default_coordinate_offsets")]
    pub coordinate_offsets: Vec<Offset>,

    /// Consecutive driver errors that make a request fatal (default: 3).
    #[serde(default = "default_max_executor_exceptions")]
    pub max_executor_exceptions: u32,

    /// Keys sent by keyboard navigation after moving to the target.
    #[serde(default = "default_keyboard_sequence")]
    pub keyboard_sequence: Vec<String>,

    /// Key that confirms text-select entry.
    #[serde(default = "default_confirm_key")]
    pub confirm_key: String,

    /// Pixel radius for the nearest-element search (default: 50).
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,
}

fn default_attempts_before_alternative() -> u32 {
    crate::interaction::tracker::DEFAULT_ATTEMPTS_BEFORE_ALTERNATIVE
}

fn default_identical_window() -> usize {
    crate::history::detector::DEFAULT_IDENTICAL_WINDOW
}

fn default_alternating_period_max() -> usize {
    crate::history::detector::DEFAULT_ALTERNATING_PERIOD_MAX
}

fn default_history_capacity() -> usize {
    crate::history::DEFAULT_HISTORY_CAPACITY
}

fn default_coordinate_offsets() -> Vec<Offset> {
    Offset::cardinal(DEFAULT_OFFSET_DISTANCE)
}

fn default_max_executor_exceptions() -> u32 {
    3
}

fn default_keyboard_sequence() -> Vec<String> {
    vec!["tab".to_string(), "enter".to_string()]
}

fn default_confirm_key() -> String {
    "enter".to_string()
}

fn default_search_radius() -> u32 {
    50
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            attempts_before_alternative: default_attempts_before_alternative(),
            identical_window: default_identical_window(),
            alternating_period_max: default_alternating_period_max(),
            history_capacity: default_history_capacity(),
            coordinate_offsets: default_coordinate_offsets(),
            max_executor_exceptions: default_max_executor_exceptions(),
            keyboard_sequence: default_keyboard_sequence(),
            confirm_key: default_confirm_key(),
            search_radius: default_search_radius(),
        }
    }
}

impl GuardConfig {
    /// Load configuration for a project, falling back to the user config
    /// and then to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load(project_dir: &Path) -> Result<Self> {
        Self::load_with_user_path(project_dir, Self::user_path().as_deref())
    }

    /// Like [`GuardConfig::load`] with an explicit user config path.
    pub fn load_with_user_path(project_dir: &Path, user_path: Option<&Path>) -> Result<Self> {
        match Self::locate(project_dir, user_path) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a single config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GuardError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            GuardError::config_with_path(format!("{}: {}", path.display(), e), path.to_path_buf())
        })
    }

    /// The file [`GuardConfig::load`] would read, if any.
    #[must_use]
    pub fn locate(project_dir: &Path, user_path: Option<&Path>) -> Option<PathBuf> {
        let project = Self::project_path(project_dir);
        if project.exists() {
            return Some(project);
        }
        user_path.filter(|p| p.exists()).map(Path::to_path_buf)
    }

    /// Project-level config path.
    pub fn project_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE_NAME)
    }

    /// User-level config path, when the platform has a config directory.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("clickguard").join("config.toml"))
    }

    /// Upper bound on attempts for a single request.
    ///
    /// Direct can be retried up to the failure threshold and every other
    /// strategy needs one failure to be excluded, so this is never reached
    /// by a well-behaved session.
    #[must_use]
    pub fn attempt_budget(&self) -> u32 {
        self.attempts_before_alternative + Strategy::COUNT as u32
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GuardError::config(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `attempts_before_alternative` or `max_executor_exceptions` is zero
    /// - `identical_window` is below 2
    /// - `history_capacity` cannot hold the detection windows
    /// - an offset is zero
    /// - the keyboard sequence or confirm key is empty
    /// - `search_radius` is zero
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.attempts_before_alternative == 0 {
            return Err("attempts_before_alternative must be at least 1".to_string());
        }
        if self.max_executor_exceptions == 0 {
            return Err("max_executor_exceptions must be at least 1".to_string());
        }
        if self.identical_window < 2 {
            return Err(format!(
                "identical_window must be at least 2, got {}",
                self.identical_window
            ));
        }

        let needed = self.identical_window.max(2 * self.alternating_period_max);
        if self.history_capacity < needed {
            return Err(format!(
                "history_capacity {} is too small for the detection windows (need {})",
                self.history_capacity, needed
            ));
        }

        if let Some(offset) = self.coordinate_offsets.iter().find(|o| o.is_zero()) {
            return Err(format!(
                "coordinate offset {} would repeat a direct click",
                offset
            ));
        }

        if self.keyboard_sequence.is_empty() {
            return Err("keyboard_sequence must not be empty".to_string());
        }
        if let Some(key) = self.keyboard_sequence.iter().find(|k| k.trim().is_empty()) {
            return Err(format!("keyboard_sequence contains a blank key: {:?}", key));
        }
        if self.confirm_key.trim().is_empty() {
            return Err("confirm_key must not be empty".to_string());
        }
        if self.search_radius == 0 {
            return Err("search_radius must be positive".to_string());
        }

        Ok(())
    }

    /// Non-fatal observations about this configuration.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.alternating_period_max < 2 {
            warnings.push(format!(
                "alternating_period_max {} disables alternating loop detection",
                self.alternating_period_max
            ));
        }
        if self.coordinate_offsets.is_empty() {
            warnings.push(
                "coordinate_offsets is empty - the alt_coordinate strategy will always fail"
                    .to_string(),
            );
        }
        let mut seen = Vec::new();
        for offset in &self.coordinate_offsets {
            if seen.contains(offset) {
                warnings.push(format!("duplicate coordinate offset {}", offset));
            } else {
                seen.push(*offset);
            }
        }
        if self.attempts_before_alternative as usize >= self.identical_window {
            warnings.push(format!(
                "attempts_before_alternative {} reaches identical_window {} - repeated direct clicks will be reported as a loop before rotating",
                self.attempts_before_alternative, self.identical_window
            ));
        }
        if self.attempts_before_alternative > 5 {
            warnings.push(format!(
                "attempts_before_alternative {} retries direct clicks many times before rotating",
                self.attempts_before_alternative
            ));
        }

        warnings
    }
}
