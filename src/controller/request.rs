//! Interaction requests submitted by the caller.

use crate::driver::{ClickOptions, MouseButton};
use crate::history::{Action, ActionParams};
use crate::interaction::{Location, Strategy};
use serde::{Deserialize, Serialize};

/// Default action name for requests.
pub const CLICK_ACTION: &str = "Click";

fn default_action() -> String {
    CLICK_ACTION.to_string()
}

/// A request to interact with a location.
///
/// Recognised parameters:
/// - `button`: `"left"`, `"right"` or `"middle"`
/// - `clicks`: click count, 1 to 3
/// - `text`: text used by the text-select strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRequest {
    pub location: Location,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub params: ActionParams,
}

impl InteractionRequest {
    pub fn new(location: impl Into<Location>, action: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            action: action.into(),
            params: ActionParams::new(),
        }
    }

    /// A plain left click.
    pub fn click(location: impl Into<Location>) -> Self {
        Self::new(location, CLICK_ACTION)
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Attach text for the text-select strategy.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_param("text", text.into())
    }

    #[must_use]
    pub fn with_button(self, button: MouseButton) -> Self {
        self.with_param("button", button.as_str())
    }

    #[must_use]
    pub fn with_clicks(self, clicks: u8) -> Self {
        self.with_param("clicks", clicks)
    }

    /// The `text` parameter, if present and non-empty.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.params
            .get("text")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Click options from the `button` and `clicks` parameters.
    ///
    /// Unrecognised values fall back to a single left click.
    #[must_use]
    pub fn click_options(&self) -> ClickOptions {
        let button = self
            .params
            .get("button")
            .and_then(|v| v.as_str())
            .and_then(MouseButton::parse)
            .unwrap_or_default();
        let count = self
            .params
            .get("clicks")
            .and_then(|v| v.as_u64())
            .map_or(1, |n| n.min(u64::from(u8::MAX)) as u8);
        ClickOptions::default()
            .with_button(button)
            .with_count(count)
    }

    /// The action recorded in history for an attempt with `strategy`.
    ///
    /// Carries the target coordinates and the strategy so that rotating
    /// strategies never looks like an identical repeat.
    #[must_use]
    pub fn action_for(&self, strategy: Strategy) -> Action {
        let mut params = self.params.clone();
        params.insert("x".to_string(), self.location.x.into());
        params.insert("y".to_string(), self.location.y.into());
        params.insert("strategy".to_string(), strategy.name().into());
        Action::with_params(self.action.clone(), params)
    }
}
