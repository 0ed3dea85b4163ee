//! External collaborator interfaces.
//!
//! The core never talks to a real desktop. Everything physical goes through
//! [`UiDriver`] and every observation through [`StateProbe`]; both return
//! `anyhow::Result` so any backend error can be absorbed as a driver failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use clickguard::driver::{ClickOptions, UiDriver};
//! use clickguard::Location;
//!
//! fn double_click(driver: &mut impl UiDriver, at: Location) -> anyhow::Result<()> {
//!     driver.click(at, ClickOptions::default().with_count(2))
//! }
//! ```

use crate::interaction::Location;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Mouse button used for a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Parse a button name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "middle" => Some(Self::Middle),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum clicks per click primitive (triple click).
pub const MAX_CLICK_COUNT: u8 = 3;

/// How to click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickOptions {
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default = "default_count")]
    pub count: u8,
}

fn default_count() -> u8 {
    1
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            button: MouseButton::Left,
            count: default_count(),
        }
    }
}

impl ClickOptions {
    #[must_use]
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Set the click count, clamped to `1..=3`.
    #[must_use]
    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count.clamp(1, MAX_CLICK_COUNT);
        self
    }
}

/// An interactive element reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    /// Driver-specific handle.
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub control_type: String,
    /// Bounding box center.
    pub center: Location,
}

impl ElementRef {
    pub fn new(id: impl Into<String>, center: Location) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            control_type: String::new(),
            center,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_control_type(mut self, control_type: impl Into<String>) -> Self {
        self.control_type = control_type.into();
        self
    }
}

/// Opaque UI state summary, only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateSignature(String);

impl StateSignature {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Hash descriptive parts (focused control, window title, bounds...)
    /// into a compact signature.
    pub fn digest<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_ref().as_bytes());
            // Separator so ["ab", "c"] and ["a", "bc"] differ.
            hasher.update([0u8]);
        }
        Self(hex::encode(hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StateSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical UI automation backend.
///
/// Calls may block; timeouts are the implementation's responsibility.
pub trait UiDriver: Send {
    /// Click at a screen location.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot deliver the click.
    fn click(&mut self, at: Location, options: ClickOptions) -> Result<()>;

    /// Move the pointer without clicking.
    fn move_to(&mut self, at: Location) -> Result<()>;

    /// Send a key sequence (e.g. `["tab", "enter"]`) to the focused window.
    fn send_keys(&mut self, keys: &[String]) -> Result<()>;

    /// Find the interactive element nearest to `around`, within `radius`
    /// pixels.
    fn locate_nearest_interactive(
        &mut self,
        around: Location,
        radius: u32,
    ) -> Result<Option<ElementRef>>;

    /// Focus an element and activate it.
    fn focus_and_activate(&mut self, element: &ElementRef) -> Result<()>;

    /// Type text into the focused control.
    fn type_text(&mut self, text: &str) -> Result<()>;
}

/// Observes the UI to decide whether an attempt had an effect.
pub trait StateProbe: Send {
    /// Capture the current state signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the UI cannot be inspected.
    fn state_signature(&mut self) -> Result<StateSignature>;
}

impl<T: UiDriver + ?Sized> UiDriver for Box<T> {
    fn click(&mut self, at: Location, options: ClickOptions) -> Result<()> {
        (**self).click(at, options)
    }

    fn move_to(&mut self, at: Location) -> Result<()> {
        (**self).move_to(at)
    }

    fn send_keys(&mut self, keys: &[String]) -> Result<()> {
        (**self).send_keys(keys)
    }

    fn locate_nearest_interactive(
        &mut self,
        around: Location,
        radius: u32,
    ) -> Result<Option<ElementRef>> {
        (**self).locate_nearest_interactive(around, radius)
    }

    fn focus_and_activate(&mut self, element: &ElementRef) -> Result<()> {
        (**self).focus_and_activate(element)
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        (**self).type_text(text)
    }
}

impl<T: StateProbe + ?Sized> StateProbe for Box<T> {
    fn state_signature(&mut self) -> Result<StateSignature> {
        (**self).state_signature()
    }
}
