//! Scriptable desktop double.
//!
//! [`MockDesktop`] implements both [`UiDriver`] and [`StateProbe`] over a
//! shared simulated screen. Each target declares which strategies reach it;
//! a primitive that reaches a target bumps the screen revision, which changes
//! the state signature.
//!
//! | Strategy        | Reaches a target when                                   |
//! |-----------------|---------------------------------------------------------|
//! | Direct          | clicked at its exact location                           |
//! | AltCoordinate   | clicked off-center within the hit tolerance             |
//! | KeyboardNav     | keys sent with the pointer on it                        |
//! | ElementSearch   | found by the nearest-element search and activated       |
//! | TextSelect      | its label (if any) typed with the pointer on it, then confirmed |

use crate::controller::CancelSignal;
use crate::driver::{ClickOptions, ElementRef, StateProbe, StateSignature, UiDriver};
use crate::interaction::{Location, Strategy};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default pixel tolerance for off-center clicks.
pub const DEFAULT_HIT_TOLERANCE: u32 = 10;

/// A simulated UI element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBehavior {
    pub location: Location,
    /// Strategies that produce a visible effect on this target.
    #[serde(default)]
    pub responds_to: Vec<Strategy>,
    /// Text that selects this target; any text when unset.
    #[serde(default)]
    pub label: Option<String>,
}

impl TargetBehavior {
    pub fn new(location: Location, responds_to: impl IntoIterator<Item = Strategy>) -> Self {
        Self {
            location,
            responds_to: responds_to.into_iter().collect(),
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn responds(&self, strategy: Strategy) -> bool {
        self.responds_to.contains(&strategy)
    }

    fn accepts_text(&self, text: &str) -> bool {
        self.label
            .as_deref()
            .is_none_or(|label| label.eq_ignore_ascii_case(text))
    }
}

/// Serializable description of a simulated desktop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopSpec {
    #[serde(default)]
    pub targets: Vec<TargetBehavior>,
    /// Number of driver calls that fail before the driver behaves.
    #[serde(default)]
    pub driver_errors: u32,
    /// Number of state probes that fail before the probe behaves.
    #[serde(default)]
    pub probe_errors: u32,
    /// Pixel tolerance for off-center clicks.
    #[serde(default)]
    pub hit_tolerance: Option<u32>,
}

#[derive(Debug)]
struct DesktopState {
    targets: Vec<TargetBehavior>,
    hit_tolerance: u32,
    revision: u64,
    pointer: Location,
    typed: Option<String>,
    pending_errors: u32,
    pending_probe_errors: u32,
    calls: Vec<String>,
    cancel_after: Option<(usize, CancelSignal)>,
}

/// Simulated desktop implementing [`UiDriver`] and [`StateProbe`].
///
/// Clones share state, so one clone can serve as driver, another as probe,
/// and a third stays with the test for inspection.
///
/// # Example
///
/// ```rust,ignore
/// let desktop = MockDesktop::new()
///     .with_target(TargetBehavior::new(Location::new(100, 100), [Strategy::KeyboardNav]))
///     .with_driver_errors(1);
///
/// let mut controller = Controller::new(desktop.clone(), desktop.clone(), config)?;
/// ```
#[derive(Debug, Clone)]
pub struct MockDesktop {
    state: Arc<Mutex<DesktopState>>,
}

impl Default for MockDesktop {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(DesktopState {
                targets: Vec::new(),
                hit_tolerance: DEFAULT_HIT_TOLERANCE,
                revision: 0,
                pointer: Location::default(),
                typed: None,
                pending_errors: 0,
                pending_probe_errors: 0,
                calls: Vec::new(),
                cancel_after: None,
            })),
        }
    }
}

impl MockDesktop {
    /// Create an empty desktop where nothing responds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a desktop from a spec.
    #[must_use]
    pub fn from_spec(spec: &DesktopSpec) -> Self {
        let desktop = spec
            .targets
            .iter()
            .cloned()
            .fold(Self::new(), Self::with_target)
            .with_driver_errors(spec.driver_errors)
            .with_probe_errors(spec.probe_errors);
        match spec.hit_tolerance {
            Some(tolerance) => desktop.with_hit_tolerance(tolerance),
            None => desktop,
        }
    }

    /// Add a target.
    #[must_use]
    pub fn with_target(self, target: TargetBehavior) -> Self {
        self.lock().targets.push(target);
        self
    }

    /// Fail the next `count` driver calls.
    #[must_use]
    pub fn with_driver_errors(self, count: u32) -> Self {
        self.lock().pending_errors = count;
        self
    }

    /// Fail the next `count` state probes.
    #[must_use]
    pub fn with_probe_errors(self, count: u32) -> Self {
        self.lock().pending_probe_errors = count;
        self
    }

    /// Set the off-center click tolerance.
    #[must_use]
    pub fn with_hit_tolerance(self, tolerance: u32) -> Self {
        self.lock().hit_tolerance = tolerance;
        self
    }

    /// Raise `signal` once `calls` driver calls have been made.
    #[must_use]
    pub fn cancel_after_calls(self, calls: usize, signal: CancelSignal) -> Self {
        self.lock().cancel_after = Some((calls, signal));
        self
    }

    /// Driver calls so far, formatted like `click left x1 (100, 100)`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of visible effects so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    fn lock(&self) -> MutexGuard<'_, DesktopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log a driver call and apply error injection.
    fn enter(&self, call: String) -> Result<MutexGuard<'_, DesktopState>> {
        let mut state = self.lock();
        state.calls.push(call.clone());

        if let Some((after, signal)) = &state.cancel_after {
            if state.calls.len() >= *after {
                signal.cancel();
            }
        }

        if state.pending_errors > 0 {
            state.pending_errors -= 1;
            bail!("injected driver error during {}", call);
        }
        Ok(state)
    }
}

impl DesktopState {
    fn effect(&mut self) {
        self.revision += 1;
    }

    fn target_at(&self, at: Location, strategy: Strategy) -> Option<&TargetBehavior> {
        self.targets
            .iter()
            .find(|t| t.location == at && t.responds(strategy))
    }
}

impl UiDriver for MockDesktop {
    fn click(&mut self, at: Location, options: ClickOptions) -> Result<()> {
        let mut state = self.enter(format!("click {} x{} {}", options.button, options.count, at))?;
        state.pointer = at;

        let direct = state.target_at(at, Strategy::Direct).is_some();
        let tolerance = state.hit_tolerance;
        let off_center = state.targets.iter().any(|t| {
            t.location != at
                && t.location.distance_to(at) <= tolerance
                && t.responds(Strategy::AltCoordinate)
        });
        if direct || off_center {
            state.effect();
        }
        Ok(())
    }

    fn move_to(&mut self, at: Location) -> Result<()> {
        let mut state = self.enter(format!("move_to {}", at))?;
        state.pointer = at;
        Ok(())
    }

    fn send_keys(&mut self, keys: &[String]) -> Result<()> {
        let mut state = self.enter(format!("send_keys {}", keys.join("+")))?;
        let pointer = state.pointer;

        let hit = match state.typed.take() {
            // Confirming typed text.
            Some(text) => state
                .target_at(pointer, Strategy::TextSelect)
                .is_some_and(|t| t.accepts_text(&text)),
            None => state.target_at(pointer, Strategy::KeyboardNav).is_some(),
        };
        if hit {
            state.effect();
        }
        Ok(())
    }

    fn locate_nearest_interactive(
        &mut self,
        around: Location,
        radius: u32,
    ) -> Result<Option<ElementRef>> {
        let state = self.enter(format!("locate {} r{}", around, radius))?;
        let nearest = state
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.responds(Strategy::ElementSearch))
            .map(|(i, t)| (t.location.distance_to(around), i, t))
            .filter(|(distance, _, _)| *distance <= radius)
            .min_by_key(|(distance, i, _)| (*distance, *i));

        Ok(nearest.map(|(_, i, t)| {
            let element =
                ElementRef::new(format!("target-{}", i), t.location).with_control_type("button");
            match &t.label {
                Some(label) => element.with_name(label.clone()),
                None => element,
            }
        }))
    }

    fn focus_and_activate(&mut self, element: &ElementRef) -> Result<()> {
        let mut state = self.enter(format!("activate {}", element.id))?;
        if state
            .target_at(element.center, Strategy::ElementSearch)
            .is_some()
        {
            state.effect();
        }
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        let mut state = self.enter(format!("type_text {}", text))?;
        state.typed = Some(text.to_string());
        Ok(())
    }
}

impl StateProbe for MockDesktop {
    fn state_signature(&mut self) -> Result<StateSignature> {
        let mut state = self.lock();
        if state.pending_probe_errors > 0 {
            state.pending_probe_errors -= 1;
            bail!("injected probe error");
        }
        let revision = state.revision;
        Ok(StateSignature::digest(["mock-desktop".to_string(), revision.to_string()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: Location = Location::new(100, 100);

    #[test]
    fn test_empty_desktop_never_changes() {
        let mut desktop = MockDesktop::new();
        let before = desktop.state_signature().unwrap();
        desktop.click(TARGET, ClickOptions::default()).unwrap();
        desktop.send_keys(&["tab".to_string()]).unwrap();
        assert_eq!(desktop.state_signature().unwrap(), before);
        assert_eq!(desktop.revision(), 0);
    }

    #[test]
    fn test_direct_click_needs_exact_location() {
        let mut desktop =
            MockDesktop::new().with_target(TargetBehavior::new(TARGET, [Strategy::Direct]));
        desktop.click(Location::new(101, 100), ClickOptions::default()).unwrap();
        assert_eq!(desktop.revision(), 0);
        desktop.click(TARGET, ClickOptions::default()).unwrap();
        assert_eq!(desktop.revision(), 1);
    }

    #[test]
    fn test_off_center_click_within_tolerance() {
        let mut desktop = MockDesktop::new()
            .with_target(TargetBehavior::new(TARGET, [Strategy::AltCoordinate]))
            .with_hit_tolerance(5);
        desktop.click(TARGET, ClickOptions::default()).unwrap();
        desktop.click(Location::new(108, 100), ClickOptions::default()).unwrap();
        assert_eq!(desktop.revision(), 0);
        desktop.click(Location::new(104, 100), ClickOptions::default()).unwrap();
        assert_eq!(desktop.revision(), 1);
    }

    #[test]
    fn test_text_select_matches_label() {
        let mut desktop = MockDesktop::new()
            .with_target(TargetBehavior::new(TARGET, [Strategy::TextSelect]).with_label("Save"));
        desktop.move_to(TARGET).unwrap();
        desktop.type_text("Cancel").unwrap();
        desktop.send_keys(&["enter".to_string()]).unwrap();
        assert_eq!(desktop.revision(), 0);

        desktop.type_text("save").unwrap();
        desktop.send_keys(&["enter".to_string()]).unwrap();
        assert_eq!(desktop.revision(), 1);
    }

    #[test]
    fn test_locate_prefers_nearest() {
        let mut desktop = MockDesktop::new()
            .with_target(TargetBehavior::new(Location::new(140, 100), [Strategy::ElementSearch]))
            .with_target(TargetBehavior::new(Location::new(110, 100), [Strategy::ElementSearch]))
            .with_target(TargetBehavior::new(Location::new(101, 100), [Strategy::Direct]));

        let element = desktop.locate_nearest_interactive(TARGET, 50).unwrap().unwrap();
        assert_eq!(element.center, Location::new(110, 100));
        assert_eq!(element.id, "target-1");
        assert_eq!(element.control_type, "button");

        assert!(desktop.locate_nearest_interactive(TARGET, 5).unwrap().is_none());
    }

    #[test]
    fn test_error_injection_is_consumed() {
        let mut desktop = MockDesktop::new().with_driver_errors(2);
        assert!(desktop.move_to(TARGET).is_err());
        assert!(desktop.move_to(TARGET).is_err());
        assert!(desktop.move_to(TARGET).is_ok());
        // Probing is not affected by driver errors.
        assert!(desktop.state_signature().is_ok());
        assert_eq!(desktop.calls().len(), 3);
    }

    #[test]
    fn test_probe_error_injection() {
        let mut desktop = MockDesktop::new().with_probe_errors(1);
        assert!(desktop.state_signature().is_err());
        assert!(desktop.state_signature().is_ok());
        // Driver calls are not affected by probe errors.
        assert!(desktop.move_to(TARGET).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let desktop = MockDesktop::new().with_target(TargetBehavior::new(TARGET, [Strategy::Direct]));
        let mut driver = desktop.clone();
        driver.click(TARGET, ClickOptions::default()).unwrap();
        assert_eq!(desktop.revision(), 1);
        assert_eq!(desktop.calls(), vec!["click left x1 (100, 100)"]);
    }

    #[test]
    fn test_cancel_after_calls() {
        let signal = CancelSignal::new();
        let mut desktop = MockDesktop::new().cancel_after_calls(2, signal.clone());
        desktop.move_to(TARGET).unwrap();
        assert!(!signal.is_cancelled());
        desktop.move_to(TARGET).unwrap();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_from_spec() {
        let spec: DesktopSpec = serde_json::from_str(
            r#"{"targets": [{"location": {"x": 100, "y": 100}, "responds_to": ["keyboard_nav"]}],
                "driver_errors": 1}"#,
        )
        .unwrap();
        let mut desktop = MockDesktop::from_spec(&spec);
        assert!(desktop.move_to(TARGET).is_err());
        desktop.move_to(TARGET).unwrap();
        desktop.send_keys(&["tab".to_string()]).unwrap();
        assert_eq!(desktop.revision(), 1);
    }
}
