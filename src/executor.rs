//! Single-attempt execution.
//!
//! [`ActionExecutor`] turns one `(request, strategy)` pair into one driver
//! primitive, validates its effect through the state probe, and records the
//! outcome. It never retries; that is the controller's job.
//!
//! ```text
//! append action ─> pre signature ─> primitive ─> post signature ─> record
//!                                       │
//!                                       └─ driver error ─> Failure(driver)
//! ```

use crate::config::GuardConfig;
use crate::controller::InteractionRequest;
use crate::driver::{StateProbe, StateSignature, UiDriver};
use crate::history::ActionHistory;
use crate::interaction::{
    AttemptOutcome, FailureReason, InteractionTracker, Location, Offset, Strategy,
};
use tracing::{debug, warn};

/// Result of running a strategy primitive.
enum Performed {
    /// The primitive ran; compare signatures to judge the effect.
    Ran,
    /// The primitive ran and a state change was already observed.
    Changed,
    /// Nothing could be run.
    Skipped(FailureReason),
}

/// Performs attempts through a driver and judges them with a probe.
#[derive(Debug)]
pub struct ActionExecutor<D, P> {
    driver: D,
    probe: P,
    offsets: Vec<Offset>,
    keyboard_sequence: Vec<String>,
    confirm_key: String,
    search_radius: u32,
}

impl<D: UiDriver, P: StateProbe> ActionExecutor<D, P> {
    /// Create an executor using the strategy settings from `config`.
    pub fn new(driver: D, probe: P, config: &GuardConfig) -> Self {
        Self {
            driver,
            probe,
            offsets: config.coordinate_offsets.clone(),
            keyboard_sequence: config.keyboard_sequence.clone(),
            confirm_key: config.confirm_key.clone(),
            search_radius: config.search_radius,
        }
    }

    /// Perform one attempt and record it in `tracker` and `history`.
    pub fn attempt(
        &mut self,
        tracker: &mut InteractionTracker,
        history: &mut ActionHistory,
        request: &InteractionRequest,
        strategy: Strategy,
    ) -> AttemptOutcome {
        let location = request.location;
        history.append(request.action_for(strategy));
        debug!(%location, %strategy, approach = strategy.description(), "Attempting interaction");

        let outcome = match self.run(tracker, request, strategy) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%location, %strategy, error = %e, "Driver error during attempt");
                AttemptOutcome::failure(FailureReason::driver(format!("{:#}", e)))
            }
        };

        debug!(%location, %strategy, %outcome, "Attempt finished");
        tracker.record_outcome(location, strategy, &outcome);
        outcome
    }

    fn run(
        &mut self,
        tracker: &mut InteractionTracker,
        request: &InteractionRequest,
        strategy: Strategy,
    ) -> anyhow::Result<AttemptOutcome> {
        let before = self.probe.state_signature()?;

        let outcome = match self.perform(tracker, request, strategy, &before)? {
            Performed::Skipped(reason) => AttemptOutcome::failure(reason),
            Performed::Changed => AttemptOutcome::Success,
            Performed::Ran => {
                let after = self.probe.state_signature()?;
                if after == before {
                    AttemptOutcome::failure(FailureReason::NoStateChange)
                } else {
                    AttemptOutcome::Success
                }
            }
        };
        Ok(outcome)
    }

    fn perform(
        &mut self,
        tracker: &mut InteractionTracker,
        request: &InteractionRequest,
        strategy: Strategy,
        before: &StateSignature,
    ) -> anyhow::Result<Performed> {
        let location = request.location;

        match strategy {
            Strategy::Direct => {
                self.driver.click(location, request.click_options())?;
                Ok(Performed::Ran)
            }
            Strategy::KeyboardNav => {
                self.driver.move_to(location)?;
                self.driver.send_keys(&self.keyboard_sequence)?;
                Ok(Performed::Ran)
            }
            Strategy::ElementSearch => {
                match self
                    .driver
                    .locate_nearest_interactive(location, self.search_radius)?
                {
                    Some(element) => {
                        debug!(
                            %location,
                            element = %element.id,
                            kind = %element.control_type,
                            at = %element.center,
                            "Activating nearest element"
                        );
                        self.driver.focus_and_activate(&element)?;
                        Ok(Performed::Ran)
                    }
                    None => Ok(Performed::Skipped(FailureReason::NoInteractiveElement)),
                }
            }
            Strategy::AltCoordinate => self.click_offsets(tracker, request, before),
            Strategy::TextSelect => match request.text() {
                Some(text) => {
                    self.driver.move_to(location)?;
                    self.driver.type_text(text)?;
                    self.driver.send_keys(std::slice::from_ref(&self.confirm_key))?;
                    Ok(Performed::Ran)
                }
                None => Ok(Performed::Skipped(FailureReason::MissingText)),
            },
        }
    }

    /// Click each untried offset in order until one changes the state.
    fn click_offsets(
        &mut self,
        tracker: &mut InteractionTracker,
        request: &InteractionRequest,
        before: &StateSignature,
    ) -> anyhow::Result<Performed> {
        let location = request.location;
        let untried: Vec<Offset> = self
            .offsets
            .iter()
            .copied()
            .filter(|o| !tracker.tried_offsets(location).contains(o))
            .collect();

        if untried.is_empty() {
            return Ok(Performed::Skipped(FailureReason::OffsetsExhausted));
        }

        let options = request.click_options();
        for offset in untried {
            tracker.mark_offset_tried(location, offset);
            let target: Location = location.offset_by(offset);
            debug!(%location, %offset, %target, "Clicking offset coordinate");
            self.driver.click(target, options)?;
            if self.probe.state_signature()? != *before {
                return Ok(Performed::Changed);
            }
        }

        Ok(Performed::Skipped(FailureReason::NoStateChange))
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDesktop, TargetBehavior};

    const TARGET: Location = Location::new(100, 100);

    fn executor(desktop: &MockDesktop) -> ActionExecutor<MockDesktop, MockDesktop> {
        ActionExecutor::new(desktop.clone(), desktop.clone(), &GuardConfig::default())
    }

    fn run(
        desktop: &MockDesktop,
        tracker: &mut InteractionTracker,
        request: &InteractionRequest,
        strategy: Strategy,
    ) -> AttemptOutcome {
        let mut history = ActionHistory::default();
        executor(desktop).attempt(tracker, &mut history, request, strategy)
    }

    #[test]
    fn test_direct_success_records_outcome() {
        let desktop = MockDesktop::new().with_target(TargetBehavior::new(TARGET, [Strategy::Direct]));
        let mut tracker = InteractionTracker::default();
        let mut history = ActionHistory::default();
        let request = InteractionRequest::click(TARGET);

        let outcome = executor(&desktop).attempt(&mut tracker, &mut history, &request, Strategy::Direct);

        assert!(outcome.is_success());
        assert_eq!(history.len(), 1);
        assert_eq!(history.last(), Some(&request.action_for(Strategy::Direct)));
        assert_eq!(tracker.record(TARGET).unwrap().attempts, 1);
    }

    #[test]
    fn test_unchanged_state_is_failure() {
        let desktop = MockDesktop::new();
        let mut tracker = InteractionTracker::default();
        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::Direct);
        assert_eq!(outcome, AttemptOutcome::failure(FailureReason::NoStateChange));
        assert_eq!(tracker.excluded(TARGET), vec![Strategy::Direct]);
    }

    #[test]
    fn test_driver_error_becomes_failure() {
        let desktop = MockDesktop::new().with_driver_errors(1);
        let mut tracker = InteractionTracker::default();
        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::Direct);
        assert!(outcome.is_driver_error());
        assert_eq!(tracker.failures(TARGET), 1);
    }

    #[test]
    fn test_probe_error_becomes_driver_failure() {
        let desktop = MockDesktop::new()
            .with_target(TargetBehavior::new(TARGET, [Strategy::Direct]))
            .with_probe_errors(1);
        let mut tracker = InteractionTracker::default();

        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::Direct);

        assert!(outcome.is_driver_error());
        assert!(outcome.to_string().contains("injected probe error"));
        assert!(desktop.calls().is_empty());
        assert_eq!(tracker.failures(TARGET), 1);
    }

    #[test]
    fn test_keyboard_nav_moves_then_sends_keys() {
        let desktop =
            MockDesktop::new().with_target(TargetBehavior::new(TARGET, [Strategy::KeyboardNav]));
        let mut tracker = InteractionTracker::default();
        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::KeyboardNav);
        assert!(outcome.is_success());
        assert_eq!(desktop.calls(), vec!["move_to (100, 100)", "send_keys tab+enter"]);
    }

    #[test]
    fn test_element_search_without_element() {
        let desktop = MockDesktop::new();
        let mut tracker = InteractionTracker::default();
        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::ElementSearch);
        assert_eq!(
            outcome,
            AttemptOutcome::failure(FailureReason::NoInteractiveElement)
        );
    }

    #[test]
    fn test_element_search_activates_nearby_element() {
        let desktop = MockDesktop::new()
            .with_target(TargetBehavior::new(Location::new(120, 100), [Strategy::ElementSearch]));
        let mut tracker = InteractionTracker::default();
        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::ElementSearch);
        assert!(outcome.is_success());
    }

    #[test]
    fn test_alt_coordinate_marks_offsets_and_stops_on_change() {
        let desktop =
            MockDesktop::new().with_target(TargetBehavior::new(TARGET, [Strategy::AltCoordinate]));
        let mut tracker = InteractionTracker::default();
        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::AltCoordinate);
        assert!(outcome.is_success());
        // Success clears the offsets already tried.
        assert!(tracker.tried_offsets(TARGET).is_empty());
        assert_eq!(desktop.calls(), vec!["click left x1 (108, 100)"]);
    }

    #[test]
    fn test_alt_coordinate_skips_tried_offsets() {
        let desktop = MockDesktop::new();
        let mut tracker = InteractionTracker::default();
        tracker.mark_offset_tried(TARGET, Offset::new(8, 0));
        tracker.mark_offset_tried(TARGET, Offset::new(-8, 0));

        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::AltCoordinate);
        assert_eq!(outcome, AttemptOutcome::failure(FailureReason::NoStateChange));
        assert_eq!(
            desktop.calls(),
            vec!["click left x1 (100, 108)", "click left x1 (100, 92)"]
        );
        assert_eq!(tracker.tried_offsets(TARGET).len(), 4);

        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::AltCoordinate);
        assert_eq!(outcome, AttemptOutcome::failure(FailureReason::OffsetsExhausted));
    }

    #[test]
    fn test_text_select_requires_text() {
        let desktop =
            MockDesktop::new().with_target(TargetBehavior::new(TARGET, [Strategy::TextSelect]));
        let mut tracker = InteractionTracker::default();

        let outcome = run(&desktop, &mut tracker, &InteractionRequest::click(TARGET), Strategy::TextSelect);
        assert_eq!(outcome, AttemptOutcome::failure(FailureReason::MissingText));

        let request = InteractionRequest::click(TARGET).with_text("Save");
        let outcome = run(&desktop, &mut tracker, &request, Strategy::TextSelect);
        assert!(outcome.is_success());
        assert!(desktop.calls().contains(&"type_text Save".to_string()));
        assert!(desktop.calls().contains(&"send_keys enter".to_string()));
    }

    #[test]
    fn test_click_options_passed_through() {
        let desktop = MockDesktop::new().with_target(TargetBehavior::new(TARGET, [Strategy::Direct]));
        let mut tracker = InteractionTracker::default();
        let request = InteractionRequest::click(TARGET)
            .with_button(crate::driver::MouseButton::Right)
            .with_clicks(2);
        run(&desktop, &mut tracker, &request, Strategy::Direct);
        assert_eq!(desktop.calls(), vec!["click right x2 (100, 100)"]);
    }
}
