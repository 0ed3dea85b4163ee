//! The per-session interaction controller.
//!
//! A [`Controller`] owns one session's tracker, history and executor, and
//! drives each [`InteractionRequest`] through a bounded state machine:
//!
//! ```text
//!          ┌──────────────── Failure, retry ───────────────┐
//!          v                                               │
//! Idle ─> Attempting ─> Validating ─> Done (success)       │
//!  │          │             ├─────────────────────────────┘
//!  │          │             v
//!  └──────────┴──────> Escalating ─> Done (exhausted / cancelled)
//! ```
//!
//! Every request terminates: strategies are excluded on failure, the loop
//! detector vetoes repeated retries, driver faults are capped, and an
//! attempt budget bounds the rest.

pub mod cancel;
pub mod request;
pub mod result;

pub use cancel::CancelSignal;
pub use request::{InteractionRequest, CLICK_ACTION};
pub use result::{
    AttemptRecord, Diagnostics, EscalationReason, InteractionOutcome, InteractionResult,
    Transition,
};

use crate::config::GuardConfig;
use crate::driver::{StateProbe, UiDriver};
use crate::error::{GuardError, Result};
use crate::executor::ActionExecutor;
use crate::history::{ActionHistory, LoopDetector, LoopVerdict, LOOP_SUGGESTIONS};
use crate::interaction::{
    FailureReason, InteractionTracker, SessionStats, Strategy, StrategySelector,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Idle,
    Attempting,
    Validating,
    Escalating,
    Done,
}

impl ControllerState {
    /// Check if a transition to the target state is valid.
    #[must_use]
    pub fn can_transition_to(&self, target: ControllerState) -> bool {
        use ControllerState::*;
        matches!(
            (self, target),
            // From Idle
            (Idle, Attempting) | (Idle, Escalating) |
            // From Attempting
            (Attempting, Validating) | (Attempting, Escalating) |
            // From Validating
            (Validating, Done) | (Validating, Attempting) | (Validating, Escalating) |
            // From Escalating
            (Escalating, Done) |
            // From Done
            (Done, Idle)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerState::Done)
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Attempting => "attempting",
            Self::Validating => "validating",
            Self::Escalating => "escalating",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Bookkeeping for the request currently being served.
struct RequestRun {
    diagnostics: Diagnostics,
    tried: Vec<Strategy>,
    current: Option<Strategy>,
    consecutive_driver_errors: u32,
    last_driver_error: Option<String>,
}

impl RequestRun {
    fn note_attempt(&mut self, strategy: Strategy) {
        if !self.tried.contains(&strategy) {
            self.tried.push(strategy);
        }
        self.current = Some(strategy);
    }
}

/// Drives interaction requests for one session.
///
/// # Example
///
/// ```rust,ignore
/// use clickguard::{Controller, GuardConfig, InteractionRequest};
///
/// let mut controller = Controller::new(driver, probe, GuardConfig::default())?;
/// let result = controller.submit(InteractionRequest::click((100, 100)));
/// println!("{}", result.outcome);
/// ```
pub struct Controller<D, P> {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    config: GuardConfig,
    tracker: InteractionTracker,
    history: ActionHistory,
    detector: LoopDetector,
    selector: StrategySelector,
    executor: ActionExecutor<D, P>,
    cancel: CancelSignal,
    state: ControllerState,
    requests: u64,
}

impl<D: UiDriver, P: StateProbe> Controller<D, P> {
    /// Create a controller for a new session.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidConfig`] if the configuration is invalid.
    pub fn new(driver: D, probe: P, config: GuardConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|reason| GuardError::invalid_config("clickguard", reason))?;

        let session_id = Uuid::new_v4();
        info!(%session_id, "Starting interaction session");

        Ok(Self {
            session_id,
            started_at: Utc::now(),
            tracker: InteractionTracker::new(config.attempts_before_alternative),
            history: ActionHistory::new(config.history_capacity),
            detector: LoopDetector::new(config.identical_window, config.alternating_period_max),
            selector: StrategySelector::new(),
            executor: ActionExecutor::new(driver, probe, &config),
            cancel: CancelSignal::new(),
            state: ControllerState::Idle,
            requests: 0,
            config,
        })
    }

    /// Use an externally owned cancel signal.
    #[must_use]
    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Serve one request to completion.
    ///
    /// Always returns within [`GuardConfig::attempt_budget`] attempts.
    pub fn submit(&mut self, request: InteractionRequest) -> InteractionResult {
        let started = Instant::now();
        let location = request.location;
        self.requests += 1;

        let mut run = RequestRun {
            diagnostics: Diagnostics::new(self.session_id, location),
            tried: Vec::new(),
            current: None,
            consecutive_driver_errors: 0,
            last_driver_error: None,
        };

        if self.state.is_terminal() {
            self.transition(&mut run, ControllerState::Idle);
        }
        info!(%location, action = %request.action, request = self.requests, "Interaction requested");

        let budget = self.config.attempt_budget();
        let outcome = loop {
            if self.cancel.is_cancelled() {
                info!(%location, "Interaction cancelled");
                self.tracker.record_cancelled(location);
                break self.escalate(&mut run, None);
            }

            let selection = self.selector.select(&self.tracker, location, run.current);
            let Some(strategy) = selection.strategy() else {
                break self.escalate(&mut run, Some(EscalationReason::StrategiesExhausted));
            };

            if run.diagnostics.attempts.len() as u32 >= budget {
                break self.escalate(&mut run, Some(EscalationReason::AttemptBudget { budget }));
            }

            // The first attempt of a request is always made; only retries are vetoed.
            let candidate = request.action_for(strategy);
            let verdict = if run.diagnostics.attempts.is_empty() {
                LoopVerdict::None
            } else {
                self.detector.detect_with(&self.history, &candidate)
            };
            if verdict.is_loop() {
                warn!(%location, %verdict, action = %candidate, "Loop detected, escalating");
                run.diagnostics.loop_verdict = Some(verdict);
                run.diagnostics.suggestions =
                    LOOP_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
                break self.escalate(&mut run, Some(EscalationReason::LoopDetected { verdict }));
            }

            if selection.is_rotation() {
                run.diagnostics.rotations += 1;
                info!(
                    %location,
                    from = ?run.current.map(|s| s.name()),
                    to = %strategy,
                    excluded = ?self.tracker.excluded(location),
                    "Rotating strategy"
                );
            }

            self.transition(&mut run, ControllerState::Attempting);
            let outcome =
                self.executor
                    .attempt(&mut self.tracker, &mut self.history, &request, strategy);
            self.transition(&mut run, ControllerState::Validating);

            run.note_attempt(strategy);
            run.diagnostics.attempts.push(AttemptRecord {
                strategy,
                action: candidate,
                outcome: outcome.clone(),
            });

            match outcome.reason() {
                None => {
                    self.transition(&mut run, ControllerState::Done);
                    info!(%location, %strategy, attempts = run.diagnostics.attempts.len(), "Interaction completed");
                    break InteractionOutcome::Completed { strategy };
                }
                Some(FailureReason::Driver { message }) => {
                    run.diagnostics.driver_errors += 1;
                    run.consecutive_driver_errors += 1;
                    run.last_driver_error = Some(message.clone());
                    if run.consecutive_driver_errors >= self.config.max_executor_exceptions {
                        let reason = EscalationReason::DriverFault {
                            consecutive: run.consecutive_driver_errors,
                            last_error: message.clone(),
                        };
                        break self.escalate(&mut run, Some(reason));
                    }
                }
                Some(reason) => {
                    run.consecutive_driver_errors = 0;
                    debug!(%location, %strategy, %reason, failures = self.tracker.failures(location), "Attempt failed");
                }
            }
        };

        run.diagnostics.elapsed_ms = started.elapsed().as_millis() as u64;
        InteractionResult {
            outcome,
            strategy_used: run.current,
            diagnostics: run.diagnostics,
        }
    }

    /// Move to `Escalating` then `Done`, producing the terminal outcome.
    ///
    /// `None` means the request was cancelled.
    fn escalate(
        &mut self,
        run: &mut RequestRun,
        reason: Option<EscalationReason>,
    ) -> InteractionOutcome {
        self.transition(run, ControllerState::Escalating);
        self.transition(run, ControllerState::Done);

        let Some(reason) = reason else {
            return InteractionOutcome::Cancelled;
        };

        let mut tried_strategies = run.tried.clone();
        for strategy in self.tracker.excluded(run.diagnostics.location) {
            if !tried_strategies.contains(&strategy) {
                tried_strategies.push(strategy);
            }
        }

        warn!(
            location = %run.diagnostics.location,
            %reason,
            tried = ?tried_strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "Interaction escalated"
        );
        InteractionOutcome::Exhausted {
            tried_strategies,
            reason,
        }
    }

    fn transition(&mut self, run: &mut RequestRun, to: ControllerState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "invalid transition {} -> {}",
            self.state,
            to
        );
        debug!(from = %self.state, %to, "State transition");
        run.diagnostics.transitions.push(Transition {
            from: self.state,
            to,
        });
        self.state = to;
    }

    /// A handle that cancels this controller's requests.
    #[must_use]
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Clear a previous cancellation so new requests can run.
    pub fn reset_cancellation(&self) {
        self.cancel.reset();
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    #[must_use]
    pub fn tracker(&self) -> &InteractionTracker {
        &self.tracker
    }

    #[must_use]
    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        self.tracker.stats()
    }

    /// Requests served so far.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.requests
    }

    pub fn driver(&self) -> &D {
        self.executor.driver()
    }

    pub fn probe(&self) -> &P {
        self.executor.probe()
    }
}

impl<D, P> std::fmt::Debug for Controller<D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("requests", &self.requests)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}
