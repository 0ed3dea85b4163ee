//! Request results and diagnostics.

use super::ControllerState;
use crate::error::{GuardError, Result};
use crate::history::{Action, LoopVerdict};
use crate::interaction::{AttemptOutcome, Location, Strategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a request ended without success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationReason {
    /// Every strategy failed at the location.
    StrategiesExhausted,
    /// The next action would have repeated a loop.
    LoopDetected { verdict: LoopVerdict },
    /// Too many consecutive driver errors.
    DriverFault { consecutive: u32, last_error: String },
    /// The per-request attempt bound was reached.
    AttemptBudget { budget: u32 },
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrategiesExhausted => write!(f, "all strategies exhausted"),
            Self::LoopDetected { verdict } => write!(f, "loop detected ({})", verdict),
            Self::DriverFault {
                consecutive,
                last_error,
            } => write!(f, "{} consecutive driver errors: {}", consecutive, last_error),
            Self::AttemptBudget { budget } => write!(f, "attempt budget of {} spent", budget),
        }
    }
}

/// Terminal outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InteractionOutcome {
    /// A strategy changed the UI state.
    Completed { strategy: Strategy },
    /// The request gave up.
    Exhausted {
        tried_strategies: Vec<Strategy>,
        reason: EscalationReason,
    },
    /// The caller cancelled the request.
    Cancelled,
}

impl InteractionOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Strategies tried before giving up (empty unless exhausted).
    #[must_use]
    pub fn tried_strategies(&self) -> &[Strategy] {
        match self {
            Self::Exhausted {
                tried_strategies, ..
            } => tried_strategies,
            _ => &[],
        }
    }
}

impl std::fmt::Display for InteractionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed { strategy } => write!(f, "completed via {}", strategy),
            Self::Exhausted { reason, .. } => write!(f, "exhausted: {}", reason),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One attempt made while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub strategy: Strategy,
    pub action: Action,
    pub outcome: AttemptOutcome,
}

/// A state machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: ControllerState,
    pub to: ControllerState,
}

/// Everything observed while serving one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub session_id: Uuid,
    pub location: Location,
    pub attempts: Vec<AttemptRecord>,
    pub transitions: Vec<Transition>,
    /// Strategy switches during the request.
    pub rotations: u32,
    pub driver_errors: u32,
    /// Loop verdict that ended the request, if any.
    pub loop_verdict: Option<LoopVerdict>,
    /// Alternatives for the caller when a loop was detected.
    pub suggestions: Vec<String>,
    pub elapsed_ms: u64,
}

impl Diagnostics {
    pub(crate) fn new(session_id: Uuid, location: Location) -> Self {
        Self {
            session_id,
            location,
            attempts: Vec::new(),
            transitions: Vec::new(),
            rotations: 0,
            driver_errors: 0,
            loop_verdict: None,
            suggestions: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Strategies in the order they were attempted, one per attempt.
    #[must_use]
    pub fn attempt_strategies(&self) -> Vec<Strategy> {
        self.attempts.iter().map(|a| a.strategy).collect()
    }

    /// States visited, starting with the first transition's source.
    #[must_use]
    pub fn states(&self) -> Vec<ControllerState> {
        let mut states: Vec<ControllerState> =
            self.transitions.first().map(|t| t.from).into_iter().collect();
        states.extend(self.transitions.iter().map(|t| t.to));
        states
    }
}

/// What the caller gets back for a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionResult {
    pub outcome: InteractionOutcome,
    /// Strategy of the last attempt made, if any.
    pub strategy_used: Option<Strategy>,
    pub diagnostics: Diagnostics,
}

impl InteractionResult {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome.is_completed()
    }

    /// Convert into a `Result`, mapping every non-completion to its error.
    ///
    /// # Errors
    ///
    /// Returns the [`GuardError`] matching the escalation or cancellation.
    pub fn into_result(self) -> Result<Strategy> {
        let location = self.diagnostics.location;
        match self.outcome {
            InteractionOutcome::Completed { strategy } => Ok(strategy),
            InteractionOutcome::Cancelled => Err(GuardError::Cancelled { location }),
            InteractionOutcome::Exhausted {
                tried_strategies,
                reason,
            } => Err(match reason {
                EscalationReason::StrategiesExhausted | EscalationReason::AttemptBudget { .. } => {
                    GuardError::StrategiesExhausted {
                        location,
                        tried: tried_strategies,
                    }
                }
                EscalationReason::LoopDetected { verdict } => {
                    GuardError::LoopDetected { location, verdict }
                }
                EscalationReason::DriverFault {
                    consecutive,
                    last_error,
                } => GuardError::DriverFault {
                    consecutive,
                    last_error,
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: InteractionOutcome) -> InteractionResult {
        InteractionResult {
            outcome,
            strategy_used: None,
            diagnostics: Diagnostics::new(Uuid::nil(), Location::new(100, 100)),
        }
    }

    #[test]
    fn test_into_result_completed() {
        let r = result(InteractionOutcome::Completed {
            strategy: Strategy::KeyboardNav,
        });
        assert_eq!(r.into_result().unwrap(), Strategy::KeyboardNav);
    }

    #[test]
    fn test_into_result_exhausted() {
        let r = result(InteractionOutcome::Exhausted {
            tried_strategies: vec![Strategy::Direct, Strategy::KeyboardNav],
            reason: EscalationReason::StrategiesExhausted,
        });
        let err = r.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "All strategies exhausted at (100, 100) (tried: direct, keyboard_nav)"
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_into_result_loop_and_fault() {
        let r = result(InteractionOutcome::Exhausted {
            tried_strategies: vec![],
            reason: EscalationReason::LoopDetected {
                verdict: LoopVerdict::Alternating { period: 2 },
            },
        });
        assert!(matches!(
            r.into_result(),
            Err(GuardError::LoopDetected { .. })
        ));

        let r = result(InteractionOutcome::Exhausted {
            tried_strategies: vec![Strategy::Direct],
            reason: EscalationReason::DriverFault {
                consecutive: 3,
                last_error: "boom".to_string(),
            },
        });
        assert!(r.into_result().unwrap_err().is_fatal());
    }

    #[test]
    fn test_into_result_cancelled() {
        let err = result(InteractionOutcome::Cancelled).into_result().unwrap_err();
        assert!(matches!(err, GuardError::Cancelled { .. }));
    }

    #[test]
    fn test_outcome_serialized_shape() {
        let json = serde_json::to_value(InteractionOutcome::Exhausted {
            tried_strategies: vec![Strategy::Direct],
            reason: EscalationReason::AttemptBudget { budget: 7 },
        })
        .unwrap();
        assert_eq!(json["status"], "exhausted");
        assert_eq!(json["tried_strategies"][0], "direct");
        assert_eq!(json["reason"]["kind"], "attempt_budget");
    }

    #[test]
    fn test_states_from_transitions() {
        let mut diagnostics = Diagnostics::new(Uuid::nil(), Location::default());
        assert!(diagnostics.states().is_empty());
        diagnostics.transitions.push(Transition {
            from: ControllerState::Idle,
            to: ControllerState::Attempting,
        });
        diagnostics.transitions.push(Transition {
            from: ControllerState::Attempting,
            to: ControllerState::Validating,
        });
        assert_eq!(
            diagnostics.states(),
            vec![
                ControllerState::Idle,
                ControllerState::Attempting,
                ControllerState::Validating
            ]
        );
    }
}
