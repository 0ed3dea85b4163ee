//! Custom assertions for interaction results.

use crate::controller::{EscalationReason, InteractionOutcome, InteractionResult};
use crate::interaction::Strategy;

/// Assert that a request completed via `strategy`.
///
/// # Panics
///
/// Panics with the attempt log if the outcome differs.
///
/// # Example
///
/// ```rust,ignore
/// let result = controller.submit(InteractionRequest::click((100, 100)));
/// assert_completed_with(&result, Strategy::KeyboardNav);
/// ```
pub fn assert_completed_with(result: &InteractionResult, strategy: Strategy) {
    assert_eq!(
        result.outcome,
        InteractionOutcome::Completed { strategy },
        "Expected completion via {}, got {}.\nAttempts: {:?}",
        strategy,
        result.outcome,
        result.diagnostics.attempt_strategies()
    );
}

/// Assert that a request gave up after trying exactly `tried`.
///
/// # Panics
///
/// Panics if the request completed, was cancelled, or tried other strategies.
pub fn assert_exhausted(result: &InteractionResult, tried: &[Strategy]) {
    match &result.outcome {
        InteractionOutcome::Exhausted {
            tried_strategies, ..
        } => assert_eq!(
            tried_strategies, tried,
            "Expected strategies {:?} to be tried, got {:?}",
            tried, tried_strategies
        ),
        other => panic!("Expected an exhausted outcome, got {}", other),
    }
}

/// Assert that a request escalated for the given kind of reason.
///
/// Only the variant is compared, not its fields.
///
/// # Panics
///
/// Panics if the request did not escalate or escalated for another reason.
pub fn assert_escalated_by(result: &InteractionResult, expected: &EscalationReason) {
    match &result.outcome {
        InteractionOutcome::Exhausted { reason, .. } => assert_eq!(
            std::mem::discriminant(reason),
            std::mem::discriminant(expected),
            "Expected escalation by {}, got {}",
            expected,
            reason
        ),
        other => panic!("Expected escalation by {}, got {}", expected, other),
    }
}

/// Assert the exact number of attempts made.
///
/// # Panics
///
/// Panics if the attempt count differs.
pub fn assert_attempt_count(result: &InteractionResult, expected: usize) {
    let actual = result.diagnostics.attempts.len();
    assert_eq!(
        actual,
        expected,
        "Expected {} attempts, got {}.\nAttempts: {:?}",
        expected,
        actual,
        result.diagnostics.attempt_strategies()
    );
}

/// Assert that no strategy was attempted again after a different one.
///
/// Consecutive retries of the same strategy are fine; returning to a
/// strategy after rotating away from it is not.
///
/// # Panics
///
/// Panics if a strategy reappears after rotation.
pub fn assert_no_strategy_revisited(result: &InteractionResult) {
    let strategies = result.diagnostics.attempt_strategies();
    let mut left: Vec<Strategy> = Vec::new();
    for pair in strategies.windows(2) {
        if pair[0] != pair[1] {
            left.push(pair[0]);
        }
        assert!(
            !left.contains(&pair[1]),
            "Strategy {} was attempted again after rotating away: {:?}",
            pair[1],
            strategies
        );
    }
}
