//! Attempt outcomes and failure reasons.

use serde::{Deserialize, Serialize};

/// Why an attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The primitive ran but the UI state signature did not change.
    NoStateChange,
    /// The driver or probe raised an error.
    Driver { message: String },
    /// No interactive element was found near the target.
    NoInteractiveElement,
    /// Every configured coordinate offset was already tried here.
    OffsetsExhausted,
    /// Text selection needs a `text` parameter.
    MissingText,
}

impl FailureReason {
    /// Create a driver failure from any error.
    pub fn driver(error: impl std::fmt::Display) -> Self {
        Self::Driver {
            message: error.to_string(),
        }
    }

    /// Driver-level failure, as opposed to a semantic one.
    #[must_use]
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoStateChange => write!(f, "no state change"),
            Self::Driver { message } => write!(f, "driver error: {}", message),
            Self::NoInteractiveElement => write!(f, "no interactive element near target"),
            Self::OffsetsExhausted => write!(f, "all coordinate offsets already tried"),
            Self::MissingText => write!(f, "no text to select"),
        }
    }
}

/// Result of a single executor attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failure { reason: FailureReason },
}

impl AttemptOutcome {
    /// Create a failure outcome.
    #[must_use]
    pub fn failure(reason: FailureReason) -> Self {
        Self::Failure { reason }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// True when the attempt failed because the driver raised.
    #[must_use]
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Failure { reason } if reason.is_driver_error())
    }

    /// The failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Success => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure { reason } => write!(f, "failure ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_classification() {
        let outcome = AttemptOutcome::failure(FailureReason::driver("element vanished"));
        assert!(outcome.is_driver_error());
        assert!(!AttemptOutcome::failure(FailureReason::NoStateChange).is_driver_error());
        assert!(!AttemptOutcome::Success.is_driver_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            AttemptOutcome::failure(FailureReason::NoStateChange).to_string(),
            "failure (no state change)"
        );
        assert_eq!(
            FailureReason::driver("timeout").to_string(),
            "driver error: timeout"
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json =
            serde_json::to_value(AttemptOutcome::failure(FailureReason::MissingText)).unwrap();
        assert_eq!(json["result"], "failure");
        assert_eq!(json["reason"]["kind"], "missing_text");
    }
}
