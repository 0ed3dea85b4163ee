//! Custom error types for clickguard.
//!
//! This module provides structured error types that enable better
//! error handling, reporting, and recovery throughout the crate.

use crate::history::LoopVerdict;
use crate::interaction::{Location, Strategy};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for clickguard operations
#[derive(Error, Debug)]
pub enum GuardError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Missing required file
    #[error("Missing required file: {path}")]
    MissingFile { path: PathBuf },

    // =========================================================================
    // Interaction Errors
    // =========================================================================
    /// Every strategy was tried for a location without effect
    #[error("All strategies exhausted at {location} (tried: {})", format_strategies(.tried))]
    StrategiesExhausted {
        location: Location,
        tried: Vec<Strategy>,
    },

    /// The driver kept raising errors
    #[error("Driver failed {consecutive} times in a row: {last_error}")]
    DriverFault { consecutive: u32, last_error: String },

    /// A repeating action pattern forced escalation
    #[error("Loop detected at {location}: {verdict}")]
    LoopDetected {
        location: Location,
        verdict: LoopVerdict,
    },

    /// Caller cancelled the interaction
    #[error("Interaction at {location} cancelled")]
    Cancelled { location: Location },

    // =========================================================================
    // Scenario Errors
    // =========================================================================
    /// Scenario file could not be used
    #[error("Scenario error: {message}")]
    Scenario { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML error wrapper
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_strategies(strategies: &[Strategy]) -> String {
    strategies
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl GuardError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a scenario error
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if the caller can reasonably retry (e.g. after retargeting)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::LoopDetected { .. } | Self::Cancelled { .. } | Self::StrategiesExhausted { .. }
        )
    }

    /// Check if this error is fatal for the session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DriverFault { .. }
                | Self::Config { .. }
                | Self::InvalidConfig { .. }
                | Self::MissingFile { .. }
        )
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StrategiesExhausted { .. } | Self::LoopDetected { .. } => 3,
            Self::DriverFault { .. } => 4,
            Self::Cancelled { .. } => 5,
            Self::MissingFile { .. } => 6,
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            Self::Scenario { .. } => 8,
            _ => 1,
        }
    }
}

/// Type alias for clickguard results
pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_display_lists_strategies() {
        let err = GuardError::StrategiesExhausted {
            location: Location::new(100, 100),
            tried: vec![Strategy::Direct, Strategy::KeyboardNav],
        };
        let text = err.to_string();
        assert!(text.contains("(100, 100)"));
        assert!(text.contains("direct, keyboard_nav"));
    }

    #[test]
    fn test_is_recoverable() {
        let loc = Location::new(1, 2);
        assert!(GuardError::Cancelled { location: loc }.is_recoverable());
        assert!(GuardError::LoopDetected {
            location: loc,
            verdict: LoopVerdict::Alternating { period: 2 },
        }
        .is_recoverable());
        assert!(!GuardError::DriverFault {
            consecutive: 3,
            last_error: "boom".into()
        }
        .is_recoverable());
    }

    #[test]
    fn test_is_fatal() {
        assert!(GuardError::DriverFault {
            consecutive: 3,
            last_error: "boom".into()
        }
        .is_fatal());
        assert!(GuardError::config("bad").is_fatal());
        assert!(!GuardError::Cancelled {
            location: Location::new(0, 0)
        }
        .is_fatal());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            GuardError::StrategiesExhausted {
                location: Location::new(0, 0),
                tried: vec![],
            }
            .exit_code(),
            3
        );
        assert_eq!(
            GuardError::DriverFault {
                consecutive: 3,
                last_error: String::new()
            }
            .exit_code(),
            4
        );
        assert_eq!(GuardError::config("test").exit_code(), 7);
        assert_eq!(GuardError::scenario("test").exit_code(), 8);
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/test/clickguard.toml");
        let err = GuardError::config_with_path("failed to parse", path.clone());
        if let GuardError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "failed to parse");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: GuardError = io_err.into();
        assert!(matches!(err, GuardError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
