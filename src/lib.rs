//! clickguard - adaptive retry and loop prevention for UI automation
//!
//! Issues clicks, key sequences and text entry through an external driver,
//! notices when automation stops making progress, and rotates through
//! alternative interaction strategies per target before giving up. Every
//! request terminates in a bounded number of steps.
//!
//! # Architecture
//!
//! - [`history`] - bounded action history and loop detection
//! - [`interaction`] - locations, strategies, per-location tracking, selection
//! - [`driver`] - the UI driver and state probe the engine talks to
//! - [`executor`] - one attempt: primitive, effect check, bookkeeping
//! - [`controller`] - the per-session state machine callers use
//! - [`config`] - configuration loading and validation
//! - [`scenario`] - replay of simulated sessions from JSON
//! - [`error`] - custom error types and handling
//! - [`testing`] - scriptable desktop and result assertions
//!
//! # Example
//!
//! ```rust,ignore
//! use clickguard::{Controller, GuardConfig, InteractionRequest};
//!
//! let config = GuardConfig::load(project_dir)?;
//! let mut controller = Controller::new(driver, probe, config)?;
//!
//! let result = controller.submit(InteractionRequest::click((100, 100)));
//! match result.into_result() {
//!     Ok(strategy) => println!("clicked via {}", strategy),
//!     Err(e) => eprintln!("gave up: {}", e),
//! }
//! ```

pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod executor;
pub mod history;
pub mod interaction;
pub mod scenario;
pub mod testing;

// Re-export commonly used types
pub use error::{GuardError, Result};

pub use config::{ConfigValidator, GuardConfig, ValidationReport};

pub use controller::{
    CancelSignal, Controller, ControllerState, Diagnostics, EscalationReason, InteractionOutcome,
    InteractionRequest, InteractionResult,
};

pub use driver::{ClickOptions, ElementRef, MouseButton, StateProbe, StateSignature, UiDriver};

pub use executor::ActionExecutor;

pub use history::{Action, ActionHistory, LoopDetector, LoopVerdict};

pub use interaction::{
    AttemptOutcome, FailureReason, InteractionTracker, Location, Offset, SessionStats, Strategy,
    StrategySelector,
};

pub use scenario::{Scenario, ScenarioReport};

pub use testing::{MockDesktop, TargetBehavior};
