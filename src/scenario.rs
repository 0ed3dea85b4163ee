//! Scenario replay.
//!
//! A scenario is a JSON file describing a simulated desktop and a list of
//! requests. Replaying it runs every request through one controller session,
//! which makes retry and loop behavior reproducible from the command line.
//!
//! ```json
//! {
//!   "name": "save dialog",
//!   "desktop": {
//!     "targets": [{"location": {"x": 100, "y": 100}, "responds_to": ["keyboard_nav"]}]
//!   },
//!   "requests": [{"location": {"x": 100, "y": 100}}]
//! }
//! ```

use crate::config::GuardConfig;
use crate::controller::{CancelSignal, Controller, InteractionRequest, InteractionResult};
use crate::error::{GuardError, Result};
use crate::interaction::SessionStats;
use crate::testing::{DesktopSpec, MockDesktop};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// A replayable interaction scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Configuration for the session; the loaded configuration when absent.
    #[serde(default)]
    pub config: Option<GuardConfig>,
    #[serde(default)]
    pub desktop: DesktopSpec,
    pub requests: Vec<InteractionRequest>,
}

/// Results of replaying a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: Option<String>,
    pub session_id: Uuid,
    pub results: Vec<InteractionResult>,
    pub stats: SessionStats,
    /// Requests not run because the session was cancelled.
    pub skipped: usize,
}

impl ScenarioReport {
    /// Number of completed requests.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }

    /// True when every request completed.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.skipped == 0 && self.completed() == self.results.len()
    }
}

impl Scenario {
    /// Load a scenario from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, is not valid JSON, or has
    /// no requests.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GuardError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&content)
            .map_err(|e| GuardError::scenario(format!("{}: {}", path.display(), e)))?;
        scenario.check()?;
        Ok(scenario)
    }

    fn check(&self) -> Result<()> {
        if self.requests.is_empty() {
            return Err(GuardError::scenario("scenario has no requests"));
        }
        Ok(())
    }

    /// The configuration to run with, given the otherwise loaded one.
    #[must_use]
    pub fn effective_config(&self, fallback: &GuardConfig) -> GuardConfig {
        self.config.clone().unwrap_or_else(|| fallback.clone())
    }

    /// Build the simulated desktop.
    #[must_use]
    pub fn build_desktop(&self) -> MockDesktop {
        MockDesktop::from_spec(&self.desktop)
    }

    /// Replay every request through a single session.
    ///
    /// Stops early, counting the rest as skipped, once `cancel` is raised.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn run(&self, config: GuardConfig, cancel: CancelSignal) -> Result<ScenarioReport> {
        self.check()?;
        let desktop = self.build_desktop();
        let mut controller =
            Controller::new(desktop.clone(), desktop, config)?.with_cancel_signal(cancel.clone());

        info!(
            scenario = self.name.as_deref().unwrap_or("unnamed"),
            requests = self.requests.len(),
            session_id = %controller.session_id(),
            "Replaying scenario"
        );

        let mut results = Vec::with_capacity(self.requests.len());
        for request in &self.requests {
            if cancel.is_cancelled() && !results.is_empty() {
                break;
            }
            results.push(controller.submit(request.clone()));
        }

        Ok(ScenarioReport {
            name: self.name.clone(),
            session_id: controller.session_id(),
            skipped: self.requests.len() - results.len(),
            stats: controller.stats().clone(),
            results,
        })
    }
}
