//! Configuration validation.
//!
//! Checks every config file that could be loaded for a project (syntax,
//! unknown keys, field values) and collects the findings in a
//! [`ValidationReport`] instead of failing on the first problem.
//!
//! # Example
//!
//! ```rust,ignore
//! use clickguard::config::ConfigValidator;
//! use std::path::Path;
//!
//! let report = ConfigValidator::new(Path::new("/path/to/project")).validate();
//! if !report.is_valid() {
//!     for error in &report.errors {
//!         eprintln!("Error: {}", error);
//!     }
//!     std::process::exit(report.exit_code());
//! }
//! ```

use std::path::{Path, PathBuf};

use super::{GuardConfig, KNOWN_FIELDS};

/// Result of configuration validation.
///
/// An empty report is valid. Warnings never affect validity.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Problems that make the configuration unusable.
    pub errors: Vec<String>,
    /// Suspicious but usable settings.
    pub warnings: Vec<String>,
    /// Config files that were inspected.
    pub files_checked: Vec<PathBuf>,
    /// The file that would actually be loaded, if any.
    pub effective_file: Option<PathBuf>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns 0 if valid, 1 if invalid.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            1
        }
    }

    /// One-line summary of the result.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_valid() {
            if self.warnings.is_empty() {
                "Configuration is valid.".to_string()
            } else {
                format!(
                    "Configuration is valid with {} warning(s).",
                    self.warnings.len()
                )
            }
        } else {
            format!(
                "Configuration is invalid with {} error(s).",
                self.errors.len()
            )
        }
    }

    /// Multi-line report with files, errors and warnings.
    #[must_use]
    pub fn verbose_report(&self) -> String {
        let mut lines = vec![
            "Configuration Validation Report".to_string(),
            "\u{2500}".repeat(50),
            String::new(),
            "Files checked:".to_string(),
        ];

        if self.files_checked.is_empty() {
            lines.push("  (no config files found - using defaults)".to_string());
        } else {
            for file in &self.files_checked {
                let marker = if self.effective_file.as_ref() == Some(file) {
                    " (effective)"
                } else {
                    ""
                };
                lines.push(format!("  {}{}", file.display(), marker));
            }
        }

        if !self.errors.is_empty() {
            lines.push(String::new());
            lines.push("Errors:".to_string());
            for error in &self.errors {
                lines.push(format!("  \u{2717} {}", error));
            }
        }

        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.push("Warnings:".to_string());
            for warning in &self.warnings {
                lines.push(format!("  ! {}", warning));
            }
        }

        lines.push(String::new());
        lines.push(self.summary());
        lines.join("\n")
    }
}

/// Validates the config files visible from a project directory.
#[derive(Debug, Clone)]
pub struct ConfigValidator {
    project_dir: PathBuf,
    user_config_path: Option<PathBuf>,
}

impl ConfigValidator {
    /// Create a validator using the platform user config path.
    #[must_use]
    pub fn new(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            user_config_path: GuardConfig::user_path(),
        }
    }

    /// Set a custom user config path for testing.
    #[must_use]
    pub fn with_user_config_path(mut self, path: PathBuf) -> Self {
        self.user_config_path = Some(path);
        self
    }

    /// Validate and return a report.
    ///
    /// Both the project and the user file are checked when present, even
    /// though only the first one found is loaded.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        let project = GuardConfig::project_path(&self.project_dir);
        let candidates = std::iter::once(project)
            .chain(self.user_config_path.clone())
            .filter(|p| p.exists());

        for path in candidates {
            if report.effective_file.is_none() {
                report.effective_file = Some(path.clone());
            }
            Self::check_file(&path, &mut report);
            report.files_checked.push(path);
        }

        if report.files_checked.is_empty() {
            report
                .warnings
                .push("No clickguard.toml found - using defaults".to_string());
            Self::check_values(&GuardConfig::default(), "defaults", &mut report);
        }

        report
    }

    fn check_file(path: &Path, report: &mut ValidationReport) {
        let name = path.display().to_string();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                report.errors.push(format!("Cannot read {}: {}", name, e));
                return;
            }
        };

        let table: toml::Table = match toml::from_str(&content) {
            Ok(table) => table,
            Err(e) => {
                report
                    .errors
                    .push(format!("{} syntax error: {}", name, e.message()));
                return;
            }
        };

        for key in table.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                report
                    .warnings
                    .push(format!("{}: unknown key '{}' is ignored", name, key));
            }
        }

        match toml::from_str::<GuardConfig>(&content) {
            Ok(config) => Self::check_values(&config, &name, report),
            Err(e) => report
                .errors
                .push(format!("{} field error: {}", name, e.message())),
        }
    }

    fn check_values(config: &GuardConfig, source: &str, report: &mut ValidationReport) {
        if let Err(e) = config.validate() {
            report.errors.push(format!("{}: {}", source, e));
        }
        for warning in config.warnings() {
            report.warnings.push(format!("{}: {}", source, warning));
        }
    }
}
