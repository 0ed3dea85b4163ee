//! clickguard - adaptive retry and loop prevention for UI automation
//!
//! Command-line front end: replays scenarios, checks action logs for loops,
//! and inspects configuration.

use clap::{Parser, Subcommand};
use clickguard::config::ConfigValidator;
use clickguard::{
    Action, ActionHistory, CancelSignal, GuardConfig, GuardError, InteractionOutcome,
    InteractionResult, LoopDetector, Scenario, ScenarioReport,
};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "clickguard")]
#[command(version)]
#[command(about = "Adaptive retry and loop prevention for UI automation", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Failures at a location before alternative strategies are tried
    #[arg(
        long,
        global = true,
        env = "CLICKGUARD_ATTEMPTS_BEFORE_ALTERNATIVE",
        value_name = "N"
    )]
    attempts_before_alternative: Option<u32>,

    /// Trailing identical actions that count as a loop
    #[arg(long, global = true, env = "CLICKGUARD_IDENTICAL_WINDOW", value_name = "N")]
    identical_window: Option<usize>,

    /// Actions kept in the history window
    #[arg(long, global = true, env = "CLICKGUARD_HISTORY_CAPACITY", value_name = "N")]
    history_capacity: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON scenario through one controller session
    Run {
        /// Scenario file
        scenario: PathBuf,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the loop verdict after each action in a JSON action log
    Detect {
        /// JSON file holding an array of actions
        actions: PathBuf,

        /// Output verdicts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration files
    Validate,

    /// Show configuration file paths
    Paths,
}

#[derive(Serialize)]
struct VerdictLine<'a> {
    index: usize,
    action: &'a Action,
    verdict: clickguard::LoopVerdict,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "clickguard=debug,info"
    } else {
        "clickguard=info,warn"
    };

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    // Resolve project path
    let project_path = cli.project.canonicalize().unwrap_or(cli.project.clone());

    if !project_path.exists() {
        eprintln!(
            "{} Project directory does not exist: {}",
            "Error:".red().bold(),
            project_path.display()
        );
        std::process::exit(1);
    }

    let code = match dispatch(&cli, &project_path).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            e.exit_code()
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

async fn dispatch(cli: &Cli, project_path: &Path) -> clickguard::Result<i32> {
    match &cli.command {
        Commands::Run { scenario, json } => {
            let scenario = Scenario::load(scenario)?;
            let loaded = GuardConfig::load(project_path)?;
            let mut config = scenario.effective_config(&loaded);
            apply_overrides(&mut config, cli);

            let cancel = CancelSignal::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Ctrl-C received, cancelling");
                    on_ctrl_c.cancel();
                }
            });

            let report = tokio::task::spawn_blocking(move || scenario.run(config, cancel))
                .await
                .map_err(|e| GuardError::Other(e.into()))??;

            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            Ok(report_exit_code(&report))
        }

        Commands::Detect { actions, json } => {
            if !actions.exists() {
                return Err(GuardError::MissingFile {
                    path: actions.clone(),
                });
            }
            let content = std::fs::read_to_string(actions)?;
            let actions: Vec<Action> = serde_json::from_str(&content)?;

            let mut config = GuardConfig::load(project_path)?;
            apply_overrides(&mut config, cli);
            config
                .validate()
                .map_err(|reason| GuardError::invalid_config("clickguard", reason))?;

            let detector = LoopDetector::new(config.identical_window, config.alternating_period_max);
            let mut history = ActionHistory::new(config.history_capacity);
            let mut lines = Vec::with_capacity(actions.len());
            for (i, action) in actions.iter().enumerate() {
                history.append(action.clone());
                lines.push(VerdictLine {
                    index: i + 1,
                    action,
                    verdict: detector.detect_history(&history),
                });
            }

            if *json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                println!("\n{} Loop Detection", "Detect:".cyan().bold());
                println!("{}", "─".repeat(60));
                for line in &lines {
                    let verdict = if line.verdict.is_loop() {
                        line.verdict.to_string().red().bold()
                    } else {
                        line.verdict.to_string().green()
                    };
                    println!("   {:>3}. {}  {}", line.index, line.action, verdict);
                }
            }
            Ok(0)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                let mut config = GuardConfig::load(project_path)?;
                apply_overrides(&mut config, cli);

                if *json {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    print_config(&config);
                }
                Ok(0)
            }

            ConfigAction::Validate => {
                let report = ConfigValidator::new(project_path).validate();
                println!("{}", report.verbose_report());
                Ok(report.exit_code())
            }

            ConfigAction::Paths => {
                let project = GuardConfig::project_path(project_path);
                let user = GuardConfig::user_path();
                let effective = GuardConfig::locate(project_path, user.as_deref());

                println!("\n{} Configuration Paths", "Config:".cyan().bold());
                println!("{}", "─".repeat(40));
                println!("   Project: {}", project.display());
                match &user {
                    Some(path) => println!("   User: {}", path.display()),
                    None => println!("   User: (no config directory)"),
                }
                match effective {
                    Some(path) => println!("   Effective: {}", path.display()),
                    None => println!("   Effective: (defaults)"),
                }
                Ok(0)
            }
        },
    }
}

fn apply_overrides(config: &mut GuardConfig, cli: &Cli) {
    if let Some(n) = cli.attempts_before_alternative {
        config.attempts_before_alternative = n;
    }
    if let Some(n) = cli.identical_window {
        config.identical_window = n;
    }
    if let Some(n) = cli.history_capacity {
        config.history_capacity = n;
    }
}

/// 0 when everything completed, else the code of the first failure.
fn report_exit_code(report: &ScenarioReport) -> i32 {
    report
        .results
        .iter()
        .find(|r| !r.is_completed())
        .and_then(|r| r.clone().into_result().err())
        .map_or(0, |e| e.exit_code())
}

fn print_config(config: &GuardConfig) {
    let offsets: Vec<String> = config
        .coordinate_offsets
        .iter()
        .map(|o| o.to_string())
        .collect();

    println!("\n{} Guard Configuration", "Config:".cyan().bold());
    println!("{}", "─".repeat(40));
    println!(
        "   Attempts before alternative: {}",
        config.attempts_before_alternative
    );
    println!("   Identical window: {}", config.identical_window);
    println!("   Alternating period max: {}", config.alternating_period_max);
    println!("   History capacity: {}", config.history_capacity);
    println!("   Max executor exceptions: {}", config.max_executor_exceptions);
    println!("   Coordinate offsets: {}", offsets.join(" "));
    println!("   Keyboard sequence: {}", config.keyboard_sequence.join("+"));
    println!("   Confirm key: {}", config.confirm_key);
    println!("   Search radius: {}", config.search_radius);
    println!("   Attempt budget: {}", config.attempt_budget());
}

fn print_report(report: &ScenarioReport) {
    let title = report.name.as_deref().unwrap_or("scenario");
    println!("\n{} {}", "Scenario:".cyan().bold(), title);
    println!("{}", "─".repeat(60));

    for (i, result) in report.results.iter().enumerate() {
        print_result(i + 1, result);
    }
    if report.skipped > 0 {
        println!(
            "   {} {} request(s) skipped after cancellation",
            "!".yellow(),
            report.skipped
        );
    }

    println!("{}", "─".repeat(60));
    println!(
        "   {}/{} completed",
        report.completed(),
        report.results.len() + report.skipped
    );
    for line in report.stats.summary().lines() {
        println!("   {}", line);
    }
}

fn print_result(index: usize, result: &InteractionResult) {
    let diagnostics = &result.diagnostics;
    let detail = format!(
        "[{} attempt(s), {} rotation(s), {}ms]",
        diagnostics.attempts.len(),
        diagnostics.rotations,
        diagnostics.elapsed_ms
    );

    match &result.outcome {
        InteractionOutcome::Completed { strategy } => println!(
            "   {} {:>2}. {} completed via {} {}",
            "✓".green(),
            index,
            diagnostics.location,
            strategy.to_string().bold(),
            detail.dimmed()
        ),
        InteractionOutcome::Exhausted {
            tried_strategies,
            reason,
        } => {
            let tried: Vec<&str> = tried_strategies.iter().map(|s| s.name()).collect();
            println!(
                "   {} {:>2}. {} {} {}",
                "✗".red(),
                index,
                diagnostics.location,
                reason.to_string().red(),
                detail.dimmed()
            );
            if !tried.is_empty() {
                println!("         tried: {}", tried.join(", "));
            }
            for suggestion in &diagnostics.suggestions {
                println!("         - {}", suggestion);
            }
        }
        InteractionOutcome::Cancelled => println!(
            "   {} {:>2}. {} cancelled",
            "!".yellow(),
            index,
            diagnostics.location
        ),
    }
}
