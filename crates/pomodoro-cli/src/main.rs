//! Pomodoro break dialog CLI
//!
//! Drives the break dialog against a simulated desktop. Provides:
//! - `replay`: run a scenario file on a virtual or real-time clock
//! - `config`: show the effective configuration
//! - `check-config`: validate a configuration file

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pomodoro_core::config::{Config, DialogConfig, Directories};
use pomodoro_core::runtime::LocalScheduler;
use pomodoro_core::scenario::{LoggedEvent, Replay, Scenario, Summary, run_virtual};
use pomodoro_core::{DialogEvent, DialogState};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Pomodoro break dialog CLI
#[derive(Parser)]
#[command(name = "pomodoro-dialog")]
#[command(about = "Replay break dialog sessions against a simulated desktop")]
#[command(version)]
#[command(after_help = "\
Examples:
  pomodoro-dialog replay demos/break-session.json
  pomodoro-dialog replay demos/stubborn-grab.json --json
  pomodoro-dialog replay demos/break-session.json --realtime
  pomodoro-dialog config                Print the effective configuration
  pomodoro-dialog config --path         Print where the configuration lives
  pomodoro-dialog check-config my.json  Validate a configuration file
")]
struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file and print the dialog's lifecycle events
    Replay {
        /// Scenario file (JSON)
        file: PathBuf,

        /// Run on the wall clock instead of a virtual one
        #[arg(long)]
        realtime: bool,

        /// Print events and summary as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Print the configuration file path instead
        #[arg(long)]
        path: bool,
    },

    /// Load and validate a configuration file
    CheckConfig {
        /// File to check (defaults to the configuration file in use)
        file: Option<PathBuf>,
    },
}

/// Set up logging with file output for debugging.
/// In debug builds, defaults to debug level and logs to a timestamped file.
/// In release builds, defaults to info level. Logs always go to stderr so
/// stdout stays machine-readable.
fn setup_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pomodoro={default_level}")));

    if cfg!(debug_assertions) {
        let temp_dir = std::env::temp_dir();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("pomodoro-dialog-{timestamp}.log");
        let log_path = temp_dir.join(&log_filename);

        #[cfg(unix)]
        {
            let symlink_path = temp_dir.join("pomodoro-dialog.log");
            let _ = std::fs::remove_file(&symlink_path);
            let _ = std::os::unix::fs::symlink(&log_path, &symlink_path);
        }

        let file_appender = tracing_appender::rolling::never(&temp_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true);

        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .with(filter)
            .init();

        eprintln!("Logging to: {} (and stderr)", log_path.display());
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

fn config_path(cli_path: Option<&Path>) -> PathBuf {
    cli_path.map_or_else(|| Directories::new().config_file, Path::to_path_buf)
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn describe(event: &DialogEvent) -> String {
    match event {
        DialogEvent::StateChanged { state } => format!("state -> {state}"),
        other => other.name().to_string(),
    }
}

fn print_event(entry: &LoggedEvent, json: bool) {
    if json {
        match serde_json::to_string(entry) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Failed to encode event: {e}"),
        }
    } else {
        println!("{:>8}ms  {}", entry.at_ms, describe(&entry.event));
    }
}

fn print_summary(summary: &Summary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }

    println!();
    println!("Final state:   {}", summary.final_state);
    println!("Modal grab:    {}", if summary.has_modal { "held" } else { "released" });
    println!(
        "Grab attempts: {} ({} released)",
        summary.grab_attempts, summary.grab_releases
    );
    println!("Events:        {}", summary.events);
    println!("Elapsed:       {}ms", summary.elapsed_ms);
    if summary.destroyed {
        println!("Dialog was destroyed");
    }
    Ok(())
}

fn replay_realtime(scenario: &Scenario, config: DialogConfig, json: bool) -> Result<Summary> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start tokio runtime")?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, async move {
        let scheduler = Rc::new(LocalScheduler::new());
        let replay = Replay::new(scenario, scheduler, config, move |entry| {
            print_event(entry, json);
        })?;

        let start = tokio::time::Instant::now();
        for step in &scenario.steps {
            tokio::time::sleep_until(start + Duration::from_millis(step.at_ms)).await;
            replay.apply(&step.action);
        }
        tokio::time::sleep(Duration::from_millis(scenario.settle_ms)).await;

        Ok::<_, anyhow::Error>(replay.summary())
    })
}

fn cmd_replay(file: &Path, config: &DialogConfig, realtime: bool, json: bool) -> Result<()> {
    let scenario = Scenario::load(file)
        .with_context(|| format!("Failed to load scenario {}", file.display()))?;
    let effective = scenario.effective_config(config);

    if let Some(name) = &scenario.name {
        info!("Replaying scenario: {name}");
    }
    debug!(
        steps = scenario.steps.len(),
        duration_ms = u64::try_from(scenario.duration().as_millis()).unwrap_or(u64::MAX),
        realtime,
        "Starting replay"
    );

    let summary = if realtime {
        replay_realtime(&scenario, effective, json)?
    } else {
        run_virtual(&scenario, &effective, move |entry| print_event(entry, json))?
    };

    print_summary(&summary, json)?;
    if summary.final_state == DialogState::Opening || summary.final_state == DialogState::Closing {
        bail!(
            "Scenario ended mid-transition ({}); increase settleMs",
            summary.final_state
        );
    }
    Ok(())
}

fn cmd_config(path: &Path, show_path: bool) -> Result<()> {
    if show_path {
        println!("{}", path.display());
        return Ok(());
    }

    let config = load_config(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_check_config(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }

    load_config(path)?;
    println!("{} is valid", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging();

    let path = config_path(cli.config.as_deref());

    match cli.command {
        Commands::Replay {
            file,
            realtime,
            json,
        } => {
            let config = load_config(&path)?;
            cmd_replay(&file, &config.dialog, realtime, json)
        }
        Commands::Config { path: show_path } => cmd_config(&path, show_path),
        Commands::CheckConfig { file } => cmd_check_config(file.as_deref().unwrap_or(&path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_replay_flags() {
        let cli = Cli::try_parse_from([
            "pomodoro-dialog",
            "replay",
            "session.json",
            "--realtime",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Replay {
                file,
                realtime,
                json,
            } => {
                assert_eq!(file, PathBuf::from("session.json"));
                assert!(realtime);
                assert!(json);
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["pomodoro-dialog", "config", "--config", "/tmp/c.json"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(
            config_path(cli.config.as_deref()),
            PathBuf::from("/tmp/c.json")
        );
    }

    #[test]
    fn describe_names_state_changes() {
        let event = DialogEvent::StateChanged {
            state: DialogState::Opened,
        };
        assert_eq!(describe(&event), "state -> opened");
        assert_eq!(describe(&DialogEvent::Closing), "closing");
    }

    #[test]
    fn check_config_rejects_missing_file() {
        let err = cmd_check_config(Path::new("/nonexistent/pomodoro.json")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
