use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blinkwatch_core::{BlinkLivenessTracker, TrackerConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod replay;

#[derive(Parser)]
#[command(name = "blinkwatch", version, about = "Blink counting and photo-spoof liveness check")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay JSON-lines face observations through the tracker
    Replay {
        /// Input file (defaults to stdin)
        #[arg(long)]
        input: Option<PathBuf>,
        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report each track's liveness alert only once
        #[arg(long)]
        alert_once: bool,
        /// Override the idle eviction window in milliseconds
        #[arg(long)]
        idle_ms: Option<i64>,
    },
    /// Print the effective configuration as TOML
    Config {
        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            input,
            config,
            alert_once,
            idle_ms,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(idle_ms) = idle_ms {
                config.track_idle_eviction_millis = idle_ms;
                config.validate()?;
            }
            tracing::debug!(?config, "effective config");

            let mut tracker = BlinkLivenessTracker::new(config);
            let options = replay::ReplayOptions { alert_once };
            let stdout = io::stdout();
            let stderr = io::stderr();

            let summary = match input {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("failed to open {}", path.display()))?;
                    replay::run(
                        BufReader::new(file),
                        &mut stdout.lock(),
                        &mut stderr.lock(),
                        &mut tracker,
                        options,
                    )?
                }
                None => replay::run(
                    io::stdin().lock(),
                    &mut stdout.lock(),
                    &mut stderr.lock(),
                    &mut tracker,
                    options,
                )?,
            };

            eprintln!(
                "replayed {} frame(s): {} result(s), {} active track(s), {} alert(s)",
                summary.frames,
                summary.results,
                tracker.len(),
                summary.alerts
            );
        }
        Command::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

/// File config (or defaults) with `BLINKWATCH_*` environment overrides applied.
fn load_config(path: Option<&Path>) -> Result<TrackerConfig> {
    let config = match path {
        Some(path) => TrackerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TrackerConfig::default(),
    };
    let config = config.with_env_overrides();
    config.validate().context("invalid configuration")?;
    Ok(config)
}
