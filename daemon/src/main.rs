//! Election daemon: loads configuration, builds a node, and replays operation
//! scripts against it.

mod script;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use elect_node::{init_logging, ElectionConfig, ElectionNode};
use elect_nullables::NullClock;
use elect_types::SystemClock;

#[derive(Parser)]
#[command(name = "elect-daemon", about = "Election lifecycle and vote-integrity engine")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; flags and
    /// env vars override them.
    #[arg(long, env = "ELECT_CONFIG")]
    config: Option<PathBuf>,

    /// Commission address (0x + 40 hex digits).
    #[arg(long, env = "ELECT_COMMISSION")]
    commission: Option<String>,

    /// Election name.
    #[arg(long, env = "ELECT_NAME")]
    name: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ELECT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ELECT_LOG_FORMAT")]
    log_format: Option<String>,

    /// Collect Prometheus metrics and print them after a replay.
    #[arg(long, env = "ELECT_ENABLE_METRICS")]
    metrics: bool,

    /// Snapshot file: resumed from if present, written after a replay.
    #[arg(long, env = "ELECT_STATE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a JSON operation script and print one JSON report per step.
    Replay {
        /// Script file: a JSON array of operations.
        script: PathBuf,

        /// Use wall-clock time and ignore each step's `at`.
        #[arg(long)]
        wall_clock: bool,

        /// Initial replay time in seconds (ignored with --wall-clock). A resumed
        /// election starts no earlier than its latest recorded time.
        #[arg(long, default_value_t = 0)]
        start: u64,
    },
    /// Print the effective configuration as TOML.
    ConfigTemplate,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<ElectionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_str().context("config path is not valid UTF-8")?;
                ElectionConfig::from_toml_file(path)?
            }
            None => ElectionConfig::default(),
        };
        if let Some(commission) = &self.commission {
            config.commission = commission.clone();
        }
        if let Some(name) = &self.name {
            config.election_name = name.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if self.metrics {
            config.enable_metrics = true;
        }
        if let Some(state) = &self.state {
            config.snapshot_path = Some(state.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Command::ConfigTemplate => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Replay {
            script,
            wall_clock,
            start,
        } => {
            init_logging(config.parsed_log_format()?, &config.log_level)?;
            run_replay(&config, &script, wall_clock, start).await
        }
    }
}

async fn run_replay(config: &ElectionConfig, script: &Path, wall_clock: bool, start: u64) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("reading script {}", script.display()))?;
    let steps = script::parse(&contents).with_context(|| format!("parsing script {}", script.display()))?;

    let replay_clock = Arc::new(NullClock::new(start));
    let clock: Arc<dyn elect_types::Clock> = if wall_clock {
        Arc::new(SystemClock::new())
    } else {
        replay_clock.clone()
    };

    let node = match &config.snapshot_path {
        Some(path) if path.exists() => ElectionNode::restore(config, path, clock)?,
        _ => ElectionNode::new(config, clock)?,
    };
    if !wall_clock {
        script::resume_clock(&node, &replay_clock);
    }
    tracing::info!(
        election = %config.election_name,
        steps = steps.len(),
        wall_clock,
        start = %node.now(),
        "replaying script"
    );

    let driver = if wall_clock { None } else { Some(replay_clock.as_ref()) };
    let reports = script::replay(&node, driver, steps).await;
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }
    tracing::info!(total = reports.len(), failed, "replay finished");

    if let Some(path) = &config.snapshot_path {
        node.save_snapshot(path).await?;
    }
    if let Some(metrics) = node.metrics() {
        eprint!("{}", metrics.encode()?);
    }
    Ok(())
}
