//! Command-line front end for the queueing simulation.
//!
//! Chooses a preset (bank or grocery), layers an optional TOML file of
//! overrides on top, and hands the result to the `des` engine.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use des::{ConfigError, MillisRange, SimulationConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The two deployments the engine ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Two tellers sharing one line
    Bank,
    /// Three counters, one line each
    Grocery,
}

impl Preset {
    pub fn config(self) -> SimulationConfig {
        match self {
            Preset::Bank => SimulationConfig::bank(),
            Preset::Grocery => SimulationConfig::grocery(),
        }
    }
}

/// Queueing simulation
///
/// Runs arrivals and servers on real threads for the given number of
/// simulated minutes, then prints a summary.
#[derive(Parser, Debug)]
#[command(name = "simple_queue")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Simulation duration in minutes
    pub minutes: u64,

    /// Which deployment to simulate
    #[arg(short, long, value_enum, default_value = "grocery")]
    pub preset: Preset,

    /// TOML file overriding preset values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of independent replications to run concurrently
    #[arg(short, long, default_value = "1")]
    pub replications: usize,
}

/// Subset of `SimulationConfig` a TOML file may set. Anything left out keeps
/// the preset's value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub servers: Option<usize>,
    pub lines: Option<usize>,
    pub capacity: Option<usize>,
    pub minute_ms: Option<u64>,
    pub arrival_interval_ms: Option<MillisRange>,
    pub service_ms: Option<MillisRange>,
    pub retry_wait_ms: Option<u64>,
    pub poll_timeout_ms: Option<u64>,
    pub grace_period_ms: Option<u64>,
}

impl ConfigOverrides {
    pub fn from_toml(text: &str, path: &Path) -> Result<ConfigOverrides, CliError> {
        toml::from_str(text).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<ConfigOverrides, CliError> {
        let text = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ConfigOverrides::from_toml(&text, path)
    }

    pub fn apply(&self, mut config: SimulationConfig) -> SimulationConfig {
        config.servers = self.servers.unwrap_or(config.servers);
        config.lines = self.lines.unwrap_or(config.lines);
        config.capacity = self.capacity.unwrap_or(config.capacity);
        config.minute_ms = self.minute_ms.unwrap_or(config.minute_ms);
        config.arrival_interval_ms = self.arrival_interval_ms.unwrap_or(config.arrival_interval_ms);
        config.service_ms = self.service_ms.unwrap_or(config.service_ms);
        config.retry_wait_ms = self.retry_wait_ms.unwrap_or(config.retry_wait_ms);
        config.poll_timeout_ms = self.poll_timeout_ms.unwrap_or(config.poll_timeout_ms);
        config.grace_period_ms = self.grace_period_ms.unwrap_or(config.grace_period_ms);
        config
    }
}

/// Resolve the final configuration for `args` and check it.
pub fn build_config(args: &Args) -> Result<SimulationConfig, CliError> {
    let mut config = args.preset.config().with_minutes(args.minutes);
    if let Some(path) = &args.config {
        config = ConfigOverrides::load(path)?.apply(config);
    }
    config.validate()?;
    Ok(config)
}
