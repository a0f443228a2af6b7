//! Node configuration: a TOML file with environment overrides.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    variant_size_differences
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ibft_core_types::LinearTimeouts;

/// Prefix of the environment variables that override the configuration file.
pub const DEFAULT_ENV_PREFIX: &str = "IBFT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("consensus.future_round_tolerance must be at least 1")]
    ZeroFutureRoundTolerance,

    #[error("consensus.queue_capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("timeouts.round_timeout must be greater than zero")]
    ZeroRoundTimeout,

    #[error("timeouts.max_round_timeout ({max:?}) is shorter than timeouts.round_timeout ({round:?})")]
    MaxRoundTimeoutTooShort { round: Duration, max: Duration },
}

/// Node configuration options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// A custom human-readable name for this node
    #[serde(default = "default_moniker")]
    pub moniker: String,

    /// Consensus configuration options
    #[serde(default)]
    pub consensus: ConsensusConfig,

    /// Round timer configuration options
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Log configuration options
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration options
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// In-process committee run by the `start` command
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_moniker() -> String {
    "dvnode".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            moniker: default_moniker(),
            consensus: ConsensusConfig::default(),
            timeouts: TimeoutConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.consensus.validate()?;
        self.timeouts.validate()
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration to `path` as TOML, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

/// Load the configuration file at `path`, apply the environment overrides and validate the result.
///
/// Overrides are read from variables named `{PREFIX}__{SECTION}__{KEY}`,
/// eg. `IBFT__CONSENSUS__FUTURE_ROUND_TOLERANCE=3`.
pub fn load_config(path: impl AsRef<Path>, env_prefix: Option<&str>) -> Result<Config, ConfigError> {
    let config: Config = ::config::Config::builder()
        .add_source(::config::File::from(path.as_ref()))
        .add_source(
            ::config::Environment::with_prefix(env_prefix.unwrap_or(DEFAULT_ENV_PREFIX))
                .separator("__"),
        )
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// How many rounds ahead of the current one messages are kept
    #[serde(default = "default_future_round_tolerance")]
    pub future_round_tolerance: u64,

    /// Capacity of the ingress queue of the consensus engine
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_future_round_tolerance() -> u64 {
    2
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            future_round_tolerance: default_future_round_tolerance(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl ConsensusConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.future_round_tolerance == 0 {
            return Err(ConfigError::ZeroFutureRoundTolerance);
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }

        Ok(())
    }
}

/// Round timers
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long the first round lasts before a round change is requested
    #[serde(with = "humantime_serde")]
    pub round_timeout: Duration,

    /// How much the round timeout increases with each round
    #[serde(with = "humantime_serde")]
    pub round_timeout_delta: Duration,

    /// Upper bound on any round timeout
    #[serde(with = "humantime_serde")]
    pub max_round_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from(LinearTimeouts::default())
    }
}

impl TimeoutConfig {
    pub fn linear(&self) -> LinearTimeouts {
        LinearTimeouts {
            round_timeout: self.round_timeout,
            round_timeout_delta: self.round_timeout_delta,
            max_round_timeout: self.max_round_timeout,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.round_timeout.is_zero() {
            return Err(ConfigError::ZeroRoundTimeout);
        }

        if self.max_round_timeout < self.round_timeout {
            return Err(ConfigError::MaxRoundTimeoutTooShort {
                round: self.round_timeout,
                max: self.max_round_timeout,
            });
        }

        Ok(())
    }
}

impl From<LinearTimeouts> for TimeoutConfig {
    fn from(timeouts: LinearTimeouts) -> Self {
        Self {
            round_timeout: timeouts.round_timeout,
            round_timeout_delta: timeouts.round_timeout_delta,
            max_round_timeout: timeouts.max_round_timeout,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            e => Err(format!("Invalid log level: {e}")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plaintext" => Ok(LogFormat::Plaintext),
            "json" => Ok(LogFormat::Json),
            e => Err(format!("Invalid log format: {e}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Plaintext => f.write_str("plaintext"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the metrics server
    #[serde(default)]
    pub enabled: bool,

    /// Address at which to serve the metrics at
    #[serde(default = "default_metrics_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_metrics_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9000)
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_listen_addr(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Committee size
    #[serde(default = "default_operators")]
    pub operators: usize,

    /// Number of consecutive heights to run
    #[serde(default = "default_heights")]
    pub heights: u64,

    /// Indices of the operators that never send or receive anything
    #[serde(default)]
    pub silent: Vec<usize>,
}

fn default_operators() -> usize {
    4
}

fn default_heights() -> u64 {
    3
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            operators: default_operators(),
            heights: default_heights(),
            silent: Vec::new(),
        }
    }
}
