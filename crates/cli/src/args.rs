//! Command-line parameters
//!
//! The node reads its configuration from `<HOME>/config/config.toml`, or from the file given
//! with `--config`. Logging can be overridden on the command-line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ibft_config::{LogFormat, LogLevel};

const APP_FOLDER: &str = ".dvnode";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.toml";

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Home directory
    #[arg(long, global = true, value_name = "HOME_DIR", env = "IBFT_HOME", default_value = APP_FOLDER)]
    pub home: PathBuf,

    /// Configuration file, defaults to `<HOME>/config/config.toml`
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(long, global = true, value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,

    /// Log format, overrides the configuration file
    #[arg(long, global = true, value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        overwrite: bool,
    },

    /// Run an in-process committee for the configured number of heights
    Start,
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    s.parse()
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse()
}

impl Args {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn config_file(&self) -> PathBuf {
        match &self.config {
            Some(path) => path.clone(),
            None => self.home.join(CONFIG_DIR).join(CONFIG_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_defaults_to_the_home_directory() {
        let args = Args::parse_from(["dvnode-ibft", "--home", "/tmp/op", "start"]);

        assert_eq!(args.command, Commands::Start);
        assert_eq!(args.config_file(), PathBuf::from("/tmp/op/config/config.toml"));
    }

    #[test]
    fn explicit_config_and_log_overrides() {
        let args = Args::parse_from([
            "dvnode-ibft",
            "init",
            "--overwrite",
            "--config",
            "node.toml",
            "--log-level",
            "warn",
            "--log-format",
            "json",
        ]);

        assert_eq!(args.command, Commands::Init { overwrite: true });
        assert_eq!(args.config_file(), PathBuf::from("node.toml"));
        assert_eq!(args.log_level, Some(LogLevel::Warn));
        assert_eq!(args.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn invalid_log_level_is_refused() {
        let result = Args::try_parse_from(["dvnode-ibft", "--log-level", "loud", "start"]);
        assert!(result.is_err());
    }
}
