//! CLI module for floorwatch
//!
//! Command-line front end that drives the library against a live backend.
//!
//! # Commands
//!
//! - `watch` - Follow the live event stream
//! - `whoami` - Look up the current user
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Follow events from the configured backend
//! floorwatch watch
//!
//! # Stop after five messages, one JSON line each
//! floorwatch watch --json --limit 5
//!
//! # Check who the stored token belongs to
//! floorwatch whoami --token "$TOKEN"
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod watch;
pub mod whoami;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::FloorwatchConfig;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// floorwatch - live factory-floor monitor
#[derive(Parser, Debug)]
#[command(
    name = "floorwatch",
    version,
    about = "Live event stream monitor and identity lookup for factory-floor dashboards"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the live event stream
    Watch(WatchArgs),
    /// Show the user the stored token belongs to
    Whoami(WhoamiArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "floorwatch.toml")]
    pub config: PathBuf,

    /// Stream URL (defaults to the configured backend's stream path)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Print one JSON object per event
    #[arg(long)]
    pub json: bool,

    /// Exit after this many messages
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FLOORWATCH_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "floorwatch.toml")]
    pub config: PathBuf,

    /// Bearer token (defaults to the configured token storage)
    #[arg(short, long, env = "FLOORWATCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Bypass the cache
    #[arg(short, long)]
    pub force: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Abort the lookup after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FLOORWATCH_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "floorwatch.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load the config file (defaults when it is missing) and apply env overrides.
pub fn load_config(path: &Path) -> Result<FloorwatchConfig, Box<dyn std::error::Error>> {
    let config = if path.exists() {
        FloorwatchConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        FloorwatchConfig::default()
    };

    Ok(config.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_watch_defaults() {
        let cli = Cli::try_parse_from(["floorwatch", "watch"]).unwrap();
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.config, PathBuf::from("floorwatch.toml"));
                assert!(args.url.is_none());
                assert!(!args.json);
                assert!(args.limit.is_none());
            }
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_cli_parse_watch_with_args() {
        let cli = Cli::try_parse_from([
            "floorwatch",
            "watch",
            "--url",
            "http://plant:3001/api/events",
            "--json",
            "-n",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.url.as_deref(), Some("http://plant:3001/api/events"));
                assert!(args.json);
                assert_eq!(args.limit, Some(3));
            }
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_cli_parse_whoami() {
        let cli = Cli::try_parse_from([
            "floorwatch",
            "whoami",
            "--token",
            "abc",
            "--force",
            "--timeout-ms",
            "250",
        ])
        .unwrap();
        match cli.command {
            Commands::Whoami(args) => {
                assert_eq!(args.token.as_deref(), Some("abc"));
                assert!(args.force);
                assert_eq!(args.timeout_ms, Some(250));
            }
            _ => panic!("Expected Whoami command"),
        }
    }

    #[test]
    fn test_cli_parse_config_init() {
        let cli =
            Cli::try_parse_from(["floorwatch", "config", "init", "-o", "plant.toml"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => {
                assert_eq!(args.output, PathBuf::from("plant.toml"));
                assert!(!args.force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["floorwatch", "serve"]).is_err());
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/floorwatch.toml")).unwrap();
        assert_eq!(config.backend.port, crate::config::DEFAULT_BACKEND_PORT);
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("floorwatch.toml");
        std::fs::write(&path, "[stream]\nbase_delay_ms = 500\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.stream.base_delay_ms, 500);
    }
}
