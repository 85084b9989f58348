//! Command-line argument parsing for tlc-athena.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{env_lookup, Config, ENV_CONFIG_PATH};

/// NYC TLC Athena query tools for agent hosts.
#[derive(Parser, Debug)]
#[command(name = "tlc-athena")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path [env: TLC_ATHENA_CONFIG, also read from the env file]
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "PATH", global = true)]
    pub env_file: Option<PathBuf>,

    /// Write logs to the state directory instead of stderr
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Serve list_tables, describe_table and run_query over MCP stdio
    Serve,
    /// Check configuration, credentials, connectivity and table visibility
    Diagnose,
    /// Print the schema catalog as given to the model
    Schema,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run; `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    /// Returns the config file path to use.
    ///
    /// Order: --config, then `TLC_ATHENA_CONFIG`, then the default path.
    /// Call this only after the env file is loaded.
    pub fn config_path(&self) -> PathBuf {
        self.config_path_with(env_lookup)
    }

    /// [`Cli::config_path`] with an explicit environment lookup.
    pub fn config_path_with<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        self.config
            .clone()
            .or_else(|| lookup(ENV_CONFIG_PATH).map(PathBuf::from))
            .unwrap_or_else(Config::default_path)
    }
}
