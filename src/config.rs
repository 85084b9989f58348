//! Configuration management for tlc-athena.
//!
//! Settings come from an optional TOML file, with environment variables
//! filling anything the file leaves unset. Everything is read once at
//! startup and never reloaded.

use crate::catalog::{Catalog, TableSchema};
use crate::error::{Result, TlcError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const ENV_DATABASE: &str = "ATHENA_DATABASE";
pub const ENV_OUTPUT_LOCATION: &str = "ATHENA_OUTPUT_LOCATION";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_WORK_GROUP: &str = "ATHENA_WORKGROUP";
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const ENV_MAX_ROWS: &str = "TLC_MAX_ROWS";
pub const ENV_POLL_INTERVAL_MS: &str = "TLC_POLL_INTERVAL_MS";
pub const ENV_MAX_WAIT_SECS: &str = "TLC_MAX_WAIT_SECS";
pub const ENV_CONFIG_PATH: &str = "TLC_ATHENA_CONFIG";

/// Reads a process environment variable, treating blank values as unset.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Main configuration structure, as read from the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Managed query service settings.
    #[serde(default)]
    pub athena: AthenaConfig,

    /// Execution and response limits.
    #[serde(default)]
    pub query: QueryConfig,

    /// Replaces the built-in catalog when non-empty.
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

/// Athena settings as they appear in the config file. All optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AthenaConfig {
    pub database: Option<String>,
    pub output_location: Option<String>,
    pub region: Option<String>,
    pub work_group: Option<String>,
}

/// Execution and response limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum rows returned to the host per query.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Delay between status polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for a terminal state after this long.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

fn default_max_rows() -> usize {
    100
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_wait_secs() -> u64 {
    60
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl QueryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    /// Overrides limits from `TLC_*` variables that are set.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_MAX_ROWS) {
            self.max_rows = parse_number(ENV_MAX_ROWS, &v)?;
        }
        if let Some(v) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_number(ENV_POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_WAIT_SECS) {
            self.max_wait_secs = parse_number(ENV_MAX_WAIT_SECS, &v)?;
        }
        self.validate()
    }

    /// Rejects limits that would disable the row cap or the poll delay.
    pub fn validate(&self) -> Result<()> {
        if self.max_rows == 0 {
            return Err(TlcError::config("max_rows must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(TlcError::config("poll_interval_ms must be at least 1"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TlcError::config(format!("{var} must be a non-negative integer, got '{value}'")))
}

/// An explicit access key pair. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Fully resolved connection settings for the managed query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthenaSettings {
    pub database: String,
    pub output_location: String,
    pub region: String,
    pub work_group: Option<String>,
    /// `None` defers to the AWS default credential chain.
    pub credentials: Option<CredentialPair>,
}

impl AthenaSettings {
    /// Resolves settings from the file config and the process environment.
    pub fn from_env(file: &AthenaConfig) -> Result<Self> {
        Self::resolve(file, env_lookup)
    }

    /// Resolves settings from the file config, filling gaps with `lookup`.
    ///
    /// Every missing required value is reported in one `ConfigMissing`.
    pub fn resolve<F>(file: &AthenaConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |value: &Option<String>, var: &str| value.clone().or_else(|| lookup(var));

        let database = pick(&file.database, ENV_DATABASE);
        let output_location = pick(&file.output_location, ENV_OUTPUT_LOCATION);
        let region = pick(&file.region, ENV_REGION);
        let work_group = pick(&file.work_group, ENV_WORK_GROUP);

        let mut missing = Vec::new();
        if database.is_none() {
            missing.push(ENV_DATABASE.to_string());
        }
        if output_location.is_none() {
            missing.push(ENV_OUTPUT_LOCATION.to_string());
        }
        if region.is_none() {
            missing.push(ENV_REGION.to_string());
        }

        let credentials = match (lookup(ENV_ACCESS_KEY_ID), lookup(ENV_SECRET_ACCESS_KEY)) {
            (Some(access_key_id), Some(secret_access_key)) => Some(CredentialPair {
                access_key_id,
                secret_access_key,
                session_token: lookup(ENV_SESSION_TOKEN),
            }),
            (None, None) => None,
            (Some(_), None) => {
                missing.push(ENV_SECRET_ACCESS_KEY.to_string());
                None
            }
            (None, Some(_)) => {
                missing.push(ENV_ACCESS_KEY_ID.to_string());
                None
            }
        };

        match (database, output_location, region) {
            (Some(database), Some(output_location), Some(region)) if missing.is_empty() => {
                validate_output_location(&output_location)?;
                Ok(Self {
                    database,
                    output_location,
                    region,
                    work_group,
                    credentials,
                })
            }
            _ => Err(TlcError::ConfigMissing(missing)),
        }
    }

    /// Returns a display-safe summary (no secrets) for logs.
    pub fn display_string(&self) -> String {
        let auth = if self.credentials.is_some() {
            "explicit credentials"
        } else {
            "default credential chain"
        };
        format!(
            "{} @ {} (results: {}, {})",
            self.database, self.region, self.output_location, auth
        )
    }
}

fn validate_output_location(location: &str) -> Result<()> {
    let url = Url::parse(location)
        .map_err(|e| TlcError::config(format!("Invalid output location '{location}': {e}")))?;
    if url.scheme() != "s3" {
        return Err(TlcError::config(format!(
            "Invalid output location scheme '{}'. Expected 's3'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(TlcError::config(format!(
            "Output location '{location}' has no bucket"
        )));
    }
    Ok(())
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tlc-athena")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TlcError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Loads the file and applies `TLC_*` limit overrides from `lookup`.
    pub fn load<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_from_file(path)?;
        config.query.apply_env_overrides(lookup)?;
        Ok(config)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            TlcError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds the catalog: file tables if any, the built-in catalog otherwise.
    pub fn catalog(&self) -> Result<Catalog> {
        if self.tables.is_empty() {
            Ok(Catalog::nyc_tlc())
        } else {
            Catalog::new(self.tables.clone())
        }
    }
}
