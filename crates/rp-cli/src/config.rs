//! Config file loading and resolution of the effective settings.
//!
//! Precedence, highest first: command-line flags and their environment
//! variables, the config file, built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use rp_register::{ControlPlane, Context, Registrar, RetryPolicy};
use rp_ucp::{ClientOptions, DEFAULT_ENDPOINT, DEFAULT_POLL_INTERVAL, UcpClient};

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::output;

pub const DEFAULT_PLANE: &str = "local";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub endpoint: Option<String>,
    pub plane: Option<String>,
    pub timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub retry: RetryPolicy,
}

impl Config {
    /// Load `explicit`, or the default config file when it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `<config dir>/rpreg/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rpreg").join("config.toml"))
}

/// The settings a command runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub plane: String,
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: Config) -> Result<Self> {
        let retry = config.retry;
        retry.validate().map_err(|e| CliError::user(e.to_string()))?;
        Ok(Self {
            endpoint: cli
                .endpoint
                .clone()
                .or(config.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            plane: cli
                .plane
                .clone()
                .or(config.plane)
                .unwrap_or_else(|| DEFAULT_PLANE.to_string()),
            timeout: cli.timeout.or(config.timeout_secs).map(Duration::from_secs),
            poll_interval: config
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            retry,
        })
    }

    pub fn client(&self) -> Result<UcpClient> {
        let options = ClientOptions::new(&self.endpoint).with_poll_interval(self.poll_interval);
        Ok(UcpClient::new(options)?)
    }

    /// A registrar on `client` that prints progress to stdout.
    pub fn registrar<C: ControlPlane>(&self, client: C) -> Registrar<C> {
        Registrar::new(client, &self.plane)
            .with_retry_policy(self.retry)
            .with_progress(output::print_progress)
    }

    /// A fresh context bounded by the configured timeout.
    pub fn context(&self) -> Context {
        match self.timeout {
            Some(timeout) => Context::new().with_timeout(timeout),
            None => Context::new(),
        }
    }
}
