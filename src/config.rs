//! Configuration management for querygate.
//!
//! Handles loading configuration from TOML files and environment variables:
//! the engine endpoint, per-request defaults (database, workgroup, wait),
//! and the result/statement limits.

use crate::error::{GatewayError, Result};
use crate::format::ResultLimits;
use crate::validate::DEFAULT_MAX_STATEMENT_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Engine binding configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-request defaults applied by the gateway.
    #[serde(default)]
    pub defaults: QueryDefaults,

    /// Result and statement limits.
    #[serde(default)]
    pub limits: Limits,
}

/// Engine endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Base URL of the engine API.
    pub endpoint: Option<String>,

    /// Bearer token for the engine API (prefer the QUERYGATE_API_TOKEN
    /// environment variable over storing this in the file).
    pub api_token: Option<String>,
}

/// Defaults applied to requests that omit the corresponding field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Database queried when the request names none.
    #[serde(default = "default_database")]
    pub database: String,

    /// Workgroup (execution pool) used when the request names none.
    #[serde(default = "default_workgroup")]
    pub workgroup: String,

    /// Wait applied when the request names none, in seconds.
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: u64,

    /// Ceiling on any requested wait, in seconds.
    #[serde(default = "default_wait_ceiling_seconds")]
    pub wait_ceiling_seconds: u64,
}

fn default_database() -> String {
    "default".to_string()
}

fn default_workgroup() -> String {
    "primary".to_string()
}

fn default_max_wait_seconds() -> u64 {
    25
}

fn default_wait_ceiling_seconds() -> u64 {
    120
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            database: default_database(),
            workgroup: default_workgroup(),
            max_wait_seconds: default_max_wait_seconds(),
            wait_ceiling_seconds: default_wait_ceiling_seconds(),
        }
    }
}

/// Result and statement limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Limits {
    /// Row/payload caps applied by the formatter.
    #[serde(flatten)]
    pub result: ResultLimits,

    /// Maximum statement length accepted by the validator, in bytes.
    #[serde(default = "default_max_statement_bytes")]
    pub max_statement_bytes: usize,
}

fn default_max_statement_bytes() -> usize {
    DEFAULT_MAX_STATEMENT_BYTES
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            result: ResultLimits::default(),
            max_statement_bytes: DEFAULT_MAX_STATEMENT_BYTES,
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("querygate")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields the
    /// defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            GatewayError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variables as defaults for unset fields.
    ///
    /// Recognized: QUERYGATE_ENDPOINT, QUERYGATE_API_TOKEN,
    /// QUERYGATE_DATABASE, QUERYGATE_WORKGROUP.
    pub fn apply_env_defaults(&mut self) {
        if self.engine.endpoint.is_none() {
            self.engine.endpoint = std::env::var("QUERYGATE_ENDPOINT").ok();
        }
        if self.engine.api_token.is_none() {
            self.engine.api_token = std::env::var("QUERYGATE_API_TOKEN").ok();
        }
        if self.defaults.database == default_database() {
            if let Ok(db) = std::env::var("QUERYGATE_DATABASE") {
                self.defaults.database = db;
            }
        }
        if self.defaults.workgroup == default_workgroup() {
            if let Ok(wg) = std::env::var("QUERYGATE_WORKGROUP") {
                self.defaults.workgroup = wg;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.defaults.max_wait_seconds == 0 {
            return Err(GatewayError::config("max_wait_seconds must be positive"));
        }
        if self.defaults.max_wait_seconds > self.defaults.wait_ceiling_seconds {
            return Err(GatewayError::config(format!(
                "max_wait_seconds ({}) exceeds wait_ceiling_seconds ({})",
                self.defaults.max_wait_seconds, self.defaults.wait_ceiling_seconds
            )));
        }
        if self.limits.max_statement_bytes == 0 {
            return Err(GatewayError::config("max_statement_bytes must be positive"));
        }
        Ok(())
    }
}
