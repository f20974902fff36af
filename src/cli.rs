//! Command-line argument parsing for querygate.

use clap::Parser;
use std::path::PathBuf;

use querygate::config::Config;

/// A guarded, read-only SQL execution gateway.
#[derive(Parser, Debug)]
#[command(name = "querygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL statement to execute (omit when using --json)
    #[arg(value_name = "SQL")]
    pub sql: Option<String>,

    /// Target database (overrides the configured default)
    #[arg(short, long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Workgroup / execution pool (overrides the configured default)
    #[arg(short, long, value_name = "WORKGROUP")]
    pub workgroup: Option<String>,

    /// Maximum seconds to wait for completion (capped by configuration)
    #[arg(long, value_name = "SECONDS")]
    pub max_wait_seconds: Option<u64>,

    /// Read a full JSON request object from stdin instead of arguments
    #[arg(long)]
    pub json: bool,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Engine endpoint URL (overrides config)
    #[arg(long, value_name = "URL", env = "QUERYGATE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Use an in-memory mock engine (for testing and demos)
    #[arg(long)]
    pub mock_engine: bool,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path, explicit or platform default.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_sql() {
        let cli = Cli::parse_from(["querygate", "SELECT 1", "-d", "bnb", "-w", "analytics"]);
        assert_eq!(cli.sql.as_deref(), Some("SELECT 1"));
        assert_eq!(cli.database.as_deref(), Some("bnb"));
        assert_eq!(cli.workgroup.as_deref(), Some("analytics"));
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_json_mode() {
        let cli = Cli::parse_from(["querygate", "--json", "--mock-engine"]);
        assert!(cli.json);
        assert!(cli.mock_engine);
        assert!(cli.sql.is_none());
    }

    #[test]
    fn test_config_path_default() {
        let cli = Cli::parse_from(["querygate", "SELECT 1"]);
        assert!(cli.config_path().ends_with("querygate/config.toml"));
    }

    #[test]
    fn test_config_path_explicit() {
        let cli = Cli::parse_from(["querygate", "--config", "/tmp/qg.toml", "SELECT 1"]);
        assert_eq!(cli.config_path(), PathBuf::from("/tmp/qg.toml"));
    }
}
