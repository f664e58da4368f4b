use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::StoreBackendType;
use super::constants::{ENV_CONFIG, ENV_DATA_DIR, ENV_DEBUG, ENV_REDIS_URL, ENV_STORE_BACKEND};

#[derive(Parser)]
#[command(name = "kpi-drift")]
#[command(version, about = "Explain how KPIs drift after their period closes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// History store backend (file or redis)
    #[arg(long, global = true, env = ENV_STORE_BACKEND, value_parser = parse_store_backend)]
    pub store_backend: Option<StoreBackendType>,

    /// Redis-compatible history store URL (Redis, Valkey).
    /// Formats: redis://host:port/db, rediss://host:port/db
    #[arg(long, global = true, env = ENV_REDIS_URL)]
    pub redis_url: Option<String>,

    /// Directory the file store keeps metric histories in
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<PathBuf>,

    /// Enable debug mode (also writes the raw report next to each document)
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,
}

/// Parse store backend type from CLI/env string
fn parse_store_backend(s: &str) -> Result<StoreBackendType, String> {
    match s.to_lowercase().as_str() {
        "file" => Ok(StoreBackendType::File),
        "redis" => Ok(StoreBackendType::Redis),
        _ => Err(format!(
            "Invalid store backend '{}'. Valid options: file, redis",
            s
        )),
    }
}

/// Parse a GitHub-style `owner/name` repository
fn parse_repository(s: &str) -> Result<Repository, String> {
    match s.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(Repository {
                owner: owner.to_string(),
                name: name.to_string(),
            })
        }
        _ => Err(format!("Invalid repository '{}'. Expected owner/name", s)),
    }
}

/// Repository the metric's dataset commits live in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print the time grain and drift cutoff of a period key
    Classify {
        /// Period key, e.g. 2024-01-15, 2024-W03, 2024-01, 2024-Q1, 2024
        period_key: String,
    },
    /// Store a metric history (JSON) in the history store
    Import {
        /// Installation the metric belongs to
        #[arg(long)]
        installation: String,
        /// Metric name
        #[arg(long)]
        metric: String,
        /// Fill empty commit URLs with report links into this repository (owner/name)
        #[arg(long, value_parser = parse_repository)]
        repo: Option<Repository>,
        /// Metric history file
        file: PathBuf,
    },
    /// Build and render the drift reports of every slice of a metric
    Report {
        /// Installation the metric belongs to
        #[arg(long)]
        installation: String,
        /// Metric name
        #[arg(long)]
        metric: String,
        /// Fail when a slice has no commits after its period ends
        #[arg(long)]
        require_events: bool,
        /// Write one document per slice into this directory instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub store_backend: Option<StoreBackendType>,
    pub redis_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub require_events: bool,
    pub output_dir: Option<PathBuf>,
    pub debug: bool,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    from_cli(Cli::parse())
}

fn from_cli(cli: Cli) -> (CliConfig, Commands) {
    // Report flags feed the layered config like the global options do
    let (require_events, output_dir) = match &cli.command {
        Commands::Report {
            require_events,
            out,
            ..
        } => (*require_events, out.clone()),
        _ => (false, None),
    };

    let config = CliConfig {
        config: cli.config,
        store_backend: cli.store_backend,
        redis_url: cli.redis_url,
        data_dir: cli.data_dir,
        require_events,
        output_dir,
        debug: cli.debug,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> (CliConfig, Commands) {
        from_cli(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_parse_store_backend() {
        assert_eq!(parse_store_backend("file"), Ok(StoreBackendType::File));
        assert_eq!(parse_store_backend("REDIS"), Ok(StoreBackendType::Redis));
        assert!(parse_store_backend("s3").is_err());
    }

    #[test]
    fn test_parse_repository() {
        assert_eq!(
            parse_repository("acme/metrics"),
            Ok(Repository {
                owner: "acme".to_string(),
                name: "metrics".to_string()
            })
        );
        for bad in ["acme", "/metrics", "acme/", "a/b/c"] {
            assert!(parse_repository(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_classify_command() {
        let (config, command) = parse_args(&["kpi-drift", "classify", "2024-Q1"]);

        assert!(matches!(command, Commands::Classify { period_key } if period_key == "2024-Q1"));
        assert!(!config.require_events);
        assert!(config.store_backend.is_none());
    }

    #[test]
    fn test_report_flags_feed_config() {
        let (config, command) = parse_args(&[
            "kpi-drift",
            "report",
            "--installation",
            "42",
            "--metric",
            "revenue",
            "--require-events",
            "--out",
            "reports",
            "--store-backend",
            "redis",
            "--redis-url",
            "redis://localhost:6379",
        ]);

        assert!(matches!(
            command,
            Commands::Report { ref installation, ref metric, .. }
                if installation == "42" && metric == "revenue"
        ));
        assert!(config.require_events);
        assert_eq!(config.output_dir, Some(PathBuf::from("reports")));
        assert_eq!(config.store_backend, Some(StoreBackendType::Redis));
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
    }

    #[test]
    fn test_import_command() {
        let (_, command) = parse_args(&[
            "kpi-drift",
            "import",
            "--installation",
            "42",
            "--metric",
            "revenue",
            "--repo",
            "acme/metrics",
            "history.json",
        ]);

        let Commands::Import { file, repo, .. } = command else {
            panic!("expected import command");
        };
        assert_eq!(file, PathBuf::from("history.json"));
        assert_eq!(repo.map(|r| r.owner), Some("acme".to_string()));
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["kpi-drift"]).is_err());
    }
}
