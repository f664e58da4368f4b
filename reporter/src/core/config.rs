use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_DATA_DIR};

// =============================================================================
// Store Backend Enum
// =============================================================================

/// History store backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendType {
    #[default]
    File,
    Redis,
}

impl fmt::Display for StoreBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackendType::File => write!(f, "file"),
            StoreBackendType::Redis => write!(f, "redis"),
        }
    }
}

// =============================================================================
// File Config (JSON)
// =============================================================================

/// History store configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoreFileConfig {
    pub backend: Option<StoreBackendType>,
    /// Connection URL for Redis-compatible backends
    pub redis_url: Option<String>,
    /// Directory the file store resolves keys against
    pub data_dir: Option<String>,
}

/// Report configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportFileConfig {
    /// Fail when a slice has no commits after its period ends
    pub require_events: Option<bool>,
    /// Write rendered documents here instead of stdout
    pub output_dir: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub store: Option<StoreFileConfig>,
    pub report: Option<ReportFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(store) = other.store {
            let current = self.store.get_or_insert_with(StoreFileConfig::default);
            if store.backend.is_some() {
                tracing::trace!(backend = ?store.backend, "Merging store.backend");
                current.backend = store.backend;
            }
            if store.redis_url.is_some() {
                tracing::trace!("Merging store.redis_url");
                current.redis_url = store.redis_url;
            }
            if store.data_dir.is_some() {
                tracing::trace!(data_dir = ?store.data_dir, "Merging store.data_dir");
                current.data_dir = store.data_dir;
            }
        }

        if let Some(report) = other.report {
            let current = self.report.get_or_insert_with(ReportFileConfig::default);
            if report.require_events.is_some() {
                tracing::trace!(require_events = ?report.require_events, "Merging report.require_events");
                current.require_events = report.require_events;
            }
            if report.output_dir.is_some() {
                tracing::trace!(output_dir = ?report.output_dir, "Merging report.output_dir");
                current.output_dir = report.output_dir;
            }
        }

        if other.debug.is_some() {
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Final Config
// =============================================================================

/// History store configuration (used by HistoryService)
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub backend: StoreBackendType,
    /// Redis URL (redis backend)
    pub redis_url: Option<String>,
    /// Base directory (file backend)
    pub data_dir: PathBuf,
}

/// Report generation configuration (final/runtime)
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    pub require_events: bool,
    pub output_dir: Option<PathBuf>,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: HistoryConfig,
    pub report: ReportConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.kpi-drift/kpi-drift.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::from_sources(cli, file_config);
        config.validate()?;

        tracing::debug!(
            store_backend = %config.store.backend,
            data_dir = %config.store.data_dir.display(),
            require_events = config.report.require_events,
            output_dir = ?config.report.output_dir,
            debug = config.debug,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer CLI/env values over merged file values over defaults
    fn from_sources(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_store = file_config.store.unwrap_or_default();
        let file_report = file_config.report.unwrap_or_default();

        let backend = cli.store_backend.or(file_store.backend).unwrap_or_default();

        // Only carried for the redis backend
        let redis_url = if backend == StoreBackendType::Redis {
            cli.redis_url.clone().or(file_store.redis_url)
        } else {
            None
        };

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| file_store.data_dir.map(|d| expand_path(&d)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        // --require-events only ever turns the check on
        let require_events = cli.require_events || file_report.require_events.unwrap_or(false);
        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| file_report.output_dir.map(|d| expand_path(&d)));

        let debug = cli.debug || file_config.debug.unwrap_or(false);

        Self {
            store: HistoryConfig {
                backend,
                redis_url,
                data_dir,
            },
            report: ReportConfig {
                require_events,
                output_dir,
            },
            debug,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.store.backend == StoreBackendType::Redis {
            match self.store.redis_url.as_deref() {
                None => anyhow::bail!(
                    "Configuration error: store.redis_url is required when store.backend is redis"
                ),
                Some(url) if url.trim().is_empty() => {
                    anyhow::bail!("Configuration error: store.redis_url must not be empty")
                }
                Some(_) => {}
            }
        }

        if self.store.data_dir.as_os_str().is_empty() {
            anyhow::bail!("Configuration error: store.data_dir must not be empty");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.kpi-drift/kpi-drift.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_backend_serde() {
        let backend: StoreBackendType = serde_json::from_str(r#""redis""#).unwrap();
        assert_eq!(backend, StoreBackendType::Redis);

        let backend: StoreBackendType = serde_json::from_str(r#""file""#).unwrap();
        assert_eq!(backend, StoreBackendType::File);
    }

    #[test]
    fn test_store_backend_display() {
        assert_eq!(StoreBackendType::File.to_string(), "file");
        assert_eq!(StoreBackendType::Redis.to_string(), "redis");
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "store": { "backend": "redis", "redis_url": "redis://localhost:6379", "data_dir": "/var/kpi" },
            "report": { "require_events": true, "output_dir": "out" },
            "debug": true
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let store = config.store.as_ref().unwrap();
        assert_eq!(store.backend, Some(StoreBackendType::Redis));
        assert_eq!(store.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(store.data_dir.as_deref(), Some("/var/kpi"));

        let report = config.report.as_ref().unwrap();
        assert_eq!(report.require_events, Some(true));
        assert_eq!(report.output_dir.as_deref(), Some("out"));
        assert_eq!(config.debug, Some(true));
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();

        assert!(config.store.is_none());
        assert!(config.report.is_none());
        assert!(config.debug.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "store": { "backend": "file" }, "stroe": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.store.as_ref().unwrap().backend,
            Some(StoreBackendType::File)
        );
        assert_eq!(config.extra.get("stroe").unwrap(), 123);
    }

    #[test]
    fn test_file_config_rejects_unknown_backend() {
        let json = r#"{ "store": { "backend": "s3" } }"#;
        assert!(serde_json::from_str::<FileConfig>(json).is_err());
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = FileConfig {
            store: Some(StoreFileConfig {
                backend: Some(StoreBackendType::Redis),
                redis_url: Some("redis://base:6379".to_string()),
                data_dir: Some("/base".to_string()),
            }),
            report: Some(ReportFileConfig {
                require_events: Some(true),
                output_dir: None,
            }),
            debug: Some(false),
            extra: serde_json::Value::Null,
        };
        let overlay = FileConfig {
            store: Some(StoreFileConfig {
                backend: None,
                redis_url: Some("redis://overlay:6379".to_string()),
                data_dir: None,
            }),
            report: Some(ReportFileConfig {
                require_events: None,
                output_dir: Some("reports".to_string()),
            }),
            debug: None,
            extra: serde_json::Value::Null,
        };

        base.merge(overlay);

        let store = base.store.unwrap();
        assert_eq!(store.backend, Some(StoreBackendType::Redis));
        assert_eq!(store.redis_url.as_deref(), Some("redis://overlay:6379"));
        assert_eq!(store.data_dir.as_deref(), Some("/base"));

        let report = base.report.unwrap();
        assert_eq!(report.require_events, Some(true));
        assert_eq!(report.output_dir.as_deref(), Some("reports"));
        assert_eq!(base.debug, Some(false));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_sources(&CliConfig::default(), FileConfig::default());

        assert_eq!(config.store.backend, StoreBackendType::File);
        assert_eq!(config.store.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert!(config.store.redis_url.is_none());
        assert!(!config.report.require_events);
        assert!(config.report.output_dir.is_none());
        assert!(!config.debug);
        config.validate().unwrap();
    }

    #[test]
    fn test_app_config_cli_override() {
        let file_config: FileConfig = serde_json::from_str(
            r#"{
                "store": { "backend": "file", "data_dir": "/from-file", "redis_url": "redis://file:6379" },
                "report": { "output_dir": "file-out" }
            }"#,
        )
        .unwrap();
        let cli = CliConfig {
            store_backend: Some(StoreBackendType::Redis),
            redis_url: Some("redis://cli:6379".to_string()),
            data_dir: Some(PathBuf::from("/from-cli")),
            require_events: true,
            output_dir: None,
            debug: true,
            config: None,
        };

        let config = AppConfig::from_sources(&cli, file_config);

        assert_eq!(config.store.backend, StoreBackendType::Redis);
        assert_eq!(config.store.redis_url.as_deref(), Some("redis://cli:6379"));
        assert_eq!(config.store.data_dir, PathBuf::from("/from-cli"));
        assert!(config.report.require_events);
        assert_eq!(config.report.output_dir, Some(PathBuf::from("file-out")));
        assert!(config.debug);
    }

    #[test]
    fn test_app_config_redis_url_dropped_for_file_backend() {
        let file_config: FileConfig =
            serde_json::from_str(r#"{ "store": { "redis_url": "redis://unused:6379" } }"#).unwrap();

        let config = AppConfig::from_sources(&CliConfig::default(), file_config);

        assert_eq!(config.store.backend, StoreBackendType::File);
        assert!(config.store.redis_url.is_none());
    }

    #[test]
    fn test_app_config_validation_redis_url_required() {
        let cli = CliConfig {
            store_backend: Some(StoreBackendType::Redis),
            ..CliConfig::default()
        };
        let config = AppConfig::from_sources(&cli, FileConfig::default());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("store.redis_url is required"));
    }

    #[test]
    fn test_app_config_validation_empty_redis_url() {
        let cli = CliConfig {
            store_backend: Some(StoreBackendType::Redis),
            redis_url: Some("  ".to_string()),
            ..CliConfig::default()
        };
        let config = AppConfig::from_sources(&cli, FileConfig::default());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_app_config_load_from_config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{ "store": { "data_dir": "/srv/kpi" }, "report": { "require_events": true } }"#,
        )
        .unwrap();

        let cli = CliConfig {
            config: Some(path),
            ..CliConfig::default()
        };
        let config = AppConfig::load(&cli).unwrap();

        assert_eq!(config.store.data_dir, PathBuf::from("/srv/kpi"));
        assert!(config.report.require_events);
    }

    #[test]
    fn test_app_config_missing_config_path() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            config: Some(dir.path().join("absent.json")),
            ..CliConfig::default()
        };

        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
