// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "KPI Drift";

/// Application name in lowercase (for log filters and identifiers)
pub const APP_NAME_LOWER: &str = "kpi_drift";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".kpi-drift";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "kpi-drift.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "KPI_DRIFT_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "KPI_DRIFT_LOG";

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "KPI_DRIFT_DEBUG";

// =============================================================================
// Environment Variables - History Store
// =============================================================================

/// Environment variable for the history store backend (`file` or `redis`)
pub const ENV_STORE_BACKEND: &str = "KPI_DRIFT_STORE_BACKEND";

/// Environment variable for the Redis URL of the history store
pub const ENV_REDIS_URL: &str = "KPI_DRIFT_REDIS_URL";

/// Environment variable for the file store's data directory
pub const ENV_DATA_DIR: &str = "KPI_DRIFT_DATA_DIR";

// =============================================================================
// History Store Defaults
// =============================================================================

/// Default data directory of the file store (relative to the working directory)
pub const DEFAULT_DATA_DIR: &str = ".";

/// Directory prefix of every metric history key
pub const METRIC_STORE_DIR: &str = "dist";

/// Suffix of every metric history key
pub const METRIC_STORE_SUFFIX: &str = "lineCountAndKPIByDateByVersion.json";

// =============================================================================
// Report Links
// =============================================================================

/// Base URL of the hosted report application
pub const REPORT_APP_BASE_URL: &str = "https://app.data-drift.io";
