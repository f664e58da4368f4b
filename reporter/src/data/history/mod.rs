//! Metric history store
//!
//! Persists the aggregated per-metric history (`Metrics`) that reports are
//! built from. Two pluggable backends:
//! - File (default) - one JSON file per metric under the data directory
//! - Redis (optional) - uses deadpool-redis
//!
//! The backend is chosen once from configuration; callers only see
//! [`HistoryService`].

mod backend;
mod error;
mod file;
mod key;
mod redis;

use std::sync::Arc;

pub use backend::HistoryBackend;
pub use error::HistoryError;
pub use file::FileHistoryStore;
pub use key::MetricStoreKey;

use crate::core::config::{HistoryConfig, StoreBackendType};
use crate::data::types::Metrics;

/// History service providing typed access to the history backend
pub struct HistoryService {
    backend: Arc<dyn HistoryBackend>,
}

impl std::fmt::Debug for HistoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryService")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl HistoryService {
    /// Create a new history service from configuration
    pub async fn new(config: &HistoryConfig) -> Result<Self, HistoryError> {
        let backend: Arc<dyn HistoryBackend> = match config.backend {
            StoreBackendType::File => {
                tracing::debug!(data_dir = %config.data_dir.display(), "Initializing file history store");
                Arc::new(FileHistoryStore::new(config.data_dir.clone()))
            }
            StoreBackendType::Redis => {
                let url = config.redis_url.as_ref().ok_or_else(|| {
                    HistoryError::Config("redis_url required for Redis backend".into())
                })?;
                Arc::new(redis::RedisHistoryStore::connect(url).await?)
            }
        };

        Ok(Self { backend })
    }

    /// Wrap an already constructed backend
    pub fn with_backend(backend: Arc<dyn HistoryBackend>) -> Self {
        Self { backend }
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    // =========================================================================
    // Raw bytes API
    // =========================================================================

    pub async fn load_raw(&self, key: &MetricStoreKey) -> Result<Option<Vec<u8>>, HistoryError> {
        self.backend.load(key.as_str()).await
    }

    pub async fn save_raw(&self, key: &MetricStoreKey, value: Vec<u8>) -> Result<(), HistoryError> {
        self.backend.save(key.as_str(), value).await
    }

    // =========================================================================
    // Typed API (serde_json)
    // =========================================================================

    /// Load the stored history of a metric.
    ///
    /// A metric that was never stored is an error: a report over nothing
    /// would silently look like "no drift".
    pub async fn load_metrics(
        &self,
        installation_id: &str,
        metric_name: &str,
    ) -> Result<Metrics, HistoryError> {
        let key = MetricStoreKey::new(installation_id, metric_name);
        let bytes = self
            .load_raw(&key)
            .await?
            .ok_or_else(|| HistoryError::NotFound {
                key: key.to_string(),
            })?;

        let metrics: Metrics = serde_json::from_slice(&bytes)
            .map_err(|e| HistoryError::Serialization(format!("{key}: {e}")))?;

        tracing::debug!(
            key = %key,
            backend = self.backend_name(),
            slices = metrics.len(),
            "Loaded metric history"
        );
        Ok(metrics)
    }

    /// Store the history of a metric, replacing what was there
    pub async fn store_metrics(
        &self,
        installation_id: &str,
        metric_name: &str,
        metrics: &Metrics,
    ) -> Result<MetricStoreKey, HistoryError> {
        let key = MetricStoreKey::new(installation_id, metric_name);
        let bytes =
            serde_json::to_vec(metrics).map_err(|e| HistoryError::Serialization(e.to_string()))?;
        self.save_raw(&key, bytes).await?;

        tracing::debug!(
            key = %key,
            backend = self.backend_name(),
            slices = metrics.len(),
            "Stored metric history"
        );
        Ok(key)
    }

    /// Health check
    pub async fn health_check(&self) -> Result<(), HistoryError> {
        self.backend.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::*;
    use crate::data::types::{CommitRecord, Metric, TimeGrain};

    fn file_config(dir: &TempDir) -> HistoryConfig {
        HistoryConfig {
            backend: StoreBackendType::File,
            redis_url: None,
            data_dir: dir.path().to_path_buf(),
        }
    }

    fn sample_metrics() -> Metrics {
        let record = CommitRecord {
            lines: 12,
            kpi: Decimal::new(1050, 2),
            commit_timestamp: 1_706_745_600,
            commit_url: "https://github.com/acme/metrics/commit/abc".to_string(),
            commit_comments: vec![],
        };
        let metric = Metric {
            time_grain: TimeGrain::Month,
            period: "2024-01".to_string(),
            dimension: String::new(),
            dimension_value: String::new(),
            history: [("abc".to_string(), record)].into_iter().collect(),
        };
        [("2024-01".to_string(), metric)].into_iter().collect()
    }

    #[tokio::test]
    async fn test_store_then_load_metrics() {
        let dir = TempDir::new().unwrap();
        let service = HistoryService::new(&file_config(&dir)).await.unwrap();
        assert_eq!(service.backend_name(), "file");

        let key = service
            .store_metrics("42", "revenue", &sample_metrics())
            .await
            .unwrap();
        assert_eq!(
            key.as_str(),
            "dist/42_revenue_lineCountAndKPIByDateByVersion.json"
        );
        assert!(dir.path().join(key.as_str()).exists());

        let loaded = service.load_metrics("42", "revenue").await.unwrap();
        assert_eq!(loaded, sample_metrics());
    }

    #[tokio::test]
    async fn test_load_missing_metric_is_not_found() {
        let dir = TempDir::new().unwrap();
        let service = HistoryService::new(&file_config(&dir)).await.unwrap();

        let err = service.load_metrics("42", "churn").await.unwrap_err();
        assert!(matches!(err, HistoryError::NotFound { key } if key.contains("42_churn_")));
    }

    #[tokio::test]
    async fn test_load_corrupt_history_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let service = HistoryService::new(&file_config(&dir)).await.unwrap();
        let key = MetricStoreKey::new("42", "revenue");
        service.save_raw(&key, b"{not json".to_vec()).await.unwrap();

        let err = service.load_metrics("42", "revenue").await.unwrap_err();
        assert!(matches!(err, HistoryError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_redis_backend_requires_url() {
        let config = HistoryConfig {
            backend: StoreBackendType::Redis,
            redis_url: None,
            data_dir: PathBuf::from("."),
        };

        let err = HistoryService::new(&config).await.unwrap_err();
        assert!(matches!(err, HistoryError::Config(_)));
    }

    #[tokio::test]
    async fn test_debug_shows_backend_name() {
        let dir = TempDir::new().unwrap();
        let service =
            HistoryService::with_backend(Arc::new(FileHistoryStore::new(dir.path().into())));
        assert_eq!(
            format!("{service:?}"),
            "HistoryService { backend: \"file\" }"
        );
    }
}
