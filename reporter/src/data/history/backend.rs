//! History backend trait definition

use async_trait::async_trait;

use super::error::HistoryError;

/// Storage for serialized metric histories
///
/// Both the file-backed and the Redis-backed stores implement this trait.
/// Keys are opaque strings built by [`super::MetricStoreKey`].
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Read the bytes stored under `key`, `None` if nothing was stored
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, HistoryError>;

    /// Store `value` under `key`, replacing any previous value
    async fn save(&self, key: &str, value: Vec<u8>) -> Result<(), HistoryError>;

    /// Health check (validates the backing store is reachable)
    async fn health_check(&self) -> Result<(), HistoryError>;

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
