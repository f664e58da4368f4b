//! File-backed history store
//!
//! Stores each history as a JSON file at `{base_path}/{key}`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::backend::HistoryBackend;
use super::error::HistoryError;

/// File-backed history store
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    /// Directory store keys are resolved against
    base_path: PathBuf,
}

impl FileHistoryStore {
    /// Create a new file store rooted at `base_path`
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Resolve a key to its file path, rejecting keys that escape the base
    fn file_path(&self, key: &str) -> Result<PathBuf, HistoryError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(HistoryError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl HistoryBackend for FileHistoryStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, HistoryError> {
        let path = self.file_path(key)?;

        // Read directly; a missing file is an empty slot, not an error
        match fs::read(&path).await {
            Ok(data) => {
                tracing::trace!(key, size = data.len(), "History file read");
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HistoryError::Io(e)),
        }
    }

    async fn save(&self, key: &str, value: Vec<u8>) -> Result<(), HistoryError> {
        let path = self.file_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write beside the target then rename, so readers never see a partial file
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, &value).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!(
            key,
            size = value.len(),
            path = %path.display(),
            "History file written"
        );

        Ok(())
    }

    async fn health_check(&self) -> Result<(), HistoryError> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
