use std::path::{Path, PathBuf};

use crate::cache::{CacheManager, CacheSnapshot};
use crate::error::{DepError, Result};

/// Stores the snapshot as a single JSON document.
///
/// Reading is fail-safe: a missing or corrupt file is an empty snapshot,
/// which makes every file a cache miss.
#[derive(Debug, Clone)]
pub struct JsonFileCacheManager {
    path: PathBuf,
}

impl JsonFileCacheManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the cache file. Returns whether there was one.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DepError::io(&self.path, e)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CacheManager for JsonFileCacheManager {
    fn get(&self) -> Result<CacheSnapshot> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No cache at {}, starting empty", self.path.display());
                return Ok(CacheSnapshot::default());
            }
            Err(e) => {
                tracing::warn!("Unable to read cache {}: {}", self.path.display(), e);
                return Ok(CacheSnapshot::default());
            }
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                tracing::warn!("Discarding corrupt cache {}: {}", self.path.display(), e);
                Ok(CacheSnapshot::default())
            }
        }
    }

    fn set(&self, snapshot: CacheSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DepError::io(parent, e))?;
        }

        let json = serde_json::to_vec(&snapshot)
            .map_err(|e| DepError::Cache(format!("failed to encode snapshot: {}", e)))?;

        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(|e| DepError::io(&temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| DepError::io(&self.path, e))?;

        tracing::debug!("Cache written to {}", self.path.display());
        Ok(())
    }
}
