//! Persistent dependency cache.
//!
//! A [`CacheSnapshot`] is an open bag of JSON fields carried between runs.
//! The pipeline only touches `filesData`, which maps a file path to the
//! fingerprint of its content and the dependencies computed for it.

pub mod hash;
pub mod json;

pub use hash::{content_hash, get_hash_function, HashFn};
pub use json::JsonFileCacheManager;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Cached result for one file, valid only while `hash` matches the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,

    /// `None` for files the parser does not handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<PathBuf>>,
}

/// Path (as passed to the pipeline) -> cache entry
pub type FilesData = HashMap<String, CacheEntry>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(rename = "filesData", default, skip_serializing_if = "Option::is_none")]
    pub files_data: Option<FilesData>,

    /// Fields owned by other consumers of the snapshot, kept verbatim
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl CacheSnapshot {
    pub fn with_files_data(files_data: FilesData) -> Self {
        Self {
            files_data: Some(files_data),
            ..Self::default()
        }
    }

    pub fn take_files_data(&mut self) -> FilesData {
        self.files_data.take().unwrap_or_default()
    }
}

/// Loads and stores the snapshot between batches.
pub trait CacheManager: Send + Sync {
    fn get(&self) -> Result<CacheSnapshot>;
    fn set(&self, snapshot: CacheSnapshot) -> Result<()>;
}

/// Keeps the snapshot in process memory.
#[derive(Debug, Default)]
pub struct MemoryCacheManager {
    snapshot: Mutex<CacheSnapshot>,
    set_calls: AtomicUsize,
}

impl MemoryCacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            set_calls: AtomicUsize::new(0),
        }
    }

    /// Number of snapshots committed so far
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::Acquire)
    }
}

impl CacheManager for MemoryCacheManager {
    fn get(&self) -> Result<CacheSnapshot> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, snapshot: CacheSnapshot) -> Result<()> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
        self.set_calls.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
