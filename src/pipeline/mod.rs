//! Batch orchestration.
//!
//! One call to [`DependencyPipeline::process`] is one batch: the cache
//! snapshot is loaded, every input file is handled by its own task under a
//! concurrency cap, and the updated snapshot is committed only if every
//! task succeeded.

pub mod task;

pub use task::{read_source, AstAccessor, FileRecord};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::cache::{get_hash_function, CacheManager, HashFn};
use crate::error::{DepError, Result};
use crate::indexer::import_resolver::{get_resolve_import, ResolveOptions};
use crate::indexer::parser::{SourceParser, TreeSitterParser};
use crate::indexer::progress::BatchProgress;
use task::TaskContext;

/// Upper bound on file tasks running at the same time.
pub const MAX_CONCURRENT_FILES: usize = 10;

/// Input path -> record, one entry per distinct input path.
pub type FileMap = HashMap<PathBuf, FileRecord>;

pub struct DependencyPipeline {
    parser: Arc<dyn SourceParser>,
    hash: HashFn,
    concurrency: usize,
    progress: BatchProgress,
}

impl Default for DependencyPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyPipeline {
    pub fn new() -> Self {
        Self {
            parser: Arc::new(TreeSitterParser::default()),
            hash: get_hash_function(),
            concurrency: MAX_CONCURRENT_FILES,
            progress: BatchProgress::new(),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn SourceParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_hash_function(mut self, hash: HashFn) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Counters of the running or most recent batch.
    pub fn progress(&self) -> &BatchProgress {
        &self.progress
    }

    /// Processes one batch.
    ///
    /// Fails with the first task error; in that case nothing is returned
    /// and `cache_manager.set` is not called.
    pub async fn process(
        &self,
        files: &[PathBuf],
        cache_manager: &dyn CacheManager,
        resolve_options: &ResolveOptions,
    ) -> Result<FileMap> {
        let resolver = get_resolve_import(resolve_options);
        let mut snapshot = cache_manager.get()?;
        let files_data = snapshot.take_files_data();

        let mut seen = HashSet::with_capacity(files.len());
        let unique: Vec<PathBuf> = files
            .iter()
            .filter(|path| seen.insert(path.as_path()))
            .cloned()
            .collect();

        tracing::debug!(
            "Processing {} files ({} cached entries, concurrency {})",
            unique.len(),
            files_data.len(),
            self.concurrency
        );

        self.progress.start(unique.len());
        let ctx = Arc::new(TaskContext {
            resolver,
            parser: Arc::clone(&self.parser),
            hash: self.hash,
            cache: Mutex::new(files_data),
            progress: self.progress.clone(),
        });

        let outcome = self.run_tasks(unique, &ctx).await;
        self.progress.finish();
        let records = outcome?;

        let files_data = std::mem::take(
            &mut *ctx.cache.lock().unwrap_or_else(PoisonError::into_inner),
        );
        snapshot.files_data = Some(files_data);
        cache_manager.set(snapshot)?;

        let stats = self.progress.snapshot();
        tracing::info!(
            "Processed {} files: {} cached, {} parsed, {} passed through in {}ms",
            stats.files_processed,
            stats.cache_hits,
            stats.parsed,
            stats.passthrough,
            stats.elapsed_ms
        );

        Ok(records)
    }

    /// Runs one task per file with at most `concurrency` in flight.
    ///
    /// After the first failure no further task is started. Tasks already
    /// running are drained and their results dropped.
    async fn run_tasks(&self, files: Vec<PathBuf>, ctx: &Arc<TaskContext>) -> Result<FileMap> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let failed = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for path in files {
            let permit = tokio::select! {
                biased;
                _ = failed.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    permit.map_err(|e| DepError::Task(e.to_string()))?
                }
            };

            let ctx = Arc::clone(ctx);
            let failed = failed.clone();
            tasks.spawn(async move {
                let _permit = permit;
                if failed.is_cancelled() {
                    return Ok(None);
                }

                ctx.progress.task_started();
                let result = task::process_file(&path, &ctx).await;
                ctx.progress.task_finished();

                match result {
                    Ok(record) => Ok(Some((path, record))),
                    Err(e) => {
                        failed.cancel();
                        Err(e)
                    }
                }
            });
        }

        let mut records = FileMap::new();
        let mut first_error = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Some((path, record)))) => {
                    records.insert(path, record);
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    failed.cancel();
                    first_error.get_or_insert(DepError::Task(e.to_string()));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(records),
        }
    }
}

/// Processes `files` with the default pipeline.
pub async fn process_files(
    files: &[PathBuf],
    cache_manager: &dyn CacheManager,
    resolve_options: &ResolveOptions,
) -> Result<FileMap> {
    DependencyPipeline::new()
        .process(files, cache_manager, resolve_options)
        .await
}
