use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::cache::{CacheEntry, FilesData, HashFn};
use crate::error::{DepError, Result};
use crate::indexer::extractor::DependencyExtractor;
use crate::indexer::import_resolver::ImportResolver;
use crate::indexer::parser::{SourceParser, SyntaxTree};
use crate::indexer::progress::BatchProgress;

/// Everything the pipeline knows about one input file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub source: Arc<[u8]>,

    /// Present only for parseable files
    pub ast: Option<AstAccessor>,

    /// Absolute paths in import order; `None` for unparseable files
    pub dependencies: Option<Vec<PathBuf>>,
}

impl FileRecord {
    /// Source as text, if it is valid UTF-8.
    pub fn source_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.source).ok()
    }
}

/// Produces the syntax tree of a file on request.
///
/// Every call reparses the retained source; trees are never kept alive
/// between calls, so a batch holds only the bytes of each file.
#[derive(Clone)]
pub struct AstAccessor {
    path: PathBuf,
    source: Arc<[u8]>,
    parser: Arc<dyn SourceParser>,
}

impl AstAccessor {
    pub fn parse(&self) -> Result<SyntaxTree> {
        self.parser.parse(&self.path, Arc::clone(&self.source))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for AstAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstAccessor")
            .field("path", &self.path)
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// State shared by all file tasks of one batch.
pub(crate) struct TaskContext {
    pub resolver: Arc<dyn ImportResolver>,
    pub parser: Arc<dyn SourceParser>,
    pub hash: HashFn,
    pub cache: Mutex<FilesData>,
    pub progress: BatchProgress,
}

impl TaskContext {
    fn cached_dependencies(&self, key: &str, hash: &str) -> Option<Option<Vec<PathBuf>>> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .get(key)
            .filter(|entry| entry.hash == hash)
            .map(|entry| entry.dependencies.clone())
    }

    fn store(&self, key: String, entry: CacheEntry) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }
}

pub async fn read_source(path: &Path) -> Result<Arc<[u8]>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DepError::io(path, e))?;
    Ok(Arc::from(bytes))
}

pub(crate) async fn process_file(path: &Path, ctx: &TaskContext) -> Result<FileRecord> {
    tracing::debug!("Processing {}", path.display());

    let source = read_source(path).await?;
    let parseable = ctx.parser.is_parseable(path);
    let hash = (ctx.hash)(&source);
    let key = path.to_string_lossy().into_owned();

    let dependencies = match ctx.cached_dependencies(&key, &hash) {
        Some(dependencies) => {
            ctx.progress.inc_cache_hit();
            dependencies
        }
        None if parseable => {
            ctx.progress.inc_parsed();
            Some(parse_dependencies(path, Arc::clone(&source), ctx).await?)
        }
        None => {
            ctx.progress.inc_passthrough();
            None
        }
    };

    let ast = parseable.then(|| AstAccessor {
        path: path.to_path_buf(),
        source: Arc::clone(&source),
        parser: Arc::clone(&ctx.parser),
    });

    ctx.store(
        key,
        CacheEntry {
            hash,
            dependencies: dependencies.clone(),
        },
    );

    tracing::debug!(" + Done {}", path.display());
    Ok(FileRecord {
        source,
        ast,
        dependencies,
    })
}

/// Parses and resolves on the blocking pool; both are CPU-bound.
async fn parse_dependencies(
    path: &Path,
    source: Arc<[u8]>,
    ctx: &TaskContext,
) -> Result<Vec<PathBuf>> {
    let parser = Arc::clone(&ctx.parser);
    let resolver = Arc::clone(&ctx.resolver);
    let owned_path = path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let tree = parser.parse(&owned_path, source).inspect_err(|_| {
            tracing::error!("Unable to parse {}", owned_path.display());
        })?;
        DependencyExtractor::new().extract(&tree, &owned_path, resolver.as_ref())
    })
    .await
    .map_err(|e| DepError::Task(format!("{}: {}", path.display(), e)))?
}
