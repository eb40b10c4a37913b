pub mod cache;
pub mod error;
pub mod indexer;
pub mod languages;
pub mod pipeline;

use once_cell::sync::Lazy;

pub use cache::{
    content_hash, get_hash_function, CacheEntry, CacheManager, CacheSnapshot, FilesData, HashFn,
    JsonFileCacheManager, MemoryCacheManager,
};
pub use error::{DepError, Result};
pub use indexer::{
    get_resolve_import, BatchProgress, DependencyExtractor, FileWalker, ImportResolver,
    ImportSpecifiers, NodeResolver, ProgressSnapshot, ResolveOptions, SourceParser, SyntaxTree,
    TreeSitterParser,
};
pub use languages::{LanguageGrammar, LanguageRegistry};
pub use pipeline::{
    process_files, AstAccessor, DependencyPipeline, FileMap, FileRecord, MAX_CONCURRENT_FILES,
};

/// Global language registry instance (lazily initialized)
pub static REGISTRY: Lazy<LanguageRegistry> = Lazy::new(LanguageRegistry::new);
