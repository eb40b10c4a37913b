pub mod extractor;
pub mod import_resolver;
pub mod parser;
pub mod progress;
pub mod walker;

pub use extractor::{DependencyExtractor, ImportSpecifiers};
pub use import_resolver::{get_resolve_import, ImportResolver, NodeResolver, ResolveOptions};
pub use parser::{SourceParser, SyntaxTree, TreeSitterParser};
pub use progress::{BatchProgress, ProgressSnapshot};
pub use walker::FileWalker;
