use std::path::Path;
use std::sync::Arc;

use crate::error::{DepError, Result};
use crate::languages::{LanguageGrammar, LanguageRegistry};

/// Turns file content into a syntax tree.
///
/// Implementations must be safe to call from many blocking workers at once.
pub trait SourceParser: Send + Sync {
    /// Whether files with this path's extension are parsed at all.
    fn is_parseable(&self, path: &Path) -> bool;

    fn parse(&self, path: &Path, source: Arc<[u8]>) -> Result<SyntaxTree>;
}

pub struct TreeSitterParser {
    registry: LanguageRegistry,
}

impl TreeSitterParser {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self { registry }
    }

    pub fn parse_source(
        &self,
        path: &Path,
        source: Arc<[u8]>,
        grammar: Arc<dyn LanguageGrammar>,
    ) -> Result<SyntaxTree> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|e| parse_error(path, 0, 0, e.to_string()))?;

        let tree = parser
            .parse(&source[..], None)
            .ok_or_else(|| parse_error(path, 0, 0, "parser produced no tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let node = first_error_node(root).unwrap_or(root);
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                let text = String::from_utf8_lossy(&source[node.start_byte()..node.end_byte()]);
                let snippet: String = text.chars().take(24).collect();
                format!("unexpected `{}`", snippet.trim())
            };
            return Err(parse_error(path, pos.row + 1, pos.column + 1, message));
        }

        Ok(SyntaxTree {
            tree,
            source,
            language: grammar.name(),
        })
    }

    pub fn get_grammar(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        self.registry.get_for_file(path)
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new(crate::REGISTRY.clone())
    }
}

impl SourceParser for TreeSitterParser {
    fn is_parseable(&self, path: &Path) -> bool {
        self.get_grammar(path).is_some()
    }

    fn parse(&self, path: &Path, source: Arc<[u8]>) -> Result<SyntaxTree> {
        let grammar = self.get_grammar(path).ok_or_else(|| {
            parse_error(path, 0, 0, "no grammar for this file extension".to_string())
        })?;
        self.parse_source(path, source, grammar)
    }
}

fn parse_error(path: &Path, line: usize, column: usize, message: String) -> DepError {
    DepError::Parse {
        path: path.to_path_buf(),
        line,
        column,
        message,
    }
}

/// Leftmost ERROR or MISSING node, found by descending along flagged children.
fn first_error_node(root: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let next = node
            .children(&mut cursor)
            .find(|child| child.has_error() || child.is_missing())?;
        node = next;
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    source: Arc<[u8]>,
    language: &'static str,
}

impl SyntaxTree {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }

    pub fn language(&self) -> &'static str {
        self.language
    }
}
