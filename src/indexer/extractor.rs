use std::path::{Path, PathBuf};

use tree_sitter::Node;

use crate::error::Result;
use crate::indexer::import_resolver::ImportResolver;
use crate::indexer::parser::SyntaxTree;

/// Raw import specifiers found in one file, each list in source order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSpecifiers {
    /// `import ... from`, `import "x"`, `export ... from`, `import x = require()`
    pub static_imports: Vec<String>,
    /// `import("x")` calls with a literal argument
    pub dynamic_imports: Vec<String>,
}

impl ImportSpecifiers {
    pub fn len(&self) -> usize {
        self.static_imports.len() + self.dynamic_imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct DependencyExtractor;

impl Default for DependencyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Resolves every import of the file: static ones first, then dynamic
    /// ones. Duplicates are kept and the first unresolvable specifier
    /// fails the whole file.
    pub fn extract(
        &self,
        tree: &SyntaxTree,
        file_path: &Path,
        resolver: &dyn ImportResolver,
    ) -> Result<Vec<PathBuf>> {
        let file_dir = match file_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let imports = self.collect_imports(tree);

        imports
            .static_imports
            .iter()
            .chain(imports.dynamic_imports.iter())
            .map(|specifier| resolver.resolve(specifier, file_dir))
            .collect()
    }

    /// Source-order walk over the whole tree. Iterative: nesting depth does
    /// not grow the call stack.
    pub fn collect_imports(&self, tree: &SyntaxTree) -> ImportSpecifiers {
        let mut imports = ImportSpecifiers::default();
        let mut cursor = tree.root_node().walk();

        loop {
            self.visit(tree, &cursor.node(), &mut imports);

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return imports;
                }
            }
        }
    }

    fn visit(&self, tree: &SyntaxTree, node: &Node, imports: &mut ImportSpecifiers) {
        match node.kind() {
            "import_statement" => {
                let source = node
                    .child_by_field_name("source")
                    .or_else(|| self.require_clause_source(node));
                if let Some(specifier) = source.and_then(|s| self.string_value(tree, &s)) {
                    imports.static_imports.push(specifier);
                }
            }
            "export_statement" => {
                if let Some(specifier) = node
                    .child_by_field_name("source")
                    .and_then(|s| self.string_value(tree, &s))
                {
                    imports.static_imports.push(specifier);
                }
            }
            "call_expression" => {
                if let Some(specifier) = self.dynamic_import_specifier(tree, node) {
                    imports.dynamic_imports.push(specifier);
                }
            }
            _ => {}
        }
    }

    /// `import fs = require("fs")`
    fn require_clause_source<'t>(&self, node: &Node<'t>) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let clause = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "import_require_clause")?;
        clause.child_by_field_name("source")
    }

    fn dynamic_import_specifier(&self, tree: &SyntaxTree, node: &Node) -> Option<String> {
        let function = node.child_by_field_name("function")?;
        if function.kind() != "import" {
            return None;
        }
        let arguments = node.child_by_field_name("arguments")?;
        let mut cursor = arguments.walk();
        let first = arguments.named_children(&mut cursor).next()?;
        self.string_value(tree, &first)
    }

    /// Value of a string literal or substitution-free template string,
    /// with escape sequences decoded.
    fn string_value(&self, tree: &SyntaxTree, node: &Node) -> Option<String> {
        match node.kind() {
            "string" => {}
            "template_string" => {
                let mut cursor = node.walk();
                let has_substitution = node
                    .named_children(&mut cursor)
                    .any(|child| child.kind() == "template_substitution");
                if has_substitution {
                    return None;
                }
            }
            _ => return None,
        }

        let text = tree.node_text(node);
        let inner = text
            .strip_prefix(['"', '\'', '`'])
            .and_then(|t| t.strip_suffix(['"', '\'', '`']))
            .unwrap_or(text);
        Some(unescape(inner))
    }
}

/// Decodes JavaScript string escapes. Malformed escapes are kept as written.
fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // line continuation
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            'x' => {
                let hex: String = chars.clone().take(2).collect();
                match decode_hex(&hex, 2) {
                    Some(ch) => {
                        chars.nth(1);
                        out.push(ch);
                    }
                    None => out.push_str("\\x"),
                }
            }
            'u' => {
                let rest: String = chars.clone().collect();
                match decode_unicode(&rest) {
                    Some((ch, consumed)) => {
                        chars.nth(consumed - 1);
                        out.push(ch);
                    }
                    None => out.push_str("\\u"),
                }
            }
            other => out.push(other),
        }
    }

    out
}

fn decode_hex(digits: &str, len: usize) -> Option<char> {
    if digits.len() != len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
}

/// `XXXX` or `{X..}` after `\u`; returns the char and how many chars it used.
fn decode_unicode(rest: &str) -> Option<(char, usize)> {
    if let Some(braced) = rest.strip_prefix('{') {
        let close = braced.find('}')?;
        let digits = &braced[..close];
        let valid = !digits.is_empty()
            && digits.len() <= 6
            && digits.chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return None;
        }
        let ch = u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)?;
        return Some((ch, close + 2));
    }
    let digits: String = rest.chars().take(4).collect();
    decode_hex(&digits, 4).map(|ch| (ch, 4))
}
