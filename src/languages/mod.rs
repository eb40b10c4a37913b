pub mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;
}

#[derive(Clone)]
pub struct LanguageRegistry {
    languages: HashMap<String, Arc<dyn LanguageGrammar>>,
    extension_map: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            languages: HashMap::new(),
            extension_map: HashMap::new(),
        };

        registry.register(Arc::new(typescript::TypeScriptGrammar));
        registry.register(Arc::new(typescript::TsxGrammar));

        registry
    }

    pub fn register(&mut self, grammar: Arc<dyn LanguageGrammar>) {
        let name = grammar.name().to_string();
        for ext in grammar.file_extensions() {
            self.extension_map.insert(ext.to_string(), name.clone());
        }
        self.languages.insert(name, grammar);
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.extension_map
            .get(ext)
            .and_then(|name| self.languages.get(name))
            .cloned()
    }

    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get_by_extension(ext))
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        self.extension_map.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_new() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.get_by_extension("ts").unwrap().name(), "typescript");
        assert_eq!(registry.get_by_extension("tsx").unwrap().name(), "tsx");
    }

    #[test]
    fn test_get_by_extension_typescript() {
        let registry = LanguageRegistry::new();

        for ext in ["ts", "mts", "cts"] {
            assert_eq!(registry.get_by_extension(ext).unwrap().name(), "typescript");
        }
        for ext in ["tsx", "js", "jsx", "mjs", "cjs"] {
            assert_eq!(registry.get_by_extension(ext).unwrap().name(), "tsx");
        }
    }

    #[test]
    fn test_get_by_extension_unknown() {
        let registry = LanguageRegistry::new();
        assert!(registry.get_by_extension("json").is_none());
        assert!(registry.get_by_extension("css").is_none());
        assert!(registry.get_by_extension("").is_none());
    }

    #[test]
    fn test_get_for_file() {
        let registry = LanguageRegistry::new();
        let grammar = registry.get_for_file(Path::new("src/app/main.ts")).unwrap();
        assert_eq!(grammar.name(), "typescript");

        let grammar = registry.get_for_file(Path::new("Component.jsx")).unwrap();
        assert_eq!(grammar.name(), "tsx");
    }

    #[test]
    fn test_get_for_file_no_extension() {
        let registry = LanguageRegistry::new();
        assert!(registry.get_for_file(Path::new("Makefile")).is_none());
        assert!(registry.get_for_file(Path::new("styles.css")).is_none());
    }

    #[test]
    fn test_supported_extensions() {
        let registry = LanguageRegistry::new();
        let mut exts = registry.supported_extensions();
        exts.sort_unstable();
        assert_eq!(exts, vec!["cjs", "cts", "js", "jsx", "mjs", "mts", "ts", "tsx"]);
    }

    #[test]
    fn test_registry_clone_shares_grammars() {
        let registry = LanguageRegistry::new();
        let cloned = registry.clone();
        let a = registry.get_by_extension("tsx").unwrap();
        let b = cloned.get_by_extension("tsx").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
