use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{DepError, Result};
use crate::languages::LanguageRegistry;

/// Directory names never descended into, gitignored or not.
const SKIPPED_DIRS: &[&str] = &["node_modules"];

pub struct FileWalker {
    registry: LanguageRegistry,
    include_all: bool,
}

impl FileWalker {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            registry,
            include_all: false,
        }
    }

    /// Also yield files the parser does not understand (they pass through
    /// the pipeline with no dependencies).
    pub fn with_all_files(mut self, include_all: bool) -> Self {
        self.include_all = include_all;
        self
    }

    /// Lists files under `root`, sorted, honoring ignore files.
    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(DepError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            ));
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| !SKIPPED_DIRS.contains(&name))
                    .unwrap_or(true)
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && (self.include_all || self.is_supported(path)) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.registry.get_for_file(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_walker() -> FileWalker {
        FileWalker::new(LanguageRegistry::new())
    }

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_walk_finds_script_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "app.ts", "const x = 1;");
        create_file(temp_dir.path(), "component.tsx", "export default () => null;");
        create_file(temp_dir.path(), "utils.js", "function test() {}");
        create_file(temp_dir.path(), "comp.jsx", "export const C = () => null;");

        let files = create_walker().walk(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_walk_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "src/b.ts", "");
        create_file(temp_dir.path(), "src/a.ts", "");
        create_file(temp_dir.path(), "src/deep/c.ts", "");

        let files = create_walker().walk(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("src/a.ts"),
                PathBuf::from("src/b.ts"),
                PathBuf::from("src/deep/c.ts"),
            ]
        );
    }

    #[test]
    fn test_walk_ignores_unsupported_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "main.ts", "");
        create_file(temp_dir.path(), "README.md", "# Readme");
        create_file(temp_dir.path(), "data.json", "{}");

        let files = create_walker().walk(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_walk_all_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "main.ts", "");
        create_file(temp_dir.path(), "styles.css", "body {}");

        let files = create_walker()
            .with_all_files(true)
            .walk(temp_dir.path())
            .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_walk_skips_node_modules() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "index.js", "");
        create_file(temp_dir.path(), "node_modules/react/index.js", "");

        let files = create_walker().walk(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("index.js"));
    }

    #[test]
    fn test_walk_hidden_files_ignored() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "visible.ts", "");
        create_file(temp_dir.path(), ".hidden.ts", "");

        let files = create_walker().walk(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "visible.ts");
    }

    #[test]
    fn test_walk_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let err = create_walker()
            .walk(&temp_dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, DepError::Io { .. }));
    }

    #[test]
    fn test_is_supported() {
        let walker = create_walker();
        assert!(walker.is_supported(Path::new("app.ts")));
        assert!(walker.is_supported(Path::new("component.tsx")));
        assert!(walker.is_supported(Path::new("lib/esm.mjs")));
        assert!(!walker.is_supported(Path::new("file.txt")));
        assert!(!walker.is_supported(Path::new("Makefile")));
    }
}
