//! Import specifier resolution
//!
//! Maps the specifier of an `import`/`export ... from`/`import()` to the
//! absolute path of the file it loads, following Node's module lookup:
//! - `./sibling`, `../parent/mod` relative to the importing file's directory
//! - `/abs/path/mod` as-is
//! - `@app/components/Button` through configured aliases
//! - `react`, `@scope/pkg/sub` through `node_modules` directories

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DepError, Result};

/// Trait for resolving import specifiers to files
pub trait ImportResolver: Send + Sync {
    /// Resolves `specifier` as written in a file located in `base_dir`
    fn resolve(&self, specifier: &str, base_dir: &Path) -> Result<PathBuf>;
}

/// Resolver configuration, loaded once per batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveOptions {
    /// Extensions tried, in order, when the specifier has no exact match
    pub extensions: Vec<String>,

    /// File names tried inside a directory
    pub main_files: Vec<String>,

    /// `package.json` fields naming a package entry point
    pub main_fields: Vec<String>,

    /// Directory names searched for bare specifiers
    pub modules: Vec<String>,

    /// Specifier prefix -> replacement path
    pub alias: BTreeMap<String, PathBuf>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            extensions: [".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs", ".json"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            main_files: vec!["index".to_string()],
            main_fields: vec!["module".to_string(), "main".to_string()],
            modules: vec!["node_modules".to_string()],
            alias: BTreeMap::new(),
        }
    }
}

impl ResolveOptions {
    /// Loads options from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DepError::io(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| DepError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Builds the resolver shared by every file of a batch.
pub fn get_resolve_import(options: &ResolveOptions) -> Arc<dyn ImportResolver> {
    Arc::new(NodeResolver::new(options.clone()))
}

/// Node-style resolver.
///
/// Holds no mutable state, so one instance serves all concurrent callers.
/// Symlinks are not followed; results are only lexically normalized.
pub struct NodeResolver {
    options: ResolveOptions,
}

impl NodeResolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    /// Rewrites the specifier through the first matching alias. Keys are
    /// visited in reverse order so `@app/ui` is tried before `@app`.
    fn apply_alias(&self, specifier: &str) -> Option<PathBuf> {
        self.options
            .alias
            .iter()
            .rev()
            .find_map(|(key, target)| {
                if specifier == key {
                    Some(target.clone())
                } else {
                    specifier
                        .strip_prefix(key.as_str())
                        .and_then(|rest| rest.strip_prefix('/'))
                        .map(|rest| target.join(rest))
                }
            })
    }

    fn resolve_path(&self, candidate: &Path) -> Option<PathBuf> {
        self.resolve_as_file(candidate)
            .or_else(|| self.resolve_as_directory(candidate))
    }

    fn resolve_as_file(&self, candidate: &Path) -> Option<PathBuf> {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }
        self.options.extensions.iter().find_map(|ext| {
            let mut raw = candidate.as_os_str().to_os_string();
            raw.push(ext);
            let with_ext = PathBuf::from(raw);
            with_ext.is_file().then_some(with_ext)
        })
    }

    fn resolve_as_directory(&self, candidate: &Path) -> Option<PathBuf> {
        if !candidate.is_dir() {
            return None;
        }

        if let Some(entry) = self.read_package_entry(candidate) {
            let entry_path = normalize(&candidate.join(entry));
            if let Some(found) = self.resolve_as_file(&entry_path) {
                return Some(found);
            }
            if let Some(found) = self.resolve_main_file(&entry_path) {
                return Some(found);
            }
        }

        self.resolve_main_file(candidate)
    }

    fn resolve_main_file(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        self.options
            .main_files
            .iter()
            .find_map(|name| self.resolve_as_file(&dir.join(name)))
    }

    fn read_package_entry(&self, dir: &Path) -> Option<String> {
        let manifest = dir.join("package.json");
        let content = std::fs::read_to_string(&manifest).ok()?;
        let json: serde_json::Value = match serde_json::from_str(&content) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {}", manifest.display(), e);
                return None;
            }
        };
        self.options
            .main_fields
            .iter()
            .find_map(|field| json.get(field).and_then(|v| v.as_str()))
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.to_string())
    }

    fn resolve_module(&self, specifier: &str, base_dir: &Path) -> Option<PathBuf> {
        for dir in base_dir.ancestors() {
            for modules in &self.options.modules {
                let candidate = dir.join(modules).join(specifier);
                if let Some(found) = self.resolve_path(&candidate) {
                    return Some(found);
                }
            }
        }
        None
    }
}

impl ImportResolver for NodeResolver {
    fn resolve(&self, specifier: &str, base_dir: &Path) -> Result<PathBuf> {
        let unresolved = || DepError::Resolve {
            specifier: specifier.to_string(),
            base_dir: base_dir.to_path_buf(),
        };

        if specifier.is_empty() {
            return Err(unresolved());
        }

        let base_dir = absolutize(base_dir).map_err(|e| DepError::io(base_dir, e))?;

        let found = if let Some(aliased) = self.apply_alias(specifier) {
            let aliased = absolutize(&aliased).map_err(|e| DepError::io(&aliased, e))?;
            self.resolve_path(&normalize(&aliased))
        } else if is_path_like(specifier) {
            self.resolve_path(&normalize(&base_dir.join(specifier)))
        } else {
            self.resolve_module(specifier, &base_dir)
        };

        found.map(|p| normalize(&p)).ok_or_else(unresolved)
    }
}

fn is_path_like(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute()
}

/// An empty path is the current directory.
fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else if path.as_os_str().is_empty() {
        std::env::current_dir()
    } else {
        std::path::absolute(path)
    }
}

/// Removes `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn resolver() -> NodeResolver {
        NodeResolver::new(ResolveOptions::default())
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_is_path_like() {
        assert!(is_path_like("./utils"));
        assert!(is_path_like("../lib/x"));
        assert!(is_path_like(".."));
        assert!(is_path_like("/abs/file"));
        assert!(!is_path_like("react"));
        assert!(!is_path_like("@scope/pkg"));
    }

    #[test]
    fn test_resolve_relative_with_extension_probe() {
        let dir = TempDir::new().unwrap();
        let target = create_file(dir.path(), "src/utils.ts", "export {}");

        let resolved = resolver()
            .resolve("./utils", &dir.path().join("src"))
            .unwrap();
        assert_eq!(resolved, target);
    }

    #[test]
    fn test_resolve_exact_file_wins() {
        let dir = TempDir::new().unwrap();
        let exact = create_file(dir.path(), "data.json", "{}");
        create_file(dir.path(), "data.json.ts", "");

        let resolved = resolver().resolve("./data.json", dir.path()).unwrap();
        assert_eq!(resolved, exact);
    }

    #[test]
    fn test_resolve_extension_order() {
        let dir = TempDir::new().unwrap();
        let ts = create_file(dir.path(), "mod.ts", "");
        create_file(dir.path(), "mod.js", "");

        let resolved = resolver().resolve("./mod", dir.path()).unwrap();
        assert_eq!(resolved, ts);
    }

    #[test]
    fn test_resolve_parent_directory() {
        let dir = TempDir::new().unwrap();
        let target = create_file(dir.path(), "shared/config.js", "");
        fs::create_dir_all(dir.path().join("app")).unwrap();

        let resolved = resolver()
            .resolve("../shared/config", &dir.path().join("app"))
            .unwrap();
        assert_eq!(resolved, target);
    }

    #[test]
    fn test_resolve_directory_index() {
        let dir = TempDir::new().unwrap();
        let index = create_file(dir.path(), "components/index.tsx", "");

        let resolved = resolver().resolve("./components", dir.path()).unwrap();
        assert_eq!(resolved, index);
    }

    #[test]
    fn test_resolve_node_modules_package_main() {
        let dir = TempDir::new().unwrap();
        create_file(
            dir.path(),
            "node_modules/left-pad/package.json",
            r#"{ "name": "left-pad", "main": "lib/pad.js" }"#,
        );
        let main = create_file(dir.path(), "node_modules/left-pad/lib/pad.js", "");
        fs::create_dir_all(dir.path().join("src/deep")).unwrap();

        let resolved = resolver()
            .resolve("left-pad", &dir.path().join("src/deep"))
            .unwrap();
        assert_eq!(resolved, main);
    }

    #[test]
    fn test_resolve_module_field_preferred() {
        let dir = TempDir::new().unwrap();
        create_file(
            dir.path(),
            "node_modules/pkg/package.json",
            r#"{ "main": "cjs.js", "module": "esm.js" }"#,
        );
        create_file(dir.path(), "node_modules/pkg/cjs.js", "");
        let esm = create_file(dir.path(), "node_modules/pkg/esm.js", "");

        let resolved = resolver().resolve("pkg", dir.path()).unwrap();
        assert_eq!(resolved, esm);
    }

    #[test]
    fn test_resolve_scoped_package_subpath() {
        let dir = TempDir::new().unwrap();
        let sub = create_file(dir.path(), "node_modules/@scope/pkg/sub/thing.js", "");

        let resolved = resolver().resolve("@scope/pkg/sub/thing", dir.path()).unwrap();
        assert_eq!(resolved, sub);
    }

    #[test]
    fn test_resolve_alias() {
        let dir = TempDir::new().unwrap();
        let button = create_file(dir.path(), "src/components/Button.tsx", "");

        let mut options = ResolveOptions::default();
        options
            .alias
            .insert("@components".to_string(), dir.path().join("src/components"));
        let resolver = NodeResolver::new(options);

        let resolved = resolver
            .resolve("@components/Button", &dir.path().join("elsewhere"))
            .unwrap();
        assert_eq!(resolved, button);
    }

    #[test]
    fn test_alias_requires_segment_boundary() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "lib/index.js", "");

        let mut options = ResolveOptions::default();
        options.alias.insert("lib".to_string(), dir.path().join("lib"));
        let resolver = NodeResolver::new(options);

        assert!(resolver.apply_alias("lib").is_some());
        assert!(resolver.apply_alias("lib/x").is_some());
        assert!(resolver.apply_alias("library").is_none());
    }

    #[test]
    fn test_resolve_missing_fails() {
        let dir = TempDir::new().unwrap();
        let err = resolver().resolve("./nope", dir.path()).unwrap_err();
        match err {
            DepError::Resolve { specifier, base_dir } => {
                assert_eq!(specifier, "./nope");
                assert_eq!(base_dir, dir.path());
            }
            other => panic!("expected resolve error, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_empty_specifier_fails() {
        let dir = TempDir::new().unwrap();
        assert!(resolver().resolve("", dir.path()).is_err());
    }

    #[test]
    fn test_options_from_json_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = create_file(
            dir.path(),
            "resolve.json",
            r#"{ "extensions": [".js"], "alias": { "@": "/srv/app/src" } }"#,
        );

        let options = ResolveOptions::from_file(&path).unwrap();
        assert_eq!(options.extensions, vec![".js".to_string()]);
        assert_eq!(options.main_files, vec!["index".to_string()]);
        assert_eq!(options.alias.get("@"), Some(&PathBuf::from("/srv/app/src")));
    }

    #[test]
    fn test_options_from_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = create_file(dir.path(), "resolve.json", "{ not json");
        let err = ResolveOptions::from_file(&path).unwrap_err();
        assert!(matches!(err, DepError::Config(_)));
    }

    #[test]
    fn test_resolver_is_shareable() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ImportResolver>();
        assert_send_sync::<NodeResolver>();
    }

    #[test]
    fn test_absolutize_empty_path_is_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new("")).unwrap(), cwd);
        assert_eq!(absolutize(Path::new("src")).unwrap(), cwd.join("src"));
    }
}
