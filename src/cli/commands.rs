use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use dep_indexer::cache::JsonFileCacheManager;
use dep_indexer::error::{DepError, Result};
use dep_indexer::indexer::{FileWalker, ResolveOptions};
use dep_indexer::pipeline::{DependencyPipeline, FileMap};
use dep_indexer::REGISTRY;

#[derive(Parser)]
#[command(name = "dep-indexer")]
#[command(about = "Incremental module dependency extraction for JavaScript and TypeScript")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Scan the current directory
    dep-indexer scan

    # Scan two entry files with a custom cache location
    dep-indexer --cache build/deps.json scan src/index.ts src/worker.ts

    # Include every file (unparseable ones are passed through)
    dep-indexer scan ./src --all

    # Resolve with aliases from a JSON file, print JSON
    dep-indexer scan ./src --resolve-config resolve.json --format json

    # Drop the cache
    dep-indexer clear
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the cache file
    #[arg(long, default_value = ".dep-cache.json")]
    pub cache: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract dependencies of files and directories
    Scan {
        /// Files or directories to scan
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Include files the parser does not handle
        #[arg(long)]
        all: bool,

        /// JSON file with resolver options (extensions, alias, ...)
        #[arg(long)]
        resolve_config: Option<PathBuf>,

        /// Maximum number of files processed at once
        #[arg(long, default_value = "10")]
        concurrency: usize,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Delete the cache file
    Clear,
}

pub async fn scan(
    cache_path: &Path,
    paths: &[PathBuf],
    all: bool,
    resolve_config: Option<&Path>,
    concurrency: usize,
    format: &str,
) -> Result<()> {
    let options = match resolve_config {
        Some(path) => ResolveOptions::from_file(path)?,
        None => ResolveOptions::default(),
    };

    let files = collect_files(paths, all)?;
    if format != "json" {
        if files.is_empty() {
            println!(
                "No files to scan (parsed extensions: {})",
                supported_extensions().join(", ")
            );
        } else {
            println!("Found {} files to scan", files.len());
        }
    }

    let pipeline = DependencyPipeline::new().with_concurrency(concurrency);
    let cache = JsonFileCacheManager::new(cache_path);
    let records = pipeline.process(&files, &cache, &options).await?;

    if format == "json" {
        print_json(&files, &records)?;
    } else {
        print_text(&files, &records);

        let stats = pipeline.progress().snapshot();
        println!();
        println!("Scan Statistics:");
        println!("  Files: {}", stats.files_processed);
        println!("  Cache hits: {}", stats.cache_hits);
        println!("  Parsed: {}", stats.parsed);
        println!("  Not parsed: {}", stats.passthrough);
        println!("  Elapsed: {}ms", stats.elapsed_ms);
    }

    Ok(())
}

pub fn clear_cache(cache_path: &Path) -> Result<()> {
    let cache = JsonFileCacheManager::new(cache_path);
    if cache.clear()? {
        println!("Cache cleared");
    } else {
        println!("No cache at {}", cache_path.display());
    }
    Ok(())
}

fn supported_extensions() -> Vec<&'static str> {
    let mut extensions = REGISTRY.supported_extensions();
    extensions.sort_unstable();
    extensions
}

/// Directories are walked; anything else is taken as a file path.
fn collect_files(paths: &[PathBuf], all: bool) -> Result<Vec<PathBuf>> {
    let walker = FileWalker::new(REGISTRY.clone()).with_all_files(all);
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            files.extend(walker.walk(path)?);
        } else {
            files.push(path.clone());
        }
    }

    Ok(files)
}

fn print_text(files: &[PathBuf], records: &FileMap) {
    for file in files {
        let Some(record) = records.get(file) else {
            continue;
        };

        match &record.dependencies {
            Some(deps) if deps.is_empty() => println!("{} (no imports)", file.display()),
            Some(deps) => {
                println!("{}", file.display());
                for dep in deps {
                    println!("  -> {}", dep.display());
                }
            }
            None => println!("{} (not parsed)", file.display()),
        }
    }
}

fn print_json(files: &[PathBuf], records: &FileMap) -> Result<()> {
    let mut output = serde_json::Map::new();
    for file in files {
        if let Some(record) = records.get(file) {
            let deps = serde_json::to_value(&record.dependencies).map_err(encode_error)?;
            output.insert(file.to_string_lossy().into_owned(), deps);
        }
    }

    let json = serde_json::to_string_pretty(&output).map_err(encode_error)?;
    println!("{}", json);
    Ok(())
}

fn encode_error(e: serde_json::Error) -> DepError {
    DepError::Config(format!("failed to encode output: {}", e))
}
