use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Cannot resolve '{specifier}' from {}", base_dir.display())]
    Resolve { specifier: String, base_dir: PathBuf },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl DepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DepError>;
