//! Error types for rule-set assembly and compilation.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Errors that can occur while loading lists and writing rule documents.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error, tagged with the path involved.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A source path has no usable file name to derive an artifact name from.
    #[error("cannot derive artifact name from {0}")]
    InvalidName(PathBuf),

    /// Two sources in one pass map to the same artifact name.
    #[error("artifact name '{name}' from {} is already taken by {}", .path.display(), .first.display())]
    DuplicateName {
        name: String,
        path: PathBuf,
        first: PathBuf,
    },

    /// The pipeline configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] rulegen_core::ConfigError),
}

impl RuleError {
    /// Build a closure that wraps an `io::Error` with the given path.
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> RuleError + '_ {
        move |source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors reported by an [`ArtifactCompiler`](crate::compiler::ArtifactCompiler).
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The compiler process could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler ran but exited unsuccessfully.
    #[error("compiler {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    /// Failure reported by a non-process compiler implementation.
    #[error("{0}")]
    Other(String),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
